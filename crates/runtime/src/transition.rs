use foundation::math::Vec2;
use foundation::time::{Time, TimeSpan};

/// Pan/zoom transform applied to the render layer: `screen = k * p + (x, y)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn invert(&self, screen: Vec2) -> Vec2 {
        Vec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    /// Value of the SVG `transform` attribute.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

/// Cubic in-out easing on `[0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Interpolates between two transforms as seen through a fixed viewport.
///
/// The scale moves geometrically and the map point under the viewport
/// center moves linearly, so zooming in feels uniform at every step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformTween {
    from: ZoomTransform,
    to: ZoomTransform,
    from_center: Vec2,
    to_center: Vec2,
    viewport_center: Vec2,
}

impl TransformTween {
    pub fn new(from: ZoomTransform, to: ZoomTransform, viewport: [f64; 2]) -> Self {
        let viewport_center = Vec2::new(viewport[0] / 2.0, viewport[1] / 2.0);
        Self {
            from,
            to,
            from_center: from.invert(viewport_center),
            to_center: to.invert(viewport_center),
            viewport_center,
        }
    }

    /// Transform at eased progress `e`; `e >= 1` yields the target exactly.
    pub fn at(&self, e: f64) -> ZoomTransform {
        if e >= 1.0 {
            return self.to;
        }
        if e <= 0.0 {
            return self.from;
        }
        let k = self.from.k * (self.to.k / self.from.k).powf(e);
        let center = self.from_center.lerp(self.to_center, e);
        ZoomTransform::new(
            self.viewport_center.x - k * center.x,
            self.viewport_center.y - k * center.y,
            k,
        )
    }
}

/// A timed transform animation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transition {
    pub tween: TransformTween,
    pub span: TimeSpan,
}

impl Transition {
    pub fn new(tween: TransformTween, start: Time, duration_s: f64) -> Self {
        Self {
            tween,
            span: TimeSpan::starting_at(start, duration_s),
        }
    }

    /// Returns the transform at `now` and whether the animation is finished.
    pub fn sample(&self, now: Time) -> (ZoomTransform, bool) {
        let p = self.span.progress(now);
        (self.tween.at(ease_cubic_in_out(p)), p >= 1.0)
    }
}
