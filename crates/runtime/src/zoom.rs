//! Pan/zoom controller for the map's render layer.
//!
//! Owns the current [`ZoomTransform`], clamps it to a scale extent, and runs
//! at most one animated transition at a time. Animated requests hand out a
//! [`ZoomTicket`]; [`ZoomController::tick`] reports the ticket on the frame its
//! animation lands. Starting a new request replaces the running one and its
//! ticket is never reported.

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use foundation::time::Time;

use crate::transition::{TransformTween, Transition, ZoomTransform};

/// Receives every transform the controller produces.
pub trait TransformSink {
    fn set_transform(&mut self, transform: &ZoomTransform);
}

impl TransformSink for Vec<ZoomTransform> {
    fn set_transform(&mut self, transform: &ZoomTransform) {
        self.push(*transform);
    }
}

/// Completion handle for an animated zoom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ZoomTicket(u64);

impl ZoomTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Inclusive bounds on the zoom scale `k`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScaleExtent {
    pub min: f64,
    pub max: f64,
}

impl ScaleExtent {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, k: f64) -> f64 {
        if k.is_nan() {
            return self.min;
        }
        k.clamp(self.min, self.max)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomDurations {
    /// Button and keyboard zoom steps.
    pub step_s: f64,
    /// Fit-to-bounds and reset.
    pub fit_s: f64,
}

impl Default for ZoomDurations {
    fn default() -> Self {
        Self {
            step_s: 0.25,
            fit_s: 0.75,
        }
    }
}

/// Transform that fits `bbox` into the viewport, scaled by `margin`.
///
/// The bounding box center lands on the viewport center. A degenerate box
/// zooms to the extent's maximum.
pub fn fit_bounds(
    bbox: &Aabb2,
    viewport: [f64; 2],
    margin: f64,
    extent: ScaleExtent,
) -> ZoomTransform {
    let [vw, vh] = viewport;
    let ratio = (bbox.width() / vw).max(bbox.height() / vh);
    let k = extent.clamp(margin / ratio);
    let c = bbox.center();
    ZoomTransform::new(vw / 2.0 - k * c.x, vh / 2.0 - k * c.y, k)
}

#[derive(Debug)]
struct Active {
    ticket: ZoomTicket,
    transition: Transition,
}

#[derive(Debug)]
pub struct ZoomController {
    transform: ZoomTransform,
    extent: ScaleExtent,
    viewport: [f64; 2],
    durations: ZoomDurations,
    active: Option<Active>,
    next_ticket: u64,
}

impl ZoomController {
    pub fn new(viewport: [f64; 2], extent: ScaleExtent, durations: ZoomDurations) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            extent,
            viewport,
            durations,
            active: None,
            next_ticket: 0,
        }
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn extent(&self) -> ScaleExtent {
        self.extent
    }

    /// Later requests are clamped to `extent`; the current transform is kept.
    pub fn set_extent(&mut self, extent: ScaleExtent) {
        self.extent = extent;
    }

    pub fn viewport(&self) -> [f64; 2] {
        self.viewport
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Scales about the viewport center.
    pub fn zoom_by(&mut self, factor: f64, now: Time) -> ZoomTicket {
        let center = Vec2::new(self.viewport[0] / 2.0, self.viewport[1] / 2.0);
        let target = self.scaled_about(center, factor);
        self.animate_to(target, now, self.durations.step_s)
    }

    pub fn zoom_to_bounds(&mut self, bbox: &Aabb2, margin: f64, now: Time) -> ZoomTicket {
        let target = fit_bounds(bbox, self.viewport, margin, self.extent);
        self.animate_to(target, now, self.durations.fit_s)
    }

    pub fn reset(&mut self, now: Time) -> ZoomTicket {
        self.animate_to(ZoomTransform::IDENTITY, now, self.durations.fit_s)
    }

    /// Immediate pan in screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64, sink: &mut impl TransformSink) {
        self.interrupt();
        self.transform.x += dx;
        self.transform.y += dy;
        sink.set_transform(&self.transform);
    }

    /// Immediate zoom keeping the map point under `point` fixed on screen.
    pub fn zoom_at(&mut self, point: Vec2, factor: f64, sink: &mut impl TransformSink) {
        self.interrupt();
        self.transform = self.scaled_about(point, factor);
        sink.set_transform(&self.transform);
    }

    /// Drops the running animation, if any. Its ticket never completes.
    pub fn interrupt(&mut self) -> Option<ZoomTicket> {
        let active = self.active.take()?;
        tracing::debug!(ticket = active.ticket.0, "zoom animation interrupted");
        Some(active.ticket)
    }

    /// Advances the running animation to `now`.
    ///
    /// Writes the new transform to `sink` and returns the ticket when the
    /// animation reached its target on this frame.
    pub fn tick(&mut self, now: Time, sink: &mut impl TransformSink) -> Option<ZoomTicket> {
        let active = self.active.as_ref()?;
        let (transform, done) = active.transition.sample(now);
        self.transform = transform;
        sink.set_transform(&self.transform);
        if done {
            self.active.take().map(|a| a.ticket)
        } else {
            None
        }
    }

    fn scaled_about(&self, screen: Vec2, factor: f64) -> ZoomTransform {
        let p = self.transform.invert(screen);
        let k = self.extent.clamp(self.transform.k * factor);
        ZoomTransform::new(screen.x - p.x * k, screen.y - p.y * k, k)
    }

    fn animate_to(&mut self, target: ZoomTransform, now: Time, duration_s: f64) -> ZoomTicket {
        if let Some(replaced) = self.interrupt() {
            tracing::debug!(replaced = replaced.0, "zoom request replaced running animation");
        }
        let ticket = ZoomTicket(self.next_ticket);
        self.next_ticket += 1;
        let tween = TransformTween::new(self.transform, target, self.viewport);
        self.active = Some(Active {
            ticket,
            transition: Transition::new(tween, now, duration_s),
        });
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::{ScaleExtent, ZoomController, ZoomDurations, fit_bounds};
    use crate::transition::ZoomTransform;
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;
    use foundation::time::Time;

    const WORLD: ScaleExtent = ScaleExtent::new(1.0, 8.0);

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b} (eps={eps})");
    }

    fn controller() -> ZoomController {
        ZoomController::new([960.0, 500.0], WORLD, ZoomDurations::default())
    }

    /// Ticks at 60 Hz until the animation ends, returning completed tickets.
    fn run(zc: &mut ZoomController, start: Time, sink: &mut Vec<ZoomTransform>) -> Vec<u64> {
        let mut done = Vec::new();
        let mut n = 0u32;
        while zc.is_animating() {
            n += 1;
            if let Some(ticket) = zc.tick(Time(start.0 + f64::from(n) / 60.0), sink) {
                done.push(ticket.id());
            }
        }
        done
    }

    #[test]
    fn fit_bounds_centers_and_clamps() {
        let bbox = Aabb2::new([100.0, 50.0], [196.0, 100.0]);
        let t = fit_bounds(&bbox, [960.0, 500.0], 0.9, WORLD);
        // max(96/960, 50/500) = 0.1 -> k = 9 -> clamped to 8.
        assert_eq!(t.k, 8.0);
        let c = t.apply(bbox.center());
        assert_close(c.x, 480.0, 1e-9);
        assert_close(c.y, 250.0, 1e-9);

        let wide = Aabb2::new([0.0, 0.0], [960.0, 500.0]);
        let t = fit_bounds(&wide, [960.0, 500.0], 0.9, WORLD);
        assert_eq!(t.k, 1.0);

        let mid = Aabb2::new([0.0, 0.0], [480.0, 100.0]);
        let t = fit_bounds(&mid, [960.0, 500.0], 0.9, WORLD);
        assert_close(t.k, 1.8, 1e-12);
    }

    #[test]
    fn degenerate_bounds_zoom_to_max() {
        let point = Aabb2::from_point(Vec2::new(10.0, 10.0));
        let t = fit_bounds(&point, [960.0, 500.0], 0.9, ScaleExtent::new(1.0, 40.0));
        assert_eq!(t.k, 40.0);
        assert_eq!(t.apply(Vec2::new(10.0, 10.0)), Vec2::new(480.0, 250.0));
    }

    #[test]
    fn zoom_to_bounds_completes_once_on_target() {
        let mut zc = controller();
        let bbox = Aabb2::new([400.0, 200.0], [560.0, 300.0]);
        let ticket = zc.zoom_to_bounds(&bbox, 0.9, Time(0.0));
        let mut sink = Vec::new();
        let done = run(&mut zc, Time(0.0), &mut sink);
        assert_eq!(done, vec![ticket.id()]);
        let target = fit_bounds(&bbox, [960.0, 500.0], 0.9, WORLD);
        assert_eq!(zc.transform(), target);
        assert_eq!(sink.last(), Some(&target));
        // 750 ms at 60 Hz.
        assert_eq!(sink.len(), 45);
        assert_eq!(zc.tick(Time(5.0), &mut sink), None);
    }

    #[test]
    fn replaced_ticket_never_completes() {
        let mut zc = controller();
        let first = zc.zoom_to_bounds(&Aabb2::new([0.0, 0.0], [100.0, 100.0]), 0.9, Time(0.0));
        let mut sink = Vec::new();
        assert_eq!(zc.tick(Time(0.1), &mut sink), None);
        let second = zc.zoom_to_bounds(&Aabb2::new([500.0, 0.0], [600.0, 100.0]), 0.9, Time(0.1));
        assert_ne!(first, second);
        let done = run(&mut zc, Time(0.1), &mut sink);
        assert_eq!(done, vec![second.id()]);
    }

    #[test]
    fn zoom_by_scales_about_center_and_clamps() {
        let mut zc = controller();
        zc.zoom_by(2.0, Time(0.0));
        let mut sink = Vec::new();
        run(&mut zc, Time(0.0), &mut sink);
        // 250 ms at 60 Hz.
        assert_eq!(sink.len(), 15);
        assert_eq!(zc.transform().k, 2.0);
        assert_eq!(zc.transform().invert(Vec2::new(480.0, 250.0)), Vec2::new(480.0, 250.0));

        zc.zoom_by(0.1, Time(1.0));
        run(&mut zc, Time(1.0), &mut sink);
        assert_eq!(zc.transform().k, 1.0);
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut zc = controller();
        let mut sink = Vec::new();
        zc.zoom_at(Vec2::new(100.0, 100.0), 3.0, &mut sink);
        zc.pan_by(20.0, -10.0, &mut sink);
        assert_eq!(sink.len(), 2);
        let ticket = zc.reset(Time(2.0));
        let done = run(&mut zc, Time(2.0), &mut sink);
        assert_eq!(done, vec![ticket.id()]);
        assert_eq!(zc.transform(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn gestures_interrupt_animation() {
        let mut zc = controller();
        let mut sink = Vec::new();
        zc.zoom_by(4.0, Time(0.0));
        zc.pan_by(5.0, 5.0, &mut sink);
        assert!(!zc.is_animating());
        assert_eq!(zc.tick(Time(1.0), &mut sink), None);
        assert_eq!(zc.transform(), ZoomTransform::new(5.0, 5.0, 1.0));
    }

    #[test]
    fn zoom_at_keeps_point_fixed() {
        let mut zc = controller();
        zc.set_extent(ScaleExtent::new(1.0, 40.0));
        let mut sink = Vec::new();
        let p = Vec2::new(300.0, 120.0);
        let before = zc.transform().invert(p);
        zc.zoom_at(p, 1.5, &mut sink);
        zc.zoom_at(p, 1.5, &mut sink);
        let after = zc.transform().invert(p);
        assert_close(after.x, before.x, 1e-9);
        assert_close(after.y, before.y, 1e-9);
        assert_close(zc.transform().k, 2.25, 1e-12);
    }
}
