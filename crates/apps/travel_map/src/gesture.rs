use foundation::math::Vec2;

/// Pixels a press may travel before it counts as a drag instead of a click.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Tracks one mouse press on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTracker {
    origin: Vec2,
    last: Vec2,
    moved: bool,
}

impl DragTracker {
    pub fn start(at: Vec2) -> Self {
        Self {
            origin: at,
            last: at,
            moved: false,
        }
    }

    /// Returns the delta since the previous position once the press has
    /// become a drag.
    pub fn move_to(&mut self, at: Vec2) -> Option<Vec2> {
        let delta = at - self.last;
        self.last = at;
        if !self.moved {
            let total = at - self.origin;
            if total.x.hypot(total.y) < DRAG_THRESHOLD_PX {
                return None;
            }
            self.moved = true;
            return Some(total);
        }
        Some(delta)
    }

    /// A drag swallows the click that ends it.
    pub fn suppresses_click(&self) -> bool {
        self.moved
    }
}

/// Converts a wheel `deltaY` to pixel units (`deltaMode` 1 is lines, 2 is pages).
pub fn wheel_delta_px(delta_y: f64, delta_mode: u32) -> f64 {
    match delta_mode {
        1 => delta_y * 25.0,
        2 => delta_y * 500.0,
        _ => delta_y,
    }
}

#[cfg(test)]
mod tests {
    use super::{DragTracker, wheel_delta_px};
    use foundation::math::Vec2;

    #[test]
    fn small_moves_stay_a_click() {
        let mut drag = DragTracker::start(Vec2::new(10.0, 10.0));
        assert_eq!(drag.move_to(Vec2::new(11.0, 11.0)), None);
        assert!(!drag.suppresses_click());
    }

    #[test]
    fn drag_reports_accumulated_then_incremental_deltas() {
        let mut drag = DragTracker::start(Vec2::new(0.0, 0.0));
        assert_eq!(drag.move_to(Vec2::new(1.0, 0.0)), None);
        assert_eq!(drag.move_to(Vec2::new(4.0, 0.0)), Some(Vec2::new(4.0, 0.0)));
        assert_eq!(drag.move_to(Vec2::new(6.0, 1.0)), Some(Vec2::new(2.0, 1.0)));
        assert!(drag.suppresses_click());
    }

    #[test]
    fn wheel_modes_scale_to_pixels() {
        assert_eq!(wheel_delta_px(3.0, 0), 3.0);
        assert_eq!(wheel_delta_px(3.0, 1), 75.0);
        assert_eq!(wheel_delta_px(-1.0, 2), -500.0);
    }
}
