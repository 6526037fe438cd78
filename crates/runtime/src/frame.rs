use foundation::time::Time;

/// Animation frame metadata.
///
/// Frames are stamped with the event loop's high-resolution clock (the
/// `requestAnimationFrame` timestamp in the browser). Tests build frames by
/// hand so every transition can be stepped deterministically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Clock reading at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    /// The next frame, `dt_s` seconds later.
    pub fn advance(self, dt_s: f64) -> Self {
        Self::new(self.index + 1, Time(self.time.0 + dt_s))
    }

    /// The next frame at an externally supplied timestamp (never earlier
    /// than this one).
    pub fn next_at(self, time: Time) -> Self {
        let time = if time.0 < self.time.0 { self.time } else { time };
        Self::new(self.index + 1, time)
    }
}
