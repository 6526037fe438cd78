//! Spherical Mercator projection from lon/lat degrees to screen pixels.

use std::f64::consts::FRAC_PI_4;

use super::Vec2;

/// Latitude limit of the square Web Mercator world.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Mercator projection parameters.
///
/// `scale` is pixels per radian of longitude; `translate` is where
/// (0°, 0°) lands on screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub translate: [f64; 2],
}

impl Mercator {
    pub fn new(scale: f64, translate: [f64; 2]) -> Self {
        Self { scale, translate }
    }

    /// Projects a lon/lat pair (degrees) to screen coordinates (y down).
    ///
    /// Latitudes beyond the Mercator limit are clamped so poles stay finite.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let lambda = lon_deg.to_radians();
        let phi = lat_deg
            .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
            .to_radians();
        let y = (FRAC_PI_4 + phi * 0.5).tan().ln();
        Vec2::new(
            self.translate[0] + self.scale * lambda,
            self.translate[1] - self.scale * y,
        )
    }
}
