//! Projects lon/lat features to screen-space SVG paths.

use foundation::bounds::Aabb2;
use foundation::math::{Mercator, Vec2, canonical_f64};
use formats::{Feature, GeoPoint, Geometry, Ring};

/// Pixels per radian at world view.
pub const DEFAULT_SCALE: f64 = 120.0;

/// Screen-space rendition of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFeature {
    /// SVG path data (`M..L..Z` per ring); empty for empty geometry.
    pub path: String,
    pub bounds: Option<Aabb2>,
    /// Area-weighted planar centroid; bounds center when the area is zero.
    pub centroid: Option<Vec2>,
    /// Projected planar area in square pixels (holes subtracted).
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoProjector {
    viewport: [f64; 2],
    mercator: Mercator,
}

impl GeoProjector {
    pub fn new(viewport: [f64; 2]) -> Self {
        Self {
            viewport,
            mercator: Self::defaults_for(viewport),
        }
    }

    /// World-view parameters: `scale 120`, origin at `(w/2, h/1.5)`.
    pub fn defaults_for(viewport: [f64; 2]) -> Mercator {
        Mercator::new(DEFAULT_SCALE, [viewport[0] / 2.0, viewport[1] / 1.5])
    }

    pub fn params(&self) -> Mercator {
        self.mercator
    }

    pub fn set_params(&mut self, mercator: Mercator) {
        self.mercator = mercator;
    }

    pub fn reset(&mut self) {
        self.mercator = Self::defaults_for(self.viewport);
    }

    pub fn is_default(&self) -> bool {
        self.mercator == Self::defaults_for(self.viewport)
    }

    pub fn viewport(&self) -> [f64; 2] {
        self.viewport
    }

    /// `None` for points that do not project to finite coordinates.
    pub fn project_point(&self, p: GeoPoint) -> Option<Vec2> {
        let v = self.mercator.project(p.lon_deg, p.lat_deg);
        v.is_finite().then_some(v)
    }

    fn project_ring(&self, ring: &Ring) -> Vec<Vec2> {
        ring.iter().filter_map(|&p| self.project_point(p)).collect()
    }

    pub fn project(&self, feature: &Feature) -> ProjectedFeature {
        self.project_geometry(&feature.geometry)
    }

    pub fn project_geometry(&self, geometry: &Geometry) -> ProjectedFeature {
        let mut path = String::new();
        let mut bounds: Option<Aabb2> = None;
        let mut area = 0.0;
        let mut moment = Vec2::ZERO;

        for polygon in geometry.polygons() {
            for (ring_index, ring) in polygon.iter().enumerate() {
                let pts = self.project_ring(ring);
                if pts.is_empty() {
                    continue;
                }
                append_ring(&mut path, &pts);
                for &p in &pts {
                    match bounds.as_mut() {
                        Some(b) => b.include(p),
                        None => bounds = Some(Aabb2::from_point(p)),
                    }
                }
                if let Some((ring_area, ring_centroid)) = ring_area_centroid(&pts) {
                    // Outer rings add, holes subtract.
                    let weight = if ring_index == 0 { ring_area } else { -ring_area };
                    area += weight;
                    moment = moment + ring_centroid.scale(weight);
                }
            }
        }

        let centroid = if area > f64::EPSILON && moment.is_finite() {
            Some(moment.scale(1.0 / area))
        } else {
            bounds.map(|b| b.center())
        };

        ProjectedFeature {
            path,
            bounds,
            centroid,
            area: area.max(0.0),
        }
    }
}

fn fmt_coord(v: f64) -> String {
    canonical_f64((v * 1000.0).round() / 1000.0).to_string()
}

fn append_ring(path: &mut String, pts: &[Vec2]) {
    for (i, p) in pts.iter().enumerate() {
        path.push(if i == 0 { 'M' } else { 'L' });
        path.push_str(&fmt_coord(p.x));
        path.push(',');
        path.push_str(&fmt_coord(p.y));
    }
    path.push('Z');
}

/// Unsigned shoelace area and centroid of a closed ring.
///
/// Rings with fewer than 3 points, or zero area, contribute nothing.
fn ring_area_centroid(pts: &[Vec2]) -> Option<(f64, Vec2)> {
    if pts.len() < 3 {
        return None;
    }
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if twice_area.abs() <= f64::EPSILON {
        return None;
    }
    let centroid = Vec2::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area));
    Some((twice_area.abs() / 2.0, centroid))
}
