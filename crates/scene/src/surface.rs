//! Render model for the map's SVG surface.
//!
//! The browser shell mirrors this model into the DOM. Every rebuild bumps the
//! layer generation; feature keys carry the generation they were issued
//! under, so pointer events from a replaced layer resolve to nothing.

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use layers::{LabelAnchor, ProjectedFeature, Stroke};

/// `data-feature` attribute value: `{generation}:{index}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub generation: u64,
    pub index: usize,
}

impl FeatureKey {
    pub fn parse(s: &str) -> Option<Self> {
        let (generation, index) = s.split_once(':')?;
        Some(Self {
            generation: generation.parse().ok()?,
            index: index.parse().ok()?,
        })
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.generation, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    /// World-view shape; `code` is `None` when the id does not resolve.
    Country { id: Option<String>, code: Option<String> },
    /// Sub-national shape of `code`.
    Region { code: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFeature {
    pub key: FeatureKey,
    pub kind: FeatureKind,
    pub name: String,
    pub path: String,
    pub bounds: Option<Aabb2>,
    pub visited: bool,
    pub fill: String,
    pub hovered: bool,
}

/// Screen-space text (not affected by the zoom transform).
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenText {
    pub text: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    generation: u64,
    features: Vec<SurfaceFeature>,
    labels: Vec<LabelAnchor>,
    stroke: Option<Stroke>,
    status: Option<ScreenText>,
    tooltip: Option<ScreenText>,
    back_visible: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            generation: 0,
            features: Vec::new(),
            labels: Vec::new(),
            stroke: None,
            status: None,
            tooltip: None,
            back_visible: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Removes every feature, label, text and the tooltip; starts a new
    /// generation.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.features.clear();
        self.labels.clear();
        self.stroke = None;
        self.status = None;
        self.tooltip = None;
    }

    pub fn set_stroke(&mut self, stroke: Stroke) {
        self.stroke = Some(stroke);
    }

    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// Appends a feature under the current generation.
    pub fn push_feature(
        &mut self,
        kind: FeatureKind,
        name: String,
        projected: ProjectedFeature,
        visited: bool,
        fill: String,
    ) -> FeatureKey {
        let key = FeatureKey {
            generation: self.generation,
            index: self.features.len(),
        };
        self.features.push(SurfaceFeature {
            key,
            kind,
            name,
            path: projected.path,
            bounds: projected.bounds,
            visited,
            fill,
            hovered: false,
        });
        key
    }

    pub fn features(&self) -> &[SurfaceFeature] {
        &self.features
    }

    /// `None` for keys issued under an older generation.
    pub fn feature(&self, key: FeatureKey) -> Option<&SurfaceFeature> {
        if key.generation != self.generation {
            return None;
        }
        self.features.get(key.index)
    }

    pub fn feature_mut(&mut self, key: FeatureKey) -> Option<&mut SurfaceFeature> {
        if key.generation != self.generation {
            return None;
        }
        self.features.get_mut(key.index)
    }

    pub fn set_labels(&mut self, labels: Vec<LabelAnchor>) {
        self.labels = labels;
    }

    pub fn labels(&self) -> &[LabelAnchor] {
        &self.labels
    }

    pub fn set_status(&mut self, status: Option<ScreenText>) {
        self.status = status;
    }

    pub fn status(&self) -> Option<&ScreenText> {
        self.status.as_ref()
    }

    pub fn set_tooltip(&mut self, tooltip: Option<ScreenText>) {
        self.tooltip = tooltip;
    }

    pub fn tooltip(&self) -> Option<&ScreenText> {
        self.tooltip.as_ref()
    }

    pub fn set_back_visible(&mut self, visible: bool) {
        self.back_visible = visible;
    }

    pub fn back_visible(&self) -> bool {
        self.back_visible
    }
}
