use foundation::math::{Vec2, stable_total_cmp_f64};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_family: String,
    pub font_weight: String,
    pub min_font_px: f64,
    pub max_font_px: f64,
    /// Font size per unit of `sqrt(area)`.
    pub size_factor: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_family: "Lato".to_string(),
            font_weight: "bold".to_string(),
            min_font_px: 0.2,
            max_font_px: 3.0,
            size_factor: 0.08,
        }
    }
}

impl LabelStyle {
    /// Font size (pre-zoom pixels) for a region of projected `area`.
    pub fn font_size(&self, area: f64) -> f64 {
        if !area.is_finite() || area <= 0.0 {
            return self.min_font_px;
        }
        (area.sqrt() * self.size_factor).clamp(self.min_font_px, self.max_font_px)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsConfig {
    pub style: LabelStyle,
    pub max_labels: usize,
    pub max_text_len: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            style: LabelStyle::default(),
            max_labels: 10_000,
            max_text_len: 256,
        }
    }
}

/// A label candidate: one per rendered region.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSource<'a> {
    pub text: &'a str,
    pub centroid: Option<Vec2>,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub text: String,
    pub position: Vec2,
    pub font_px: f64,
}

/// Places labels at centroids, largest regions first.
///
/// Blank or overlong names and regions without a centroid get no label.
pub fn place_labels<'a>(
    config: &LabelsConfig,
    sources: impl IntoIterator<Item = LabelSource<'a>>,
) -> Vec<LabelAnchor> {
    let mut ranked: Vec<(f64, LabelAnchor)> = sources
        .into_iter()
        .filter_map(|src| {
            let text = src.text.trim();
            if text.is_empty() || text.len() > config.max_text_len {
                return None;
            }
            let position = src.centroid.filter(|c| c.is_finite())?;
            Some((
                src.area,
                LabelAnchor {
                    text: text.to_string(),
                    position,
                    font_px: config.style.font_size(src.area),
                },
            ))
        })
        .collect();

    // Stable sort keeps input order for equal areas.
    ranked.sort_by(|a, b| stable_total_cmp_f64(b.0, a.0));
    ranked.truncate(config.max_labels);
    ranked.into_iter().map(|(_, label)| label).collect()
}
