use serde::Deserialize;

/// Fill and stroke colors for map features.
///
/// Visited and not-visited features have distinct base and hover fills.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub base: String,
    pub visited: String,
    pub hover: String,
    pub visited_hover: String,
    pub world_stroke: String,
    pub world_stroke_width: f64,
    pub region_stroke: String,
    pub region_stroke_width: f64,
    pub label: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            base: "#ccc".to_string(),
            visited: "#a5d6a7".to_string(),
            hover: "#90caf9".to_string(),
            visited_hover: "#66bb6a".to_string(),
            world_stroke: "#fff".to_string(),
            world_stroke_width: 0.5,
            region_stroke: "black".to_string(),
            region_stroke_width: 0.1,
            label: "#333".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Highlight {
    None,
    Hover,
}

/// Stroke for one drill-down level.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Palette {
    pub fn fill(&self, visited: bool, highlight: Highlight) -> &str {
        match (visited, highlight) {
            (false, Highlight::None) => &self.base,
            (true, Highlight::None) => &self.visited,
            (false, Highlight::Hover) => &self.hover,
            (true, Highlight::Hover) => &self.visited_hover,
        }
    }

    pub fn world_stroke(&self) -> Stroke {
        Stroke {
            color: self.world_stroke.clone(),
            width: self.world_stroke_width,
        }
    }

    pub fn region_stroke(&self) -> Stroke {
        Stroke {
            color: self.region_stroke.clone(),
            width: self.region_stroke_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Highlight, Palette};

    #[test]
    fn fills_distinguish_visited_and_hover() {
        let p = Palette::default();
        assert_eq!(p.fill(false, Highlight::None), "#ccc");
        assert_eq!(p.fill(false, Highlight::Hover), "#90caf9");
        assert_ne!(p.fill(true, Highlight::None), p.fill(false, Highlight::None));
        assert_ne!(p.fill(true, Highlight::Hover), p.fill(false, Highlight::Hover));
    }

    #[test]
    fn partial_palette_keeps_defaults() {
        let p: Palette = serde_json::from_str(r##"{"visited": "#ff0000"}"##).expect("palette");
        assert_eq!(p.visited, "#ff0000");
        assert_eq!(p.base, "#ccc");
        assert_eq!(p.world_stroke().width, 0.5);
    }
}
