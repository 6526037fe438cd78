use serde::Deserialize;
use serde_json::Value;

use layers::Palette;
use runtime::{ScaleExtent, ZoomDurations};

use crate::error::MapError;

/// Map settings. Every field has a default, so `{}` is a valid config.
/// Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Id of the element the SVG is appended to.
    pub container_id: String,
    /// Overrides the container's client width.
    pub viewport_width: Option<f64>,
    pub viewport_height: f64,
    pub data_base: String,
    pub notes_base: String,
    pub world_extent: [f64; 2],
    pub country_extent: [f64; 2],
    pub zoom_step_ms: f64,
    pub zoom_fit_ms: f64,
    pub fit_margin: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    /// Wheel zoom factor is `2^(-delta_y * wheel_sensitivity)`.
    pub wheel_sensitivity: f64,
    pub boundary_cache_entries: usize,
    pub palette: Palette,
    /// `tracing` filter directives for the browser console, e.g. `"info,scene=debug"`.
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container_id: "world-map".to_string(),
            viewport_width: None,
            viewport_height: 500.0,
            data_base: "../data".to_string(),
            notes_base: "../travel_notes".to_string(),
            world_extent: [1.0, 8.0],
            country_extent: [1.0, 40.0],
            zoom_step_ms: 250.0,
            zoom_fit_ms: 750.0,
            fit_margin: 0.9,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            wheel_sensitivity: 0.002,
            boundary_cache_entries: 16,
            palette: Palette::default(),
            log_level: "info".to_string(),
        }
    }
}

impl MapConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, MapError> {
        let value: Value = serde_json::from_str(payload)?;
        if !value.is_object() {
            return Err(MapError::InvalidConfig(
                "config must be a JSON object".to_string(),
            ));
        }
        let config = MapConfig::deserialize(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        for (name, [min, max]) in [
            ("world_extent", self.world_extent),
            ("country_extent", self.country_extent),
        ] {
            if !(min > 0.0 && min <= max && max.is_finite()) {
                return Err(MapError::InvalidConfig(format!(
                    "{name} must satisfy 0 < min <= max, got [{min}, {max}]"
                )));
            }
        }
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            return Err(MapError::InvalidConfig(format!(
                "fit_margin must be in (0, 1], got {}",
                self.fit_margin
            )));
        }
        if !(self.viewport_height > 0.0) || self.viewport_width.is_some_and(|w| !(w > 0.0)) {
            return Err(MapError::InvalidConfig("viewport must be positive".to_string()));
        }
        if self.zoom_step_ms < 0.0 || self.zoom_fit_ms < 0.0 {
            return Err(MapError::InvalidConfig("zoom durations must be >= 0".to_string()));
        }
        Ok(())
    }

    pub fn world_extent(&self) -> ScaleExtent {
        ScaleExtent::new(self.world_extent[0], self.world_extent[1])
    }

    pub fn country_extent(&self) -> ScaleExtent {
        ScaleExtent::new(self.country_extent[0], self.country_extent[1])
    }

    pub fn durations(&self) -> ZoomDurations {
        ZoomDurations {
            step_s: self.zoom_step_ms / 1000.0,
            fit_s: self.zoom_fit_ms / 1000.0,
        }
    }

    /// Travel-note page for a visited region.
    pub fn note_url(&self, code: &str, region: &str) -> String {
        format!(
            "{}/{code}_{}.html",
            self.notes_base.trim_end_matches('/'),
            region.to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::MapConfig;
    use crate::error::MapError;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        let config = MapConfig::from_json_str("{}").expect("config");
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.durations().fit_s, 0.75);
        assert_eq!(config.world_extent().max, 8.0);
        assert_eq!(config.country_extent().max, 40.0);
    }

    #[test]
    fn overrides_merge_with_defaults() {
        let config = MapConfig::from_json_str(
            r##"{"data_base": "/data", "viewport_height": 420, "palette": {"hover": "#000"}}"##,
        )
        .expect("config");
        assert_eq!(config.data_base, "/data");
        assert_eq!(config.viewport_height, 420.0);
        assert_eq!(config.palette.hover, "#000");
        assert_eq!(config.palette.base, "#ccc");
    }

    #[test]
    fn rejects_bad_values() {
        let err = MapConfig::from_json_str(r#"{"world_extent": [8, 1]}"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
        assert!(MapConfig::from_json_str(r#"{"fit_margin": 0}"#).is_err());
        assert!(MapConfig::from_json_str(r#"{"viewport_height": -1}"#).is_err());
    }

    #[test]
    fn only_objects_with_known_keys_are_accepted() {
        for payload in ["[]", r##"["#container", 123]"##, "null", "\"world-map\""] {
            let err = MapConfig::from_json_str(payload).unwrap_err();
            assert!(matches!(err, MapError::InvalidConfig(_)), "{payload}: {err}");
        }
        let err = MapConfig::from_json_str(r#"{"data_bse": "/data"}"#).unwrap_err();
        assert!(err.to_string().contains("data_bse"), "{err}");
    }

    #[test]
    fn note_urls_lowercase_region() {
        let config = MapConfig {
            notes_base: "/notes/".to_string(),
            ..MapConfig::default()
        };
        assert_eq!(config.note_url("FRA", "Paris"), "/notes/FRA_paris.html");
    }
}
