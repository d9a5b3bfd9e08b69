use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::heatmap::gradient::Gradient;

/// Radius used when neither the point nor the configuration sets one.
pub const DEFAULT_RADIUS: f64 = 2.0;

/// Overlay configuration, fixed for the overlay's lifetime.
///
/// Keys follow the browser plugin's camelCase names so a config object can be
/// shared between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapConfig {
    /// Record field holding the latitude.
    pub lat_field: String,
    /// Record field holding the longitude.
    pub lng_field: String,
    /// Record field holding the weight.
    pub value_field: String,
    /// Point radius in pixels when a record has none. `0` means the default.
    pub radius: f64,
    /// Multiply radii by `2^zoom` so points keep their ground size.
    pub scale_radius: bool,
    /// Normalize against the visible points instead of the whole dataset.
    pub use_local_extrema: bool,
    #[serde(flatten)]
    pub renderer: RendererOptions,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            lat_field: "lat".to_string(),
            lng_field: "lng".to_string(),
            value_field: "value".to_string(),
            radius: DEFAULT_RADIUS,
            scale_radius: false,
            use_local_extrema: false,
            renderer: RendererOptions::default(),
        }
    }
}

/// Options handed through to the density renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererOptions {
    /// Fraction of the radius that fades out, `0` = hard edge.
    pub blur: f64,
    pub max_opacity: f64,
    pub min_opacity: f64,
    /// Fixed opacity overriding the min/max range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Color stops keyed by position in `[0, 1]`, e.g. `{"0.4": "blue"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<BTreeMap<String, String>>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            blur: 0.85,
            max_opacity: 1.0,
            min_opacity: 0.0,
            opacity: None,
            gradient: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyField(&'static str),
    InvalidRadius(f64),
    OutOfRange { name: &'static str, value: f64 },
    InvalidGradientStop(String),
    InvalidColor(String),
    Json(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyField(name) => write!(f, "{name} must not be empty"),
            ConfigError::InvalidRadius(r) => {
                write!(f, "radius must be zero or positive, got {r}")
            }
            ConfigError::OutOfRange { name, value } => {
                write!(f, "{name} must be within [0, 1], got {value}")
            }
            ConfigError::InvalidGradientStop(key) => write!(f, "invalid gradient stop: {key}"),
            ConfigError::InvalidColor(color) => write!(f, "invalid color: {color}"),
            ConfigError::Json(msg) => write!(f, "invalid config json: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl HeatmapConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: HeatmapConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("latField", &self.lat_field),
            ("lngField", &self.lng_field),
            ("valueField", &self.value_field),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        self.renderer.validate()
    }

    /// Radius for records without their own.
    pub fn point_radius(&self) -> f64 {
        if self.radius > 0.0 {
            self.radius
        } else {
            DEFAULT_RADIUS
        }
    }
}

impl RendererOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut unit = vec![
            ("blur", self.blur),
            ("maxOpacity", self.max_opacity),
            ("minOpacity", self.min_opacity),
        ];
        if let Some(opacity) = self.opacity {
            unit.push(("opacity", opacity));
        }
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        if let Some(stops) = &self.gradient {
            Gradient::from_stops(stops)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DEFAULT_RADIUS, HeatmapConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_takes_defaults() {
        let config = HeatmapConfig::from_json("{}").expect("config");
        assert_eq!(config, HeatmapConfig::default());
        assert_eq!(config.radius, DEFAULT_RADIUS);
        assert_eq!(config.lat_field, "lat");
    }

    #[test]
    fn parses_plugin_style_keys() {
        let config = HeatmapConfig::from_json(
            r#"{
                "latField": "y",
                "lngField": "x",
                "valueField": "count",
                "radius": 10,
                "scaleRadius": true,
                "useLocalExtrema": true,
                "maxOpacity": 0.8,
                "gradient": {"0.4": "blue", "1": "red"}
            }"#,
        )
        .expect("config");
        assert_eq!(config.value_field, "count");
        assert_eq!(config.radius, 10.0);
        assert!(config.scale_radius);
        assert!(config.use_local_extrema);
        assert_eq!(config.renderer.max_opacity, 0.8);
        assert_eq!(config.renderer.blur, 0.85);
        assert_eq!(config.renderer.gradient.map(|g| g.len()), Some(2));
    }

    #[test]
    fn zero_radius_falls_back_to_default() {
        let config = HeatmapConfig::from_json(r#"{"radius": 0}"#).expect("config");
        assert_eq!(config.radius, 0.0);
        assert_eq!(config.point_radius(), DEFAULT_RADIUS);

        let config = HeatmapConfig::from_json(r#"{"radius": 7}"#).expect("config");
        assert_eq!(config.point_radius(), 7.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            HeatmapConfig::from_json(r#"{"radius": -3}"#),
            Err(ConfigError::InvalidRadius(-3.0))
        );
        assert_eq!(
            HeatmapConfig::from_json(r#"{"minOpacity": 1.5}"#),
            Err(ConfigError::OutOfRange {
                name: "minOpacity",
                value: 1.5
            })
        );
        assert_eq!(
            HeatmapConfig::from_json(r#"{"valueField": ""}"#),
            Err(ConfigError::EmptyField("valueField"))
        );
        assert!(matches!(
            HeatmapConfig::from_json(r#"{"gradient": {"0.5": "nope"}}"#),
            Err(ConfigError::InvalidColor(_))
        ));
        assert!(matches!(
            HeatmapConfig::from_json("[1, 2]"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let json = serde_json::to_value(HeatmapConfig::default()).expect("json");
        assert_eq!(json["latField"], "lat");
        assert_eq!(json["maxOpacity"], 1.0);
        assert!(json.get("gradient").is_none());
    }
}
