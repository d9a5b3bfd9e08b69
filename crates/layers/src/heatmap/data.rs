use foundation::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::heatmap::config::HeatmapConfig;

/// One weighted sample in world coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_lng: LatLng,
    pub value: f64,
    /// Falls back to the configured radius at draw time.
    pub radius: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat_lng: LatLng, value: f64) -> Self {
        Self {
            lat_lng,
            value,
            radius: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Input accepted by `set_data`: raw records plus optional bound overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl HeatmapData {
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            max: None,
            min: None,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    NotAnObject { index: usize },
    MissingField { index: usize, field: String },
    NotANumber { index: usize, field: String },
    NotFinite { index: usize, field: String },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotAnObject { index } => write!(f, "record {index} is not an object"),
            DataError::MissingField { index, field } => {
                write!(f, "record {index} is missing field `{field}`")
            }
            DataError::NotANumber { index, field } => {
                write!(f, "record {index} field `{field}` is not a number")
            }
            DataError::NotFinite { index, field } => {
                write!(f, "record {index} field `{field}` is not finite")
            }
        }
    }
}

impl std::error::Error for DataError {}

/// Reads one record through the configured field aliases.
///
/// A `radius` that is zero or negative is treated as absent.
pub fn normalize_record(
    record: &Value,
    config: &HeatmapConfig,
    index: usize,
) -> Result<GeoPoint, DataError> {
    let Some(obj) = record.as_object() else {
        return Err(DataError::NotAnObject { index });
    };
    let number = |field: &str| -> Result<Option<f64>, DataError> {
        let Some(v) = obj.get(field) else {
            return Ok(None);
        };
        let n = v.as_f64().ok_or_else(|| DataError::NotANumber {
            index,
            field: field.to_string(),
        })?;
        if !n.is_finite() {
            return Err(DataError::NotFinite {
                index,
                field: field.to_string(),
            });
        }
        Ok(Some(n))
    };
    let required = |field: &str| -> Result<f64, DataError> {
        number(field)?.ok_or_else(|| DataError::MissingField {
            index,
            field: field.to_string(),
        })
    };

    let lat = required(&config.lat_field)?;
    let lng = required(&config.lng_field)?;
    let value = required(&config.value_field)?;
    let radius = number("radius")?.filter(|r| *r > 0.0);

    Ok(GeoPoint {
        lat_lng: LatLng::new(lat, lng),
        value,
        radius,
    })
}

pub fn normalize_records(
    records: &[Value],
    config: &HeatmapConfig,
) -> Result<Vec<GeoPoint>, DataError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(record, config, index))
        .collect()
}

/// Stored points plus the value range used for normalization.
///
/// `max`/`min` start at `1`/`0` and only ever widen on append.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    points: Vec<GeoPoint>,
    max: f64,
    min: f64,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            max: 1.0,
            min: 0.0,
        }
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every point; bounds change only where an override is given.
    pub fn replace(&mut self, points: Vec<GeoPoint>, max: Option<f64>, min: Option<f64>) {
        if let Some(max) = max {
            self.max = max;
        }
        if let Some(min) = min {
            self.min = min;
        }
        self.points = points;
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.max = self.max.max(point.value);
        self.min = self.min.min(point.value);
        self.points.push(point);
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    /// Extent of every stored point, `None` when empty.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.points.iter().map(|p| p.lat_lng))
    }
}

#[cfg(test)]
mod tests {
    use super::{DataError, Dataset, GeoPoint, HeatmapData, normalize_record, normalize_records};
    use crate::heatmap::config::HeatmapConfig;
    use foundation::LatLng;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn count_config() -> HeatmapConfig {
        HeatmapConfig {
            value_field: "count".to_string(),
            ..HeatmapConfig::default()
        }
    }

    #[test]
    fn normalizes_through_aliases() {
        let p = normalize_record(&json!({"lat": 10, "lng": 20.5, "count": 3}), &count_config(), 0)
            .expect("point");
        assert_eq!(p, GeoPoint::new(LatLng::new(10.0, 20.5), 3.0));
    }

    #[test]
    fn keeps_positive_radius_only() {
        let config = HeatmapConfig::default();
        let p = normalize_record(&json!({"lat": 1, "lng": 2, "value": 1, "radius": 7}), &config, 0)
            .expect("point");
        assert_eq!(p.radius, Some(7.0));
        let p = normalize_record(&json!({"lat": 1, "lng": 2, "value": 1, "radius": 0}), &config, 0)
            .expect("point");
        assert_eq!(p.radius, None);
    }

    #[test]
    fn reports_bad_records_with_index() {
        let config = count_config();
        let records = vec![
            json!({"lat": 1, "lng": 2, "count": 1}),
            json!({"lat": 1, "lng": 2}),
        ];
        assert_eq!(
            normalize_records(&records, &config),
            Err(DataError::MissingField {
                index: 1,
                field: "count".to_string()
            })
        );
        assert_eq!(
            normalize_record(&json!({"lat": "x", "lng": 2, "count": 1}), &config, 4),
            Err(DataError::NotANumber {
                index: 4,
                field: "lat".to_string()
            })
        );
        assert_eq!(
            normalize_record(&json!([1, 2, 3]), &config, 2),
            Err(DataError::NotAnObject { index: 2 })
        );
    }

    #[test]
    fn dataset_starts_at_unit_range() {
        let d = Dataset::new();
        assert_eq!((d.max(), d.min()), (1.0, 0.0));
        assert!(d.is_empty());
        assert!(d.bounds().is_none());
    }

    #[test]
    fn push_widens_bounds() {
        let mut d = Dataset::new();
        d.push(GeoPoint::new(LatLng::new(0.0, 0.0), 4.0));
        d.push(GeoPoint::new(LatLng::new(0.0, 0.0), -2.0));
        d.push(GeoPoint::new(LatLng::new(0.0, 0.0), 0.5));
        assert_eq!((d.max(), d.min()), (4.0, -2.0));
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn replace_honours_zero_overrides() {
        let mut d = Dataset::new();
        d.replace(Vec::new(), Some(5.0), Some(2.0));
        d.replace(Vec::new(), Some(0.0), None);
        assert_eq!((d.max(), d.min()), (0.0, 2.0));
    }

    #[test]
    fn bounds_cover_points() {
        let mut d = Dataset::new();
        d.push(GeoPoint::new(LatLng::new(10.0, -4.0), 1.0));
        d.push(GeoPoint::new(LatLng::new(-2.0, 8.0), 1.0));
        let b = d.bounds().expect("bounds");
        assert_eq!(b.south_west, LatLng::new(-2.0, -4.0));
        assert_eq!(b.north_east, LatLng::new(10.0, 8.0));
    }

    #[test]
    fn heatmap_data_parses_optional_bounds() {
        let data: HeatmapData =
            serde_json::from_value(json!({"max": 3, "data": [{"lat": 1}]})).expect("data");
        assert_eq!(data.max, Some(3.0));
        assert_eq!(data.min, None);
        assert_eq!(data.data.len(), 1);
    }
}
