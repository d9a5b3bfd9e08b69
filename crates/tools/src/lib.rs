//! Headless heatmap rendering: load records, attach an overlay to a
//! [`ViewportMap`], and collect the painted frame.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use foundation::math::Size;
use foundation::{LatLng, LatLngBounds};
use layers::{
    HeatmapConfig, HeatmapData, HeatmapOverlay, MapEvent, MapHost, MemorySurface, RasterEngine,
    ViewportMap,
};
use serde_json::Value;
use tracing::info;

/// Where the map looks. `None` center fits the view to the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub center: Option<LatLng>,
    pub zoom: f64,
    pub size: Size,
}

#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub size: Size,
    pub rgba: Vec<u8>,
    pub zoom: f64,
    pub visible_points: usize,
}

pub fn load_config(path: Option<&Path>) -> Result<HeatmapConfig, String> {
    let Some(path) = path else {
        return Ok(HeatmapConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    HeatmapConfig::from_json(&text).map_err(|e| format!("{path:?}: {e}"))
}

/// Accepts either `{"max":..,"min":..,"data":[..]}` or a bare record array.
pub fn parse_data(text: &str) -> Result<HeatmapData, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("parse data: {e}"))?;
    match value {
        Value::Array(records) => Ok(HeatmapData::new(records)),
        other => serde_json::from_value(other).map_err(|e| format!("parse data: {e}")),
    }
}

pub fn load_data(path: &Path) -> Result<HeatmapData, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    parse_data(&text)
}

/// Parses `LAT,LNG`.
pub fn parse_center(text: &str) -> Result<LatLng, String> {
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got {text:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude {lng:?}: {e}"))?;
    Ok(LatLng::new(lat, lng))
}

pub fn data_bounds(config: HeatmapConfig, data: &HeatmapData) -> Result<Option<LatLngBounds>, String> {
    let mut overlay = HeatmapOverlay::<ViewportMap, RasterEngine>::new(
        config,
        MemorySurface::new(),
        RasterEngine,
    )
    .map_err(|e| e.to_string())?;
    overlay.set_data(data).map_err(|e| e.to_string())?;
    Ok(overlay.data_bounds())
}

pub fn render(
    config: HeatmapConfig,
    data: &HeatmapData,
    view: RenderView,
) -> Result<RenderedFrame, String> {
    let center = view.center.unwrap_or(LatLng::new(0.0, 0.0));
    let map = Rc::new(ViewportMap::new(center, view.zoom, view.size));
    let mut overlay = HeatmapOverlay::new(config, MemorySurface::new(), RasterEngine)
        .map_err(|e| e.to_string())?
        .add_to(&map);
    overlay.set_data(data).map_err(|e| e.to_string())?;

    if view.center.is_none() {
        if let Some(bounds) = overlay.data_bounds() {
            map.fit_bounds(bounds);
            map.notify(MapEvent::MoveEnd, &mut overlay);
        }
    }

    let renderer = overlay
        .renderer()
        .ok_or_else(|| "renderer was not created".to_string())?;
    info!(
        points = overlay.len(),
        visible = renderer.point_count(),
        zoom = map.zoom(),
        "heatmap rendered"
    );
    Ok(RenderedFrame {
        size: renderer.size(),
        rgba: renderer.frame().to_vec(),
        zoom: map.zoom(),
        visible_points: renderer.point_count(),
    })
}

pub fn write_png(frame: &RenderedFrame, path: &Path) -> Result<(), String> {
    let img = image::RgbaImage::from_raw(frame.size.width, frame.size.height, frame.rgba.clone())
        .ok_or_else(|| "frame buffer does not match its size".to_string())?;
    img.save(path).map_err(|e| format!("write {path:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::{RenderView, data_bounds, parse_center, parse_data, render};
    use foundation::LatLng;
    use foundation::math::Size;
    use layers::HeatmapConfig;

    #[test]
    fn parses_center() {
        assert_eq!(parse_center("10.5, -3").unwrap(), LatLng::new(10.5, -3.0));
        assert!(parse_center("10.5").is_err());
        assert!(parse_center("a,b").is_err());
    }

    #[test]
    fn parses_both_data_shapes() {
        let bare = parse_data(r#"[{"lat": 1, "lng": 2, "value": 3}]"#).unwrap();
        assert_eq!(bare.data.len(), 1);
        assert_eq!(bare.max, None);

        let wrapped = parse_data(r#"{"max": 9, "data": []}"#).unwrap();
        assert_eq!(wrapped.max, Some(9.0));
        assert!(wrapped.data.is_empty());

        assert!(parse_data("{").is_err());
    }

    #[test]
    fn renders_point_at_view_center() {
        let data = parse_data(r#"[{"lat": 0, "lng": 0, "value": 1}]"#).unwrap();
        let config = HeatmapConfig {
            radius: 8.0,
            ..HeatmapConfig::default()
        };
        let frame = render(
            config,
            &data,
            RenderView {
                center: Some(LatLng::new(0.0, 0.0)),
                zoom: 3.0,
                size: Size::new(64, 64),
            },
        )
        .unwrap();
        assert_eq!(frame.visible_points, 1);
        assert_eq!(frame.rgba.len(), 64 * 64 * 4);
        let center = (32 * 64 + 32) * 4;
        // Full weight at the center maps to the hottest gradient color.
        assert_eq!(&frame.rgba[center..center + 4], &[255, 0, 0, 255]);
        let corner = 0;
        assert_eq!(frame.rgba[corner + 3], 0);
    }

    #[test]
    fn fits_view_to_data_without_center() {
        let data = parse_data(
            r#"[{"lat": 40, "lng": -74, "value": 1}, {"lat": 41, "lng": -73, "value": 2}]"#,
        )
        .unwrap();
        let frame = render(
            HeatmapConfig::default(),
            &data,
            RenderView {
                center: None,
                zoom: 0.0,
                size: Size::new(256, 256),
            },
        )
        .unwrap();
        assert_eq!(frame.visible_points, 2);
        assert!(frame.zoom >= 6.0);
    }

    #[test]
    fn reports_bounds_and_bad_records() {
        let data = parse_data(r#"[{"lat": 1, "lng": 2, "value": 3}, {"lat": -1, "lng": 5, "value": 1}]"#)
            .unwrap();
        let bounds = data_bounds(HeatmapConfig::default(), &data).unwrap().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(-1.0, 2.0));
        assert_eq!(bounds.north_east, LatLng::new(1.0, 5.0));

        let bad = parse_data(r#"[{"lat": 1}]"#).unwrap();
        let err = render(
            HeatmapConfig::default(),
            &bad,
            RenderView {
                center: Some(LatLng::new(0.0, 0.0)),
                zoom: 1.0,
                size: Size::new(8, 8),
            },
        )
        .unwrap_err();
        assert!(err.contains("lng"), "{err}");
    }
}
