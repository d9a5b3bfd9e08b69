//! Heatmap overlay: weighted geographic points re-projected on every view
//! change and handed to a density renderer.

pub mod config;
pub mod data;
pub mod gradient;
pub mod raster;
pub mod renderer;
pub mod shared;

use std::rc::Rc;

use foundation::math::{Point, Size};
use foundation::{LatLng, LatLngBounds};
use serde_json::Value;
use tracing::{debug, trace};

use crate::layer::{Layer, LayerId, MapEvent, MapHost, add_layer};
use crate::surface::Surface;

pub use config::{ConfigError, HeatmapConfig, RendererOptions};
pub use data::{DataError, Dataset, GeoPoint, HeatmapData};
pub use gradient::Gradient;
pub use raster::{RasterEngine, RasterRenderer};
pub use renderer::{DensityEngine, DensityRenderer, HeatmapPayload, ProjectedPoint};
pub use shared::{SharedOverlay, WeakOverlay};

/// Map layer that keeps a [`Dataset`] in sync with a density renderer.
///
/// While attached, every data mutation and every `MoveEnd` redraws
/// synchronously. While detached, mutations only update the dataset.
///
/// Calling `set_data`/`add_data` from inside a renderer callback re-enters an
/// update in progress; callers must not do that.
pub struct HeatmapOverlay<H: MapHost, E: DensityEngine> {
    id: LayerId,
    config: HeatmapConfig,
    surface: H::Surface,
    engine: E,
    renderer: Option<E::Renderer>,
    dataset: Dataset,
    map: Option<Rc<H>>,
    size: Size,
    origin: Option<LatLng>,
}

impl<H: MapHost, E: DensityEngine> HeatmapOverlay<H, E> {
    pub fn new(
        config: HeatmapConfig,
        mut surface: H::Surface,
        engine: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        surface.set_size(Size::ZERO);
        Ok(Self {
            id: LayerId::next(),
            config,
            surface,
            engine,
            renderer: None,
            dataset: Dataset::new(),
            map: None,
            size: Size::ZERO,
            origin: None,
        })
    }

    /// Registers on `map`, attaches, and hands the overlay back.
    pub fn add_to(mut self, map: &Rc<H>) -> Self {
        add_layer(map, &mut self);
        self
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn max(&self) -> f64 {
        self.dataset.max()
    }

    pub fn min(&self) -> f64 {
        self.dataset.min()
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn is_attached(&self) -> bool {
        self.map.is_some()
    }

    /// World position of layer pixel (0, 0) at the last attach or reset.
    pub fn origin(&self) -> Option<LatLng> {
        self.origin
    }

    pub fn surface(&self) -> &H::Surface {
        &self.surface
    }

    pub fn renderer(&self) -> Option<&E::Renderer> {
        self.renderer.as_ref()
    }

    /// Extent of the stored points, for fitting the map view to the data.
    pub fn data_bounds(&self) -> Option<LatLngBounds> {
        self.dataset.bounds()
    }

    /// Replaces the dataset. Every record is checked before anything changes.
    pub fn set_data(&mut self, data: &HeatmapData) -> Result<(), DataError> {
        let points = data::normalize_records(&data.data, &self.config)?;
        debug!(points = points.len(), max = ?data.max, min = ?data.min, "heatmap data replaced");
        self.dataset.replace(points, data.max, data.min);
        self.draw();
        Ok(())
    }

    /// Appends one record, or each record of a JSON array in order.
    ///
    /// Every appended record triggers its own redraw.
    pub fn add_data(&mut self, point_or_array: &Value) -> Result<(), DataError> {
        match point_or_array {
            Value::Array(records) => {
                let points = data::normalize_records(records, &self.config)?;
                for point in points {
                    self.add_point(point);
                }
            }
            record => {
                let point = data::normalize_record(record, &self.config, 0)?;
                self.add_point(point);
            }
        }
        Ok(())
    }

    /// Typed form of [`add_data`](Self::add_data) for a single point.
    pub fn add_point(&mut self, point: GeoPoint) {
        self.dataset.push(point);
        self.draw();
    }

    /// Redraws against the current view. No-op while detached.
    pub fn redraw(&mut self) {
        self.draw();
    }

    /// Projects the visible part of the dataset into container pixels.
    pub fn project(&self, map: &H) -> HeatmapPayload {
        let mut payload = HeatmapPayload::empty(self.dataset.max(), self.dataset.min());
        if self.dataset.is_empty() {
            return payload;
        }

        let bounds = map.bounds();
        let zoom = map.zoom();
        let radius_scale = if self.config.scale_radius {
            2f64.powf(zoom)
        } else {
            1.0
        };

        let mut local: Option<(f64, f64)> = None;
        for point in self.dataset.points() {
            if !bounds.contains(point.lat_lng) {
                continue;
            }
            let v = point.value;
            local = Some(match local {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
            let p = map.lat_lng_to_container_point(point.lat_lng).round();
            payload.data.push(ProjectedPoint {
                x: p.x as i32,
                y: p.y as i32,
                value: v,
                radius: point.radius.unwrap_or(self.config.point_radius()) * radius_scale,
            });
        }

        if self.config.use_local_extrema {
            if let Some((lo, hi)) = local {
                payload.min = lo;
                payload.max = hi;
            }
        }
        trace!(
            visible = payload.data.len(),
            total = self.dataset.len(),
            zoom,
            "heatmap projected"
        );
        payload
    }

    fn draw(&mut self) {
        let Some(map) = self.map.clone() else {
            return;
        };
        let offset = Point::default() - map.map_pane_position().round();
        self.surface.set_translate(offset);
        self.update(&map);
    }

    fn update(&mut self, map: &H) {
        let payload = self.project(map);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_data(&payload);
        }
    }

    fn reset(&mut self) {
        let Some(map) = self.map.clone() else {
            return;
        };
        self.origin = Some(map.layer_point_to_lat_lng(Point::default()));
        let size = map.size();
        if size != self.size {
            debug!(width = size.width, height = size.height, "heatmap surface resized");
            self.size = size;
            self.surface.set_size(size);
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.set_dimensions(size);
            }
        }
        self.draw();
    }
}

impl<H: MapHost, E: DensityEngine> Layer<H> for HeatmapOverlay<H, E> {
    fn id(&self) -> LayerId {
        self.id
    }

    fn on_add(&mut self, map: &Rc<H>) {
        let size = map.size();
        self.map = Some(Rc::clone(map));
        self.surface.set_size(size);
        self.surface.set_absolute();
        self.origin = Some(map.layer_point_to_lat_lng(Point::default()));
        map.add_to_overlay_pane(self.id, &self.surface);

        match self.renderer.as_mut() {
            None => self.renderer = Some(self.engine.create(&self.config.renderer, size)),
            // Re-attached after the container changed size while detached.
            Some(renderer) if size != self.size => renderer.set_dimensions(size),
            Some(_) => {}
        }
        self.size = size;

        map.on(MapEvent::MoveEnd, self.id);
        debug!(layer = self.id.0, width = size.width, height = size.height, "heatmap attached");
        self.draw();
    }

    fn on_remove(&mut self, map: &H) {
        map.remove_from_overlay_pane(self.id, &self.surface);
        map.off(MapEvent::MoveEnd, self.id);
        if self.map.take().is_some() {
            debug!(layer = self.id.0, "heatmap detached");
        }
    }

    fn on_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::MoveEnd => self.reset(),
        }
    }
}
