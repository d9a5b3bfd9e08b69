//! Headless map host with web-map (EPSG:3857) viewport semantics.
//!
//! Pixel bookkeeping follows the usual slippy-map model: a pixel origin is
//! fixed whenever the view is reset, and panning only moves the map pane.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use foundation::math::{Point, Size, WebMercator};
use foundation::{LatLng, LatLngBounds};

use crate::layer::{Layer, LayerId, MapEvent, MapHost};
use crate::surface::MemorySurface;

pub const MAX_ZOOM: f64 = 18.0;

#[derive(Debug, Clone, Copy)]
struct View {
    zoom: f64,
    size: Size,
    /// World pixel shown at layer point (0, 0).
    pixel_origin: Point,
    /// Offset the map pane has been dragged by since the last reset.
    pane_pos: Point,
}

#[derive(Debug, Default)]
struct Registry {
    layers: BTreeSet<LayerId>,
    overlay_pane: Vec<LayerId>,
    subscribers: BTreeMap<MapEvent, BTreeSet<LayerId>>,
}

#[derive(Debug)]
pub struct ViewportMap {
    view: RefCell<View>,
    registry: RefCell<Registry>,
}

impl ViewportMap {
    pub fn new(center: LatLng, zoom: f64, size: Size) -> Self {
        let map = Self {
            view: RefCell::new(View {
                zoom,
                size,
                pixel_origin: Point::default(),
                pane_pos: Point::default(),
            }),
            registry: RefCell::new(Registry::default()),
        };
        map.set_view(center, zoom);
        map
    }

    /// Re-centers the view; resets the pixel origin and pane offset.
    pub fn set_view(&self, center: LatLng, zoom: f64) {
        let mut view = self.view.borrow_mut();
        let half = view.size.as_point().scale(0.5);
        view.zoom = zoom;
        view.pixel_origin = (WebMercator::lat_lng_to_pixel(center, zoom) - half).round();
        view.pane_pos = Point::default();
    }

    /// Pans by a pixel offset, moving the map pane the opposite way.
    pub fn pan_by(&self, offset: Point) {
        let mut view = self.view.borrow_mut();
        view.pane_pos = view.pane_pos - offset.round();
    }

    /// Resizes the container, keeping the top-left corner in place.
    pub fn set_size(&self, size: Size) {
        self.view.borrow_mut().size = size;
    }

    pub fn center(&self) -> LatLng {
        let view = *self.view.borrow();
        let top_left = view.pixel_origin - view.pane_pos;
        WebMercator::pixel_to_lat_lng(top_left + view.size.as_point().scale(0.5), view.zoom)
    }

    /// Largest whole zoom showing all of `bounds`, centered on them.
    pub fn fit_bounds(&self, bounds: LatLngBounds) {
        let size = self.size().as_point();
        let nw = LatLng::new(bounds.north_east.lat, bounds.south_west.lng);
        let se = LatLng::new(bounds.south_west.lat, bounds.north_east.lng);
        let a = WebMercator::lat_lng_to_pixel(nw, 0.0);
        let b = WebMercator::lat_lng_to_pixel(se, 0.0);
        let extent = b - a;
        let fit = |avail: f64, span: f64| {
            if span > 0.0 {
                (avail / span).log2()
            } else {
                MAX_ZOOM
            }
        };
        let zoom = fit(size.x, extent.x)
            .min(fit(size.y, extent.y))
            .floor()
            .clamp(0.0, MAX_ZOOM);
        let center = WebMercator::pixel_to_lat_lng(a + extent.scale(0.5), 0.0);
        self.set_view(center, zoom);
    }

    pub fn has_layer(&self, layer: LayerId) -> bool {
        self.registry.borrow().layers.contains(&layer)
    }

    /// Layers whose surfaces are in the overlay pane, in insertion order.
    pub fn overlay_pane(&self) -> Vec<LayerId> {
        self.registry.borrow().overlay_pane.clone()
    }

    pub fn is_subscribed(&self, event: MapEvent, layer: LayerId) -> bool {
        self.registry
            .borrow()
            .subscribers
            .get(&event)
            .is_some_and(|s| s.contains(&layer))
    }

    /// Delivers `event` to `layer` if it subscribed. Returns whether it did.
    pub fn notify<L: Layer<Self>>(&self, event: MapEvent, layer: &mut L) -> bool {
        if !self.is_subscribed(event, layer.id()) {
            return false;
        }
        layer.on_event(event);
        true
    }
}

impl MapHost for ViewportMap {
    type Surface = MemorySurface;

    fn size(&self) -> Size {
        self.view.borrow().size
    }

    fn zoom(&self) -> f64 {
        self.view.borrow().zoom
    }

    fn bounds(&self) -> LatLngBounds {
        let view = *self.view.borrow();
        let top_left = view.pixel_origin - view.pane_pos;
        let size = view.size.as_point();
        let sw = WebMercator::pixel_to_lat_lng(Point::new(top_left.x, top_left.y + size.y), view.zoom);
        let ne = WebMercator::pixel_to_lat_lng(Point::new(top_left.x + size.x, top_left.y), view.zoom);
        LatLngBounds::new(sw, ne)
    }

    fn lat_lng_to_container_point(&self, ll: LatLng) -> Point {
        let view = *self.view.borrow();
        WebMercator::lat_lng_to_pixel(ll, view.zoom) - view.pixel_origin + view.pane_pos
    }

    fn layer_point_to_lat_lng(&self, p: Point) -> LatLng {
        let view = *self.view.borrow();
        WebMercator::pixel_to_lat_lng(p + view.pixel_origin, view.zoom)
    }

    fn map_pane_position(&self) -> Point {
        self.view.borrow().pane_pos
    }

    fn add_to_overlay_pane(&self, layer: LayerId, _surface: &MemorySurface) {
        let mut registry = self.registry.borrow_mut();
        if !registry.overlay_pane.contains(&layer) {
            registry.overlay_pane.push(layer);
        }
    }

    fn remove_from_overlay_pane(&self, layer: LayerId, _surface: &MemorySurface) {
        self.registry
            .borrow_mut()
            .overlay_pane
            .retain(|id| *id != layer);
    }

    fn register_layer(&self, layer: LayerId) {
        self.registry.borrow_mut().layers.insert(layer);
    }

    fn unregister_layer(&self, layer: LayerId) {
        self.registry.borrow_mut().layers.remove(&layer);
    }

    fn on(&self, event: MapEvent, layer: LayerId) {
        self.registry
            .borrow_mut()
            .subscribers
            .entry(event)
            .or_default()
            .insert(layer);
    }

    fn off(&self, event: MapEvent, layer: LayerId) {
        if let Some(set) = self.registry.borrow_mut().subscribers.get_mut(&event) {
            set.remove(&layer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ViewportMap;
    use crate::layer::{LayerId, MapEvent, MapHost};
    use crate::surface::MemorySurface;
    use foundation::math::{Point, Size};
    use foundation::{LatLng, LatLngBounds};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_projects_to_container_middle() {
        let map = ViewportMap::new(LatLng::new(10.0, 20.0), 5.0, Size::new(400, 300));
        let p = map.lat_lng_to_container_point(LatLng::new(10.0, 20.0));
        assert_close(p.x, 200.0, 0.5);
        assert_close(p.y, 150.0, 0.5);
        assert_close(map.center().lat, 10.0, 0.05);
        assert_close(map.center().lng, 20.0, 0.05);
    }

    #[test]
    fn bounds_contain_center_and_exclude_far_points() {
        let map = ViewportMap::new(LatLng::new(0.0, 0.0), 4.0, Size::new(256, 256));
        let b = map.bounds();
        assert!(b.contains(LatLng::new(0.0, 0.0)));
        assert!(!b.contains(LatLng::new(45.0, 90.0)));
        // 256px at zoom 4 spans 360 / 16 degrees of longitude.
        assert_close(b.north_east.lng - b.south_west.lng, 22.5, 1e-9);
    }

    #[test]
    fn pan_moves_pane_and_container_points() {
        let map = ViewportMap::new(LatLng::new(0.0, 0.0), 3.0, Size::new(200, 200));
        let before = map.lat_lng_to_container_point(LatLng::new(0.0, 0.0));
        let origin = map.layer_point_to_lat_lng(Point::default());
        map.pan_by(Point::new(30.0, -10.0));
        assert_eq!(map.map_pane_position(), Point::new(-30.0, 10.0));
        let after = map.lat_lng_to_container_point(LatLng::new(0.0, 0.0));
        assert_eq!(after, before + Point::new(-30.0, 10.0));
        // Layer space is unaffected by panning.
        assert_eq!(map.layer_point_to_lat_lng(Point::default()), origin);
    }

    #[test]
    fn fit_bounds_picks_largest_zoom() {
        let map = ViewportMap::new(LatLng::new(0.0, 0.0), 0.0, Size::new(256, 256));
        let bounds = LatLngBounds::new(LatLng::new(-10.0, -10.0), LatLng::new(10.0, 10.0));
        map.fit_bounds(bounds);
        // 20 degrees is 256 * 20 / 360 ~= 14.2px at zoom 0, so zoom 4 fits.
        assert_eq!(map.zoom(), 4.0);
        let b = map.bounds();
        assert!(b.contains(bounds.south_west));
        assert!(b.contains(bounds.north_east));
    }

    #[test]
    fn registry_tracks_panes_and_subscriptions() {
        let map = ViewportMap::new(LatLng::new(0.0, 0.0), 1.0, Size::new(10, 10));
        let id = LayerId::next();
        let surface = MemorySurface::new();
        map.register_layer(id);
        map.add_to_overlay_pane(id, &surface);
        map.on(MapEvent::MoveEnd, id);
        assert!(map.has_layer(id));
        assert_eq!(map.overlay_pane(), vec![id]);
        assert!(map.is_subscribed(MapEvent::MoveEnd, id));

        map.off(MapEvent::MoveEnd, id);
        map.remove_from_overlay_pane(id, &surface);
        map.unregister_layer(id);
        assert!(!map.has_layer(id));
        assert!(map.overlay_pane().is_empty());
        assert!(!map.is_subscribed(MapEvent::MoveEnd, id));
    }
}
