use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use foundation::LatLng;
use foundation::LatLngBounds;
use foundation::math::{Point, Size};

use crate::surface::Surface;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

impl LayerId {
    /// Process-unique id, in allocation order.
    pub fn next() -> Self {
        LayerId(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Map notifications a layer can subscribe to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapEvent {
    /// The view finished panning, zooming or resizing.
    MoveEnd,
}

impl MapEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            MapEvent::MoveEnd => "moveend",
        }
    }
}

/// Viewport and projection authority a layer is attached to.
///
/// Methods take `&self`: a host is shared between the layers drawn on it, so
/// implementations keep their mutable state behind interior mutability.
pub trait MapHost {
    type Surface: Surface;

    /// Container size in pixels.
    fn size(&self) -> Size;
    fn zoom(&self) -> f64;
    /// Geographic extent of the visible container.
    fn bounds(&self) -> LatLngBounds;
    fn lat_lng_to_container_point(&self, ll: LatLng) -> Point;
    fn layer_point_to_lat_lng(&self, p: Point) -> LatLng;
    /// Current pixel offset of the map pane (grows while the user drags).
    fn map_pane_position(&self) -> Point;

    fn add_to_overlay_pane(&self, layer: LayerId, surface: &Self::Surface);
    fn remove_from_overlay_pane(&self, layer: LayerId, surface: &Self::Surface);

    /// Records `layer` as part of this map. Does not call `on_add`.
    fn register_layer(&self, layer: LayerId);
    fn unregister_layer(&self, layer: LayerId);

    fn on(&self, event: MapEvent, layer: LayerId);
    fn off(&self, event: MapEvent, layer: LayerId);
}

pub trait Layer<H: MapHost> {
    fn id(&self) -> LayerId;
    fn on_add(&mut self, map: &Rc<H>);
    fn on_remove(&mut self, map: &H);
    /// Delivered by the host for events the layer subscribed to.
    fn on_event(&mut self, _event: MapEvent) {}
}

/// Registers `layer` on `map` and attaches it.
pub fn add_layer<H: MapHost, L: Layer<H>>(map: &Rc<H>, layer: &mut L) {
    map.register_layer(layer.id());
    layer.on_add(map);
}

/// Detaches `layer` from `map` and forgets it.
pub fn remove_layer<H: MapHost, L: Layer<H>>(map: &H, layer: &mut L) {
    layer.on_remove(map);
    map.unregister_layer(layer.id());
}
