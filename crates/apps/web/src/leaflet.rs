//! Leaflet map host and DOM surface.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use foundation::math::{Point, Size};
use foundation::{LatLng, LatLngBounds};
use layers::{LayerId, MapEvent, MapHost, Surface, ZOOM_HIDE_CLASS, css_translate};
use once_cell::sync::OnceCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, Node};

#[wasm_bindgen]
extern "C" {
    /// An `L.Map` instance.
    pub type LeafletMapJs;

    #[wasm_bindgen(method, js_name = getSize)]
    fn get_size(this: &LeafletMapJs) -> JsPoint;
    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &LeafletMapJs) -> f64;
    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &LeafletMapJs) -> JsBounds;
    #[wasm_bindgen(method, js_name = latLngToContainerPoint)]
    fn lat_lng_to_container_point(this: &LeafletMapJs, ll: &JsValue) -> JsPoint;
    #[wasm_bindgen(method, js_name = layerPointToLatLng)]
    fn layer_point_to_lat_lng(this: &LeafletMapJs, p: &JsValue) -> JsLatLng;
    #[wasm_bindgen(method, js_name = getPanes)]
    fn get_panes(this: &LeafletMapJs) -> JsValue;
    #[wasm_bindgen(method)]
    fn on(this: &LeafletMapJs, event: &str, handler: &js_sys::Function);
    #[wasm_bindgen(method)]
    fn off(this: &LeafletMapJs, event: &str, handler: &js_sys::Function);

    type JsPoint;
    #[wasm_bindgen(method, getter)]
    fn x(this: &JsPoint) -> f64;
    #[wasm_bindgen(method, getter)]
    fn y(this: &JsPoint) -> f64;

    type JsLatLng;
    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLatLng) -> f64;
    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLatLng) -> f64;

    type JsBounds;
    #[wasm_bindgen(method, js_name = getSouthWest)]
    fn get_south_west(this: &JsBounds) -> JsLatLng;
    #[wasm_bindgen(method, js_name = getNorthEast)]
    fn get_north_east(this: &JsBounds) -> JsLatLng;
}

/// Unwraps a browser result, rethrowing the error into the calling JS frame.
pub(crate) fn or_throw<T>(result: Result<T, JsValue>) -> T {
    result.unwrap_or_else(|err| wasm_bindgen::throw_val(err))
}

fn lat_lng(js: &JsLatLng) -> LatLng {
    LatLng::new(js.lat(), js.lng())
}

fn pair(a: f64, b: f64) -> JsValue {
    js_sys::Array::of2(&JsValue::from_f64(a), &JsValue::from_f64(b)).into()
}

/// `(js style key, css property)` pairs, most standard first.
const TRANSFORM_PROPS: [(&str, &str); 5] = [
    ("transform", "transform"),
    ("WebkitTransform", "-webkit-transform"),
    ("MozTransform", "-moz-transform"),
    ("OTransform", "-o-transform"),
    ("msTransform", "-ms-transform"),
];

static CSS_TRANSFORM: OnceCell<&'static str> = OnceCell::new();

/// CSS transform property this browser understands, probed once.
pub fn css_transform_property() -> &'static str {
    CSS_TRANSFORM.get_or_init(|| {
        let probe = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.create_element("div").ok())
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let Some(div) = probe else {
            return TRANSFORM_PROPS[0].1;
        };
        let style = div.style();
        TRANSFORM_PROPS
            .iter()
            .find(|(key, _)| {
                js_sys::Reflect::get(&style, &JsValue::from_str(key))
                    .map(|v| !v.is_undefined())
                    .unwrap_or(false)
            })
            .map(|(_, css)| *css)
            .unwrap_or(TRANSFORM_PROPS[0].1)
    })
}

/// The overlay's `div`.
#[derive(Debug, Clone)]
pub struct DomSurface {
    el: HtmlElement,
}

impl DomSurface {
    pub fn new() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let el: HtmlElement = document.create_element("div")?.dyn_into()?;
        el.set_class_name(ZOOM_HIDE_CLASS);
        Ok(Self { el })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.el
    }

    fn set_style(&self, property: &str, value: &str) {
        or_throw(self.el.style().set_property(property, value));
    }
}

impl Surface for DomSurface {
    fn set_size(&mut self, size: Size) {
        self.set_style("width", &format!("{}px", size.width));
        self.set_style("height", &format!("{}px", size.height));
    }

    fn set_absolute(&mut self) {
        self.set_style("position", "absolute");
    }

    fn set_translate(&mut self, offset: Point) {
        self.set_style(css_transform_property(), &css_translate(offset));
    }
}

/// [`MapHost`] over a live `L.Map`.
///
/// Layer registration and subscriptions are tracked here. The exported layer
/// supplies the JS callback through [`LeafletMap::listen`]; `off` unbinds and
/// drops it.
pub struct LeafletMap {
    map: LeafletMapJs,
    layers: RefCell<BTreeSet<LayerId>>,
    subscriptions: RefCell<BTreeSet<(MapEvent, LayerId)>>,
    listeners: RefCell<BTreeMap<(MapEvent, LayerId), Closure<dyn FnMut()>>>,
}

impl LeafletMap {
    pub fn new(map: JsValue) -> Self {
        Self {
            map: map.unchecked_into(),
            layers: RefCell::new(BTreeSet::new()),
            subscriptions: RefCell::new(BTreeSet::new()),
            listeners: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn is_subscribed(&self, event: MapEvent, layer: LayerId) -> bool {
        self.subscriptions.borrow().contains(&(event, layer))
    }

    /// Binds `callback` to `event` for a subscribed layer, replacing any
    /// previous callback. Ignored when the layer is not subscribed.
    pub fn listen(&self, event: MapEvent, layer: LayerId, callback: Closure<dyn FnMut()>) {
        if !self.is_subscribed(event, layer) {
            return;
        }
        self.unlisten(event, layer);
        self.map
            .on(event.as_str(), callback.as_ref().unchecked_ref());
        self.listeners.borrow_mut().insert((event, layer), callback);
    }

    fn unlisten(&self, event: MapEvent, layer: LayerId) {
        let callback = self.listeners.borrow_mut().remove(&(event, layer));
        if let Some(callback) = callback {
            self.map
                .off(event.as_str(), callback.as_ref().unchecked_ref());
        }
    }

    fn pane(&self, name: &str) -> JsValue {
        or_throw(js_sys::Reflect::get(
            &self.map.get_panes(),
            &JsValue::from_str(name),
        ))
    }

    fn overlay_pane(&self) -> Node {
        or_throw(self.pane("overlayPane").dyn_into::<Node>())
    }
}

impl MapHost for LeafletMap {
    type Surface = DomSurface;

    fn size(&self) -> Size {
        let s = self.map.get_size();
        Size::new(s.x().max(0.0) as u32, s.y().max(0.0) as u32)
    }

    fn zoom(&self) -> f64 {
        self.map.get_zoom()
    }

    fn bounds(&self) -> LatLngBounds {
        let b = self.map.get_bounds();
        LatLngBounds::new(lat_lng(&b.get_south_west()), lat_lng(&b.get_north_east()))
    }

    fn lat_lng_to_container_point(&self, ll: LatLng) -> Point {
        let p = self.map.lat_lng_to_container_point(&pair(ll.lat, ll.lng));
        Point::new(p.x(), p.y())
    }

    fn layer_point_to_lat_lng(&self, p: Point) -> LatLng {
        lat_lng(&self.map.layer_point_to_lat_lng(&pair(p.x, p.y)))
    }

    fn map_pane_position(&self) -> Point {
        // Leaflet keeps the pane offset on the element; unset means never moved.
        let pos = or_throw(js_sys::Reflect::get(
            &self.pane("mapPane"),
            &JsValue::from_str("_leaflet_pos"),
        ));
        if pos.is_undefined() || pos.is_null() {
            return Point::default();
        }
        let pos: JsPoint = pos.unchecked_into();
        Point::new(pos.x(), pos.y())
    }

    fn add_to_overlay_pane(&self, _layer: LayerId, surface: &DomSurface) {
        or_throw(self.overlay_pane().append_child(surface.element()));
    }

    fn remove_from_overlay_pane(&self, _layer: LayerId, surface: &DomSurface) {
        let pane = self.overlay_pane();
        if surface.element().parent_node().as_ref() == Some(&pane) {
            or_throw(pane.remove_child(surface.element()));
        }
    }

    fn register_layer(&self, layer: LayerId) {
        self.layers.borrow_mut().insert(layer);
    }

    fn unregister_layer(&self, layer: LayerId) {
        self.layers.borrow_mut().remove(&layer);
    }

    fn on(&self, event: MapEvent, layer: LayerId) {
        self.subscriptions.borrow_mut().insert((event, layer));
    }

    fn off(&self, event: MapEvent, layer: LayerId) {
        self.subscriptions.borrow_mut().remove(&(event, layer));
        self.unlisten(event, layer);
    }
}
