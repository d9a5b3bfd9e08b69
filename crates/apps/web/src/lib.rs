//! WebAssembly bindings: a heatmap overlay on a Leaflet map, painted by
//! heatmap.js.
//!
//! ```js
//! const layer = new HeatmapLayer({ radius: 20, valueField: "count" });
//! layer.addTo(map).setData({ max: 8, data: [{ lat: 24.6, lng: -70.5, count: 3 }] });
//! ```

mod h337;
mod leaflet;

use std::rc::Rc;

use layers::{HeatmapConfig, HeatmapData, HeatmapOverlay, Layer, MapEvent, SharedOverlay};
use wasm_bindgen::prelude::*;

pub use h337::{H337Engine, H337Renderer};
pub use leaflet::{DomSurface, LeafletMap, css_transform_property};

type Overlay = SharedOverlay<LeafletMap, H337Engine>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

fn js_to_json(value: &JsValue) -> Result<String, JsValue> {
    js_sys::JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| JsValue::from_str("value is not JSON-serializable"))
}

fn to_js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// JS handle to a heatmap overlay. Handles returned by `addTo` share the
/// overlay; it detaches once every handle has been freed.
#[wasm_bindgen]
pub struct HeatmapLayer {
    overlay: Overlay,
}

#[wasm_bindgen]
impl HeatmapLayer {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<HeatmapLayer, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            HeatmapConfig::default()
        } else {
            HeatmapConfig::from_json(&js_to_json(&config)?).map_err(to_js_err)?
        };
        let surface = DomSurface::new()?;
        let engine = H337Engine::new(surface.element().clone(), config.value_field.clone());
        let overlay = HeatmapOverlay::new(config, surface, engine).map_err(to_js_err)?;
        Ok(HeatmapLayer {
            overlay: SharedOverlay::new(overlay),
        })
    }

    /// Attaches to an `L.Map`, detaching from any previous map first.
    /// Returns a handle to the same layer for chaining.
    #[wasm_bindgen(js_name = addTo)]
    pub fn add_to(&self, map: JsValue) -> HeatmapLayer {
        let map = Rc::new(LeafletMap::new(map));
        let overlay = self.overlay.add_to(&map);

        let weak = overlay.downgrade();
        let id = overlay.borrow().id();
        map.listen(
            MapEvent::MoveEnd,
            id,
            Closure::<dyn FnMut()>::new(move || {
                weak.notify(MapEvent::MoveEnd);
            }),
        );
        HeatmapLayer { overlay }
    }

    /// Detaches from the current map. Does nothing when not attached.
    pub fn remove(&self) {
        self.overlay.remove();
    }

    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&self, data: JsValue) -> Result<(), JsValue> {
        let data: HeatmapData = serde_json::from_str(&js_to_json(&data)?).map_err(to_js_err)?;
        self.overlay.borrow_mut().set_data(&data).map_err(to_js_err)
    }

    #[wasm_bindgen(js_name = addData)]
    pub fn add_data(&self, point_or_array: JsValue) -> Result<(), JsValue> {
        let value: serde_json::Value =
            serde_json::from_str(&js_to_json(&point_or_array)?).map_err(to_js_err)?;
        self.overlay.borrow_mut().add_data(&value).map_err(to_js_err)
    }

    #[wasm_bindgen(getter)]
    pub fn max(&self) -> f64 {
        self.overlay.borrow().max()
    }

    #[wasm_bindgen(getter)]
    pub fn min(&self) -> f64 {
        self.overlay.borrow().min()
    }

    /// `[[south, west], [north, east]]` of the stored points, or `null`.
    #[wasm_bindgen(js_name = getDataBounds)]
    pub fn data_bounds(&self) -> JsValue {
        let Some(b) = self.overlay.borrow().data_bounds() else {
            return JsValue::NULL;
        };
        let corner = |lat: f64, lng: f64| -> JsValue {
            js_sys::Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lng)).into()
        };
        js_sys::Array::of2(
            &corner(b.south_west.lat, b.south_west.lng),
            &corner(b.north_east.lat, b.north_east.lng),
        )
        .into()
    }
}
