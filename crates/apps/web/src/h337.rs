//! heatmap.js (`window.h337`) as the density renderer.

use foundation::math::Size;
use layers::{DensityEngine, DensityRenderer, HeatmapPayload, RendererOptions};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::leaflet::or_throw;

#[wasm_bindgen]
extern "C" {
    type H337Instance;

    #[wasm_bindgen(js_namespace = h337, js_name = create)]
    fn h337_create(config: &JsValue) -> H337Instance;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &H337Instance, data: &JsValue);

    #[wasm_bindgen(method, getter, js_name = _renderer)]
    fn canvas_renderer(this: &H337Instance) -> H337CanvasRenderer;

    type H337CanvasRenderer;

    #[wasm_bindgen(method, js_name = setDimensions)]
    fn set_dimensions(this: &H337CanvasRenderer, width: u32, height: u32);
}

fn set(target: &JsValue, key: &str, value: &JsValue) {
    or_throw(js_sys::Reflect::set(target, &JsValue::from_str(key), value));
}

/// Creates heatmap.js instances painting into the overlay's `div`.
pub struct H337Engine {
    container: HtmlElement,
    value_field: String,
}

impl H337Engine {
    pub fn new(container: HtmlElement, value_field: impl Into<String>) -> Self {
        Self {
            container,
            value_field: value_field.into(),
        }
    }
}

impl DensityEngine for H337Engine {
    type Renderer = H337Renderer;

    fn create(&self, options: &RendererOptions, _size: Size) -> H337Renderer {
        // heatmap.js sizes its canvas from the container, already laid out here.
        let json = or_throw(
            serde_json::to_string(options).map_err(|e| JsValue::from_str(&e.to_string())),
        );
        let config = or_throw(js_sys::JSON::parse(&json));
        set(&config, "container", &self.container);
        set(&config, "valueField", &JsValue::from_str(&self.value_field));
        H337Renderer {
            instance: h337_create(&config),
            value_field: JsValue::from_str(&self.value_field),
        }
    }
}

pub struct H337Renderer {
    instance: H337Instance,
    value_field: JsValue,
}

impl DensityRenderer for H337Renderer {
    fn set_data(&mut self, payload: &HeatmapPayload) {
        let points = js_sys::Array::new_with_length(payload.data.len() as u32);
        for (i, p) in payload.data.iter().enumerate() {
            let obj: JsValue = js_sys::Object::new().into();
            set(&obj, "x", &JsValue::from(p.x));
            set(&obj, "y", &JsValue::from(p.y));
            or_throw(js_sys::Reflect::set(
                &obj,
                &self.value_field,
                &JsValue::from_f64(p.value),
            ));
            set(&obj, "radius", &JsValue::from_f64(p.radius));
            points.set(i as u32, obj);
        }
        let data: JsValue = js_sys::Object::new().into();
        set(&data, "max", &JsValue::from_f64(payload.max));
        set(&data, "min", &JsValue::from_f64(payload.min));
        set(&data, "data", &points);
        self.instance.set_data(&data);
    }

    fn set_dimensions(&mut self, size: Size) {
        self.instance
            .canvas_renderer()
            .set_dimensions(size.width, size.height);
    }
}
