use foundation::math::Size;
use serde::{Deserialize, Serialize};

use crate::heatmap::config::RendererOptions;

/// A point resolved into container pixels for one redraw.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: i32,
    pub y: i32,
    pub value: f64,
    pub radius: f64,
}

/// Everything a density renderer needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPayload {
    pub max: f64,
    pub min: f64,
    pub data: Vec<ProjectedPoint>,
}

impl HeatmapPayload {
    pub fn empty(max: f64, min: f64) -> Self {
        Self {
            max,
            min,
            data: Vec::new(),
        }
    }
}

/// Paints weighted pixel points onto a surface.
pub trait DensityRenderer {
    fn set_data(&mut self, payload: &HeatmapPayload);
    fn set_dimensions(&mut self, size: Size);
}

/// Builds a renderer for an overlay; called once per overlay.
pub trait DensityEngine {
    type Renderer: DensityRenderer;

    fn create(&self, options: &RendererOptions, size: Size) -> Self::Renderer;
}
