use foundation::math::Size;

use crate::heatmap::config::RendererOptions;
use crate::heatmap::gradient::{Gradient, Rgb};
use crate::heatmap::renderer::{DensityEngine, DensityRenderer, HeatmapPayload};

/// Smallest per-point alpha, so weak points still leave a trace.
const MIN_POINT_ALPHA: f64 = 0.01;

/// CPU density renderer producing an RGBA frame.
///
/// Each point stamps a radial alpha template scaled by its normalized value;
/// stamps composite with source-over. The accumulated alpha then indexes the
/// gradient palette.
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    size: Size,
    blur: f64,
    opacity: Option<f64>,
    min_opacity: f64,
    max_opacity: f64,
    palette: Vec<Rgb>,
    alpha: Vec<f32>,
    rgba: Vec<u8>,
    point_count: usize,
}

impl RasterRenderer {
    pub fn new(options: &RendererOptions, size: Size) -> Self {
        let gradient = options
            .gradient
            .as_ref()
            .and_then(|stops| Gradient::from_stops(stops).ok())
            .unwrap_or_default();
        Self {
            size,
            blur: options.blur,
            opacity: options.opacity,
            min_opacity: options.min_opacity,
            max_opacity: options.max_opacity,
            palette: gradient.palette(),
            alpha: vec![0.0; size.area()],
            rgba: vec![0; size.area() * 4],
            point_count: 0,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Row-major RGBA8 pixels.
    pub fn frame(&self) -> &[u8] {
        &self.rgba
    }

    /// Accumulated density at a pixel, `0.0` outside the frame.
    pub fn alpha_at(&self, x: u32, y: u32) -> f32 {
        if x >= self.size.width || y >= self.size.height {
            return 0.0;
        }
        self.alpha[(y * self.size.width + x) as usize]
    }

    /// Points painted by the last `set_data`.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    fn stamp(&mut self, cx: i32, cy: i32, radius: f64, weight: f64) {
        if radius <= 0.0 {
            return;
        }
        let inner = radius * (1.0 - self.blur);
        let (w, h) = (self.size.width as i32, self.size.height as i32);
        // Never reach past the frame; huge radii would overflow pixel math.
        let reach = radius.ceil().min(w.max(h) as f64) as i32;
        let x0 = cx.saturating_sub(reach).max(0);
        let x1 = cx.saturating_add(reach).min(w - 1);
        let y0 = cy.saturating_sub(reach).max(0);
        let y1 = cy.saturating_add(reach).min(h - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x - cx) as f64;
                let dy = (y - cy) as f64;
                let d = (dx * dx + dy * dy).sqrt();
                if d > radius {
                    continue;
                }
                let falloff = if d <= inner {
                    1.0
                } else {
                    (radius - d) / (radius - inner)
                };
                let src = (falloff * weight) as f32;
                let idx = (y * w + x) as usize;
                let dst = self.alpha[idx];
                self.alpha[idx] = src + dst * (1.0 - src);
            }
        }
    }

    fn colorize(&mut self) {
        for (i, a) in self.alpha.iter().enumerate() {
            let o = i * 4;
            if *a <= 0.0 {
                self.rgba[o..o + 4].fill(0);
                continue;
            }
            let a = *a as f64;
            let final_alpha = match self.opacity {
                Some(opacity) if opacity > 0.0 => opacity,
                _ => a.clamp(self.min_opacity, self.max_opacity.max(self.min_opacity)),
            };
            let idx = (a.clamp(0.0, 1.0) * 255.0).round() as usize;
            let [r, g, b] = self.palette[idx.min(255)];
            self.rgba[o] = r;
            self.rgba[o + 1] = g;
            self.rgba[o + 2] = b;
            self.rgba[o + 3] = (final_alpha * 255.0).round() as u8;
        }
    }
}

impl DensityRenderer for RasterRenderer {
    fn set_data(&mut self, payload: &HeatmapPayload) {
        self.alpha.iter_mut().for_each(|a| *a = 0.0);
        let range = payload.max - payload.min;
        for p in &payload.data {
            let t = if range > 0.0 {
                (p.value - payload.min) / range
            } else {
                1.0
            };
            let weight = t.clamp(MIN_POINT_ALPHA, 1.0);
            self.stamp(p.x, p.y, p.radius, weight);
        }
        self.point_count = payload.data.len();
        self.colorize();
    }

    fn set_dimensions(&mut self, size: Size) {
        self.size = size;
        self.alpha = vec![0.0; size.area()];
        self.rgba = vec![0; size.area() * 4];
        self.point_count = 0;
    }
}

/// Engine handing out [`RasterRenderer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEngine;

impl DensityEngine for RasterEngine {
    type Renderer = RasterRenderer;

    fn create(&self, options: &RendererOptions, size: Size) -> RasterRenderer {
        RasterRenderer::new(options, size)
    }
}
