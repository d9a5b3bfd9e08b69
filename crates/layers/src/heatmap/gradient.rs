use std::collections::BTreeMap;

use crate::heatmap::config::ConfigError;

pub type Rgb = [u8; 3];

/// Sorted color stops, expanded into a 256-entry palette on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Rgb)>,
}

impl Default for Gradient {
    /// heatmap.js default: blue, green, yellow, red.
    fn default() -> Self {
        Self {
            stops: vec![
                (0.25, [0, 0, 255]),
                (0.55, [0, 255, 0]),
                (0.85, [255, 255, 0]),
                (1.0, [255, 0, 0]),
            ],
        }
    }
}

impl Gradient {
    pub fn from_stops(stops: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut parsed = Vec::with_capacity(stops.len());
        for (key, color) in stops {
            let offset: f64 = key
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidGradientStop(key.clone()))?;
            if !(0.0..=1.0).contains(&offset) {
                return Err(ConfigError::InvalidGradientStop(key.clone()));
            }
            let rgb = parse_color(color).ok_or_else(|| ConfigError::InvalidColor(color.clone()))?;
            parsed.push((offset, rgb));
        }
        if parsed.is_empty() {
            return Err(ConfigError::InvalidGradientStop(String::new()));
        }
        parsed.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { stops: parsed })
    }

    /// Color at `t`, clamped to the first/last stop outside their range.
    pub fn sample(&self, t: f64) -> Rgb {
        let Some(&(first_at, first)) = self.stops.first() else {
            return [0, 0, 0];
        };
        if t <= first_at {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (a_at, a) = pair[0];
            let (b_at, b) = pair[1];
            if t <= b_at {
                let span = b_at - a_at;
                let f = if span > 0.0 { (t - a_at) / span } else { 1.0 };
                return lerp_rgb(a, b, f);
            }
        }
        self.stops.last().map(|s| s.1).unwrap_or(first)
    }

    pub fn palette(&self) -> Vec<Rgb> {
        (0..256).map(|i| self.sample(i as f64 / 255.0)).collect()
    }
}

fn lerp_rgb(a: Rgb, b: Rgb, f: f64) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = a[i] as f64 + (b[i] as f64 - a[i] as f64) * f;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a handful of CSS names.
pub fn parse_color(text: &str) -> Option<Rgb> {
    let s = text.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }
        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(parts) {
            *slot = part.parse().ok()?;
        }
        return Some(rgb);
    }
    let named = match s.as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "navy" => [0, 0, 128],
        _ => return None,
    };
    Some(named)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = digit(i, 1)? * 17;
            }
            Some(rgb)
        }
        6 => Some([digit(0, 2)?, digit(2, 2)?, digit(4, 2)?]),
        _ => None,
    }
}
