use foundation::math::{Point, Size};

/// Class Leaflet uses to hide overlay panes during zoom animations.
pub const ZOOM_HIDE_CLASS: &str = "leaflet-zoom-hide";

/// Positioned drawing element an overlay owns, e.g. a DOM `div`.
pub trait Surface {
    fn set_size(&mut self, size: Size);
    fn set_absolute(&mut self);
    /// Shifts the element by a whole-pixel offset.
    fn set_translate(&mut self, offset: Point);
}

/// CSS value for a pixel translation.
pub fn css_translate(offset: Point) -> String {
    format!("translate({}px,{}px)", offset.x, offset.y)
}

/// Surface that only records its layout, for headless rendering and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySurface {
    pub class_name: String,
    pub size: Size,
    pub absolute: bool,
    pub translate: Point,
    pub transform: Option<String>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            class_name: ZOOM_HIDE_CLASS.to_string(),
            size: Size::ZERO,
            absolute: false,
            translate: Point::default(),
            transform: None,
        }
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MemorySurface {
    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn set_absolute(&mut self) {
        self.absolute = true;
    }

    fn set_translate(&mut self, offset: Point) {
        self.translate = offset;
        self.transform = Some(css_translate(offset));
    }
}
