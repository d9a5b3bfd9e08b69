pub mod heatmap;
pub mod layer;
pub mod map;
pub mod surface;

pub use heatmap::*;
pub use layer::*;
pub use map::ViewportMap;
pub use surface::*;
