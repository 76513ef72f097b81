mod geometry;
pub mod layout;
mod projection;
mod renderer;

pub use layout::{layout, position, LayoutMode};
pub use projection::Viewport;
pub use renderer::{DisplaySettings, MapLayers, MapRenderer, MarkerGlyph};
