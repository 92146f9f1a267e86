mod bitmap_font;
pub mod overlay_renderer;
