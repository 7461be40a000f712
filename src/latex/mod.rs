//! LaTeX-subset markup: reserved-character escaping and rendering from the
//! document tree.

mod escape;
mod render;

pub use escape::{escape, unescape};
pub use render::render_markup;
