//! WASM bindings for browser-based editors.
//!
//! This module exposes the conversion functions to JavaScript via wasm-bindgen.
//! An editor calls [`markup_to_html`] when the source pane changes and
//! [`html_to_markup`] plus [`splice_body`] when the rendered pane is edited.

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert markup (a full document or just a body) to an HTML fragment.
///
/// Math previews are textual placeholders; the page typesets them.
#[wasm_bindgen]
pub fn markup_to_html(markup: &str) -> String {
    crate::compile_markup(markup).html
}

/// Convert the rendered surface's HTML back to markup.
#[wasm_bindgen]
pub fn html_to_markup(html: &str) -> String {
    crate::html_to_markup(html)
}

/// Replace the body of a full source document, keeping its preamble.
#[wasm_bindgen]
pub fn splice_body(source: &str, body: &str) -> String {
    crate::compiler::splice_body(source, body)
}
