//! Scratch DOM for parsing rendered HTML.
//!
//! Both directions parse HTML: the forward compiler parses the fragment it
//! just generated, and the backward path parses whatever rendered surface it
//! is handed. Both go through [`parse_html`].

mod arena;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use tree_sink::ArenaSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse an HTML document or fragment into an arena DOM.
///
/// Fragments are placed inside an implied `<html><body>`, so callers look for
/// the `body` element either way.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}
