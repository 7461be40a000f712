//! # texbridge
//!
//! Bidirectional conversion between a LaTeX subset and an editable HTML
//! document tree, for split-pane editors that keep markup and a rendered
//! surface in sync.
//!
//! ## Features
//!
//! - Markup → HTML fragment + document tree (sections, inline styles,
//!   colours, font sizes, alignment, links, images, lists, checklists,
//!   verbatim and inline code, inline and display math)
//! - Document tree (or any rendered HTML) → markup
//! - Math nodes keep their original expression as canonical source, so math
//!   survives the round trip byte for byte whether or not a typesetter is
//!   available
//!
//! ## Quick Start
//!
//! ```
//! use texbridge::{compile_markup, render_markup};
//!
//! let compiled = compile_markup("\\section{Demo}\n\nEnergy: \\[E=mc^2\\]");
//! assert!(compiled.html.contains("class=\"math-block\""));
//!
//! let markup = render_markup(&compiled.document);
//! assert_eq!(markup, "\\section{Demo}\n\nEnergy:\n\n\\[\nE=mc^2\n\\]");
//! ```
//!
//! ## Math previews
//!
//! A [`Converter`] can carry a [`MathRenderer`]. Without one, math previews
//! are the textual expression; a renderer that fails on an expression yields
//! an inline error marker instead.
//!
//! ```
//! use texbridge::Converter;
//! use texbridge::math::{MathError, MathMode, MathRenderer};
//!
//! struct Echo;
//!
//! impl MathRenderer for Echo {
//!     fn render(&self, expression: &str, _mode: MathMode) -> Result<String, MathError> {
//!         Ok(format!("<em>{expression}</em>"))
//!     }
//! }
//!
//! let converter = Converter::new().with_math(Box::new(Echo));
//! let compiled = converter.compile_markup("$x$");
//! assert!(compiled.html.contains("<em>x</em>"));
//! assert_eq!(converter.render_markup(&compiled.document), "$x$");
//! ```

pub mod compiler;
pub mod dom;
pub mod error;
pub mod io;
pub mod ir;
pub mod latex;
pub mod math;
pub mod protect;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use compiler::{Compiled, compile_html};
pub use error::{Error, Result};
pub use ir::Document;
pub use math::MathRenderer;

/// A configured converter.
///
/// Holds the optional math capability; every conversion is otherwise
/// independent and allocates its own state.
#[derive(Default)]
pub struct Converter {
    math: Option<Box<dyn MathRenderer>>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("math", &self.math.is_some())
            .finish()
    }
}

impl Converter {
    /// Create a converter without a math renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `renderer` for math previews.
    pub fn with_math(mut self, renderer: Box<dyn MathRenderer>) -> Self {
        self.math = Some(renderer);
        self
    }

    /// Convert markup to an HTML fragment and document tree.
    pub fn compile_markup(&self, markup: &str) -> Compiled {
        compiler::compile_markup_with(markup, self.math.as_deref())
    }

    /// Convert a document tree back to markup.
    pub fn render_markup(&self, doc: &Document) -> String {
        latex::render_markup(doc)
    }

    /// Convert a rendered HTML surface back to markup.
    pub fn html_to_markup(&self, html: &str) -> String {
        self.render_markup(&compile_html(html))
    }
}

/// Convert markup without a math renderer.
pub fn compile_markup(markup: &str) -> Compiled {
    compiler::compile_markup(markup)
}

/// Convert a document tree back to markup.
pub fn render_markup(doc: &Document) -> String {
    latex::render_markup(doc)
}

/// Convert a rendered HTML surface back to markup.
pub fn html_to_markup(html: &str) -> String {
    latex::render_markup(&compile_html(html))
}
