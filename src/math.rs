//! Math rendering capability and math node fragments.
//!
//! The converter never depends on a math typesetter being present. A
//! [`MathRenderer`] is an optional collaborator: when it is missing (or not
//! ready yet) the preview falls back to a textual placeholder, and when it
//! fails on an expression the preview becomes an inline error marker.
//!
//! The canonical source of a math node is the original expression,
//! percent-encoded into the `data-source` attribute. Previews are derived
//! from it and never read back.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use thiserror::Error;

use crate::compiler::html_escape;

/// Characters left unencoded in canonical sources (the `encodeURIComponent` set).
const SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Attribute holding the percent-encoded canonical source.
pub const SOURCE_ATTR: &str = "data-source";

/// Inline (`$…$`) or display (`\[…\]`) math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathMode {
    Inline,
    Display,
}

impl MathMode {
    /// Wrap an expression in this mode's markup delimiters.
    pub fn delimit(self, expression: &str) -> String {
        match self {
            MathMode::Inline => format!("${expression}$"),
            MathMode::Display => format!("\\[\n{expression}\n\\]"),
        }
    }
}

/// Failure to typeset a single expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("cannot render `{expression}`: {message}")]
    Render { expression: String, message: String },

    #[error("math renderer is not available")]
    Unavailable,
}

/// A math typesetting capability.
///
/// Implementations return an HTML fragment for the expression. A renderer
/// that needs to load or warm up reports `false` from [`MathRenderer::is_ready`]
/// until it can serve requests; conversions never wait for it.
pub trait MathRenderer {
    /// Render `expression` in the given mode.
    fn render(&self, expression: &str, mode: MathMode) -> Result<String, MathError>;

    /// Whether the renderer can serve requests right now.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Percent-encode a math expression for the `data-source` attribute.
pub fn encode_source(expression: &str) -> String {
    utf8_percent_encode(expression, SOURCE_ENCODE_SET).to_string()
}

/// Decode a `data-source` attribute back to the math expression.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_source(encoded: &str) -> Cow<'_, str> {
    percent_decode_str(encoded).decode_utf8_lossy()
}

/// Render the preview for an expression, degrading on absence or failure.
pub fn render_preview(
    expression: &str,
    mode: MathMode,
    renderer: Option<&dyn MathRenderer>,
) -> String {
    let Some(renderer) = renderer.filter(|r| r.is_ready()) else {
        return html_escape(&mode.delimit(expression));
    };

    match renderer.render(expression, mode) {
        Ok(fragment) => fragment,
        Err(err) => {
            log::warn!("{err}");
            format!(
                "<span class=\"math-error\" title=\"{}\">{}</span>",
                html_escape(&err.to_string()),
                html_escape(expression)
            )
        }
    }
}

/// Build the clickable container for one math expression.
///
/// The expression is trimmed and the trimmed text is the canonical source,
/// so `$ x $` comes back as `$x$`. Display math is written back with its
/// expression on its own line, and trimming is what keeps that stable
/// across repeated round trips.
pub fn math_fragment(
    expression: &str,
    mode: MathMode,
    renderer: Option<&dyn MathRenderer>,
) -> String {
    let expression = expression.trim();
    let (tag, class) = match mode {
        MathMode::Inline => ("span", "math-inline"),
        MathMode::Display => ("div", "math-block"),
    };

    format!(
        "<{tag} class=\"{class}\" {SOURCE_ATTR}=\"{}\" contenteditable=\"false\">{}</{tag}>",
        encode_source(expression),
        render_preview(expression, mode, renderer)
    )
}

/// MathML previews via `latex2mathml`.
#[cfg(feature = "mathml")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlRenderer;

#[cfg(feature = "mathml")]
impl MathRenderer for MathMlRenderer {
    fn render(&self, expression: &str, mode: MathMode) -> Result<String, MathError> {
        let style = match mode {
            MathMode::Inline => latex2mathml::DisplayStyle::Inline,
            MathMode::Display => latex2mathml::DisplayStyle::Block,
        };
        latex2mathml::latex_to_mathml(expression, style).map_err(|e| MathError::Render {
            expression: expression.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Upper;

    impl MathRenderer for Upper {
        fn render(&self, expression: &str, _mode: MathMode) -> Result<String, MathError> {
            if expression.contains("\\bad") {
                return Err(MathError::Render {
                    expression: expression.to_string(),
                    message: "undefined control sequence".to_string(),
                });
            }
            Ok(format!("<m>{}</m>", expression.to_uppercase()))
        }
    }

    struct Warming;

    impl MathRenderer for Warming {
        fn render(&self, _expression: &str, _mode: MathMode) -> Result<String, MathError> {
            Err(MathError::Unavailable)
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_encode_source() {
        assert_eq!(encode_source("E=mc^2"), "E%3Dmc%5E2");
        assert_eq!(encode_source("a_(b)"), "a_(b)");
        assert_eq!(encode_source("\\frac{1}{2}"), "%5Cfrac%7B1%7D%7B2%7D");
    }

    #[test]
    fn test_placeholder_without_renderer() {
        let html = math_fragment(" x<y ", MathMode::Inline, None);
        assert!(html.starts_with("<span class=\"math-inline\" data-source=\"x%3Cy\""));
        assert!(html.contains(">$x&lt;y$</span>"));
    }

    #[test]
    fn test_display_placeholder() {
        let html = math_fragment("E=mc^2", MathMode::Display, None);
        assert!(html.starts_with("<div class=\"math-block\""));
        assert!(html.contains("\\[\nE=mc^2\n\\]"));
    }

    #[test]
    fn test_renderer_output_used() {
        let html = math_fragment("x", MathMode::Inline, Some(&Upper));
        assert!(html.contains("<m>X</m>"));
    }

    #[test]
    fn test_render_failure_becomes_error_marker() {
        let html = math_fragment("\\bad x", MathMode::Display, Some(&Upper));
        assert!(html.contains("class=\"math-error\""));
        assert!(html.contains("undefined control sequence"));
        assert!(html.contains(&format!("{SOURCE_ATTR}=\"{}\"", encode_source("\\bad x"))));
    }

    #[test]
    fn test_not_ready_renderer_uses_placeholder() {
        let html = math_fragment("y", MathMode::Inline, Some(&Warming));
        assert!(html.contains(">$y$</span>"));
        assert!(!html.contains("math-error"));
    }

    proptest! {
        #[test]
        fn prop_source_round_trip(s in "\\PC*") {
            let encoded = encode_source(&s);
            prop_assert_eq!(decode_source(&encoded), s.as_str());
        }
    }
}
