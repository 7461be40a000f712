//! Markup to tree compiler pipeline.
//!
//! Markup is rewritten into an HTML fragment by the ordered stages in
//! [`FORWARD_STAGES`], then parsed with html5ever and transformed into the
//! [`Document`] tree. The same HTML to tree step serves the rendered surface
//! handed back by an editor ([`compile_html`]).
//!
//! # Example
//!
//! ```
//! use texbridge::compiler::compile_markup;
//! use texbridge::ir::Kind;
//!
//! let compiled = compile_markup("\\section{Intro}\n\nSome \\textbf{bold} text.");
//! assert!(compiled.html.starts_with("<h1>Intro</h1>"));
//!
//! let doc = &compiled.document;
//! let kinds: Vec<_> = doc.children(doc.root()).map(|id| doc.kind(id)).collect();
//! assert_eq!(kinds, vec![Kind::Heading(1), Kind::Paragraph]);
//! ```

mod body;
mod css;
mod stages;
mod transform;

pub use body::{extract_body, splice_body};
pub use css::parse_inline_style;
pub use stages::{FORWARD_STAGES, Stage, StageContext, VERB_DELIMITERS, run_stages};

use crate::ir::Document;
use crate::math::MathRenderer;

/// Output of one forward conversion.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// HTML fragment for the rendered surface.
    pub html: String,
    /// Tree built from that fragment.
    pub document: Document,
}

/// Compile markup without a math renderer (placeholder previews).
pub fn compile_markup(markup: &str) -> Compiled {
    compile_markup_with(markup, None)
}

/// Compile markup, rendering math previews with `renderer` when given.
///
/// Only the document body is converted when the markup carries a
/// `\begin{document}` envelope.
pub fn compile_markup_with(markup: &str, renderer: Option<&dyn MathRenderer>) -> Compiled {
    let body = extract_body(markup);
    let mut ctx = StageContext::new(body, renderer);
    let html = run_stages(body, &mut ctx);
    let document = compile_html(&html);

    log::debug!(
        "compiled {} bytes of markup: {} protected blocks, {} nodes",
        body.len(),
        ctx.blocks.len(),
        document.node_count()
    );

    Compiled { html, document }
}

/// Build the tree for an HTML document or fragment.
pub fn compile_html(html: &str) -> Document {
    transform::transform(&crate::dom::parse_html(html))
}

/// Escape `&`, `<`, `>` and `"` for HTML text and attribute values.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Color, Kind, resolve_style};
    use crate::math::{MathError, MathMode};

    struct Upper;

    impl MathRenderer for Upper {
        fn render(&self, expression: &str, _mode: MathMode) -> Result<String, MathError> {
            if expression.contains("bad") {
                return Err(MathError::Render {
                    expression: expression.to_string(),
                    message: "unknown command".to_string(),
                });
            }
            Ok(format!("<m>{}</m>", expression.to_uppercase()))
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a < b & \"c\" > d"), "a &lt; b &amp; &quot;c&quot; &gt; d");
    }

    #[test]
    fn test_compile_only_body() {
        let compiled = compile_markup(
            "\\documentclass{article}\n\\begin{document}\nHello\n\\end{document}",
        );
        assert_eq!(compiled.html, "<p>Hello</p>");
    }

    #[test]
    fn test_compile_escaped_characters() {
        let compiled = compile_markup("50\\% of \\$5 \\& a\\_b");
        assert_eq!(compiled.html, "<p>50% of $5 &amp; a_b</p>");

        let doc = &compiled.document;
        let para = doc.children(doc.root()).next().unwrap();
        assert_eq!(doc.text_content(para), "50% of $5 & a_b");
    }

    #[test]
    fn test_compile_with_renderer() {
        let renderer = Upper;
        let compiled = compile_markup_with("$x$ and $bad$", Some(&renderer));

        assert!(compiled.html.contains("<m>X</m>"));
        assert!(compiled.html.contains("class=\"math-error\""));

        let doc = &compiled.document;
        let math: Vec<_> = doc
            .iter_dfs()
            .filter(|&id| doc.kind(id) == Kind::MathInline)
            .map(|id| doc.attrs.math_source(id).unwrap().into_owned())
            .collect();
        assert_eq!(math, vec!["x".to_string(), "bad".to_string()]);
    }

    #[test]
    fn test_compiled_tree_resolves_colour() {
        let compiled = compile_markup("\\textcolor{red}{warm}");
        let doc = &compiled.document;
        let text = doc
            .iter_dfs()
            .find(|&id| doc.kind(id) == Kind::Text)
            .unwrap();
        assert_eq!(resolve_style(doc, text).color, Some(Color::rgb(255, 0, 0)));
    }
}
