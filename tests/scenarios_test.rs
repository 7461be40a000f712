//! End-to-end conversion scenarios in both directions.

use texbridge::ir::{Document, FontSize, Kind, NodeId};
use texbridge::{compile_markup, html_to_markup, render_markup};

fn nodes_of(doc: &Document, kind: Kind) -> Vec<NodeId> {
    doc.iter_dfs().filter(|&id| doc.kind(id) == kind).collect()
}

#[test]
fn test_section_heading() {
    let compiled = compile_markup("\\section{Demo}");
    let doc = &compiled.document;

    let headings = nodes_of(doc, Kind::Heading(1));
    assert_eq!(headings.len(), 1);
    assert_eq!(doc.text_content(headings[0]), "Demo");
    assert_eq!(render_markup(doc), "\\section{Demo}");
}

#[test]
fn test_display_math_keeps_source() {
    let compiled = compile_markup("\\[E=mc^2\\]");
    let doc = &compiled.document;

    let blocks = nodes_of(doc, Kind::MathBlock);
    assert_eq!(blocks.len(), 1);
    assert_eq!(doc.attrs.math_source(blocks[0]).as_deref(), Some("E=mc^2"));
    assert_eq!(render_markup(doc), "\\[\nE=mc^2\n\\]");
}

#[test]
fn test_checkbox_list() {
    let compiled = compile_markup(
        "\\begin{itemize}\\item[$\\square$]Task1\\item[$\\square$]Task2\\end{itemize}",
    );
    let doc = &compiled.document;

    assert_eq!(compiled.html.matches("<input type=\"checkbox\" disabled>").count(), 2);
    assert!(!compiled.html.contains("math-inline"));

    let items = nodes_of(doc, Kind::CheckboxItem);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|&id| !doc.attrs.is_checked(id)));
    assert_eq!(doc.text_content(items[1]).trim(), "Task2");

    assert_eq!(
        render_markup(doc),
        "\\begin{itemize}\n\\item[$\\square$] Task1\n\\item[$\\square$] Task2\n\\end{itemize}"
    );
}

#[test]
fn test_escaped_dollar() {
    assert_eq!(texbridge::latex::unescape("\\$5"), "$5");

    let compiled = compile_markup("costs \\$5");
    assert!(nodes_of(&compiled.document, Kind::MathInline).is_empty());
    assert_eq!(compiled.document.text_content(NodeId::ROOT), "costs $5");
}

#[test]
fn test_transparent_background_not_emitted() {
    assert_eq!(
        html_to_markup("<p><span style=\"background-color: rgba(0,0,0,0)\">plain</span></p>"),
        "plain"
    );
    assert_eq!(
        html_to_markup("<p><span style=\"background-color: transparent; color: inherit\">x</span></p>"),
        "x"
    );
}

#[test]
fn test_blank_lines_collapse_to_one() {
    let markup = html_to_markup("<p>a</p><div></div><div> </div><p></p><p>b</p>");
    assert_eq!(markup, "a\n\nb");
    assert!(!markup.contains("\n\n\n"));
}

#[test]
fn test_font_size_buckets_through_pipeline() {
    for size in FontSize::ALL {
        let markup = format!("\\{}{{x}}", size.command());
        let back = render_markup(&compile_markup(&markup).document);

        let expected = if size == FontSize::NormalSize {
            "x".to_string()
        } else {
            format!("{{\\{} x}}", size.command())
        };
        assert_eq!(back, expected, "bucket {}", size.command());
    }
}

#[test]
fn test_font_size_boundaries() {
    let expected = [
        (6.0, "tiny"),
        (7.0, "scriptsize"),
        (8.0, "footnotesize"),
        (9.0, "small"),
        (10.0, "normalsize"),
        (12.0, "large"),
        (14.0, "Large"),
        (17.0, "LARGE"),
        (20.0, "huge"),
        (24.0, "Huge"),
    ];
    for (size, command) in expected {
        assert_eq!(FontSize::from_size(size).command(), command, "size {size}");
    }
    assert_eq!(FontSize::from_size(13.0).command(), "large");
    assert_eq!(FontSize::from_size(11.5).command(), "normalsize");
    assert_eq!(FontSize::from_size(40.0).command(), "Huge");
}

#[test]
fn test_pixel_sizes_from_rendered_surface() {
    assert_eq!(
        html_to_markup("<p><span style=\"font-size: 18px\">big</span> normal</p>"),
        "{\\LARGE big} normal"
    );
}

#[test]
fn test_unknown_commands_stay_literal() {
    let compiled = compile_markup("\\begin{center}x\\end{flushright} and \\foo{bar}");
    assert_eq!(
        compiled.html,
        "<p>\\begin{center}x\\end{flushright} and \\foo{bar}</p>"
    );
}

#[test]
fn test_no_placeholder_leaks() {
    let compiled = compile_markup(
        "$a$ \\verb|b| \\[c\\]\n\n\\begin{verbatim}\nd\n\\end{verbatim}\n\n\\begin{itemize}\\item[$\\square$] e\\end{itemize}",
    );
    assert!(!compiled.html.contains("PROTECTED_BLOCK"));
}

#[test]
fn test_literal_placeholder_text_survives() {
    let compiled = compile_markup("\\_\\_PROTECTED\\_BLOCK\\_0\\_\\_ and $x$");
    assert!(compiled.html.contains("__PROTECTED_BLOCK_0__ and "));
    assert!(compiled.html.contains("data-source=\"x\""));
}
