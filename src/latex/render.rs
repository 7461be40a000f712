//! Document tree → markup rendering.
//!
//! Pure string rendering: each node renders to a string given its parent's
//! resolved style and the style the surrounding markup already expresses.
//! A style command is only emitted where the two differ, so an inherited
//! colour is written once at the node that sets it.

use std::sync::LazyLock;

use regex::Regex;

use crate::compiler::VERB_DELIMITERS;
use crate::ir::{Color, Document, FontFamily, FontSize, Kind, NodeId, StyleDescriptor};
use crate::math::MathMode;

use super::escape::escape;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Render a document tree to markup.
///
/// # Examples
///
/// ```
/// use texbridge::compiler::compile_html;
/// use texbridge::latex::render_markup;
///
/// let doc = compile_html("<h1>Demo</h1><p>Some <b>bold</b> text.</p>");
/// assert_eq!(render_markup(&doc), "\\section{Demo}\n\nSome \\textbf{bold} text.");
/// ```
pub fn render_markup(doc: &Document) -> String {
    RenderContext::new(doc).render()
}

/// Style commands wrapping one node, listed outermost first.
#[derive(Debug, Default)]
struct Wrappers {
    background: Option<Color>,
    color: Option<Color>,
    sans: bool,
    size: Option<FontSize>,
}

impl Wrappers {
    /// Decide which commands `resolved` needs on top of `emitted`, and the
    /// style expressed inside them.
    ///
    /// Default black is normally left implicit. It is still written when it
    /// overrides a non-black inherited colour; otherwise the inner text would
    /// pick up the outer colour on the next conversion.
    fn plan(
        resolved: &StyleDescriptor,
        emitted: &StyleDescriptor,
        kind: Kind,
    ) -> (Self, StyleDescriptor) {
        let mut inner = emitted.clone();

        // Black only needs saying when it overrides another colour.
        let overrides_color = emitted.color.is_some_and(|c| !c.is_default_text());
        let color = resolved.color.filter(|c| {
            Some(*c) != emitted.color
                && !c.is_transparent()
                && (!c.is_default_text() || overrides_color)
        });
        if color.is_some() {
            inner.color = color;
        }

        let background = resolved.background_color.filter(|c| !c.is_transparent());

        let is_sans = resolved.font_family == FontFamily::Sans;
        let sans = is_sans && emitted.font_family != FontFamily::Sans && kind != Kind::Sans;
        if is_sans {
            inner.font_family = FontFamily::Sans;
        }

        let bucket = resolved.font_size_bucket().unwrap_or(FontSize::NormalSize);
        let current = emitted.font_size_bucket().unwrap_or(FontSize::NormalSize);
        let size = (bucket != current).then_some(bucket);
        inner.font_size = resolved.font_size;

        (
            Self {
                background,
                color,
                sans,
                size,
            },
            inner,
        )
    }

    /// Wrap `content`. A size declaration has no closing counterpart, so it
    /// gets its own group unless something already bounds it.
    fn apply(&self, content: String, bounded: bool) -> String {
        let enclosed = bounded || self.sans || self.color.is_some() || self.background.is_some();

        let mut out = content;
        if let Some(size) = self.size {
            out = if enclosed {
                format!("\\{} {out}", size.command())
            } else {
                format!("{{\\{} {out}}}", size.command())
            };
        }
        if self.sans {
            out = format!("\\textsf{{{out}}}");
        }
        if let Some(color) = self.color {
            out = format!("\\textcolor{}{{{out}}}", color_argument(color));
        }
        if let Some(background) = self.background {
            out = format!("\\colorbox{}{{{out}}}", color_argument(background));
        }
        out
    }
}

/// `{name}` for a named colour, `[HTML]{RRGGBB}` otherwise.
fn color_argument(color: Color) -> String {
    match color.name() {
        Some(name) => format!("{{{name}}}"),
        None => format!("[HTML]{{{}}}", color.to_hex()),
    }
}

fn heading_command(level: u8) -> &'static str {
    match level {
        1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        _ => "paragraph",
    }
}

/// Pad a block with blank lines.
fn block(core: &str) -> String {
    format!("\n\n{core}\n\n")
}

fn with_environment(core: String, environment: Option<&str>) -> String {
    match environment {
        Some(env) => format!("\\begin{{{env}}}\n{core}\n\\end{{{env}}}"),
        None => core,
    }
}

/// Collapse each whitespace run to one space, keeping edge spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Inline code as `\verb`, or `\texttt` when no delimiter fits or the
/// content would be mistaken for math.
fn inline_code(content: &str) -> String {
    let verb_safe = !content.contains(['$', '\n']) && !content.contains("\\[");
    match VERB_DELIMITERS.iter().find(|d| !content.contains(**d)) {
        Some(delim) if verb_safe => format!("\\verb{delim}{content}{delim}"),
        _ => format!("\\texttt{{{}}}", escape(content)),
    }
}

struct RenderContext<'a> {
    doc: &'a Document,
}

impl<'a> RenderContext<'a> {
    fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    fn render(self) -> String {
        let base = StyleDescriptor::default();
        let body = self.render_children(self.doc.root(), &base, &base);
        BLANK_RUNS.replace_all(&body, "\n\n").trim().to_string()
    }

    fn render_children(
        &self,
        id: NodeId,
        resolved: &StyleDescriptor,
        emitted: &StyleDescriptor,
    ) -> String {
        let mut out = String::new();
        let mut after_block = false;
        for child in self.doc.children(id) {
            let rendered = self.render_node(child, resolved, emitted);
            let is_block = self.doc.kind(child).is_block();
            // Spaces next to a block boundary are layout, not content.
            if is_block {
                out.truncate(out.trim_end_matches(' ').len());
            }
            if after_block {
                out.push_str(rendered.trim_start_matches(' '));
            } else {
                out.push_str(&rendered);
            }
            after_block = is_block;
        }
        out
    }

    /// Alignment environment needed on top of `emitted`.
    fn alignment(
        resolved: &StyleDescriptor,
        emitted: &StyleDescriptor,
    ) -> (Option<&'static str>, StyleDescriptor) {
        let mut inner = emitted.clone();
        let environment = resolved
            .text_align
            .filter(|_| resolved.text_align != emitted.text_align)
            .and_then(|align| align.environment());
        if environment.is_some() {
            inner.text_align = resolved.text_align;
        }
        (environment, inner)
    }

    fn render_node(&self, id: NodeId, parent: &StyleDescriptor, emitted: &StyleDescriptor) -> String {
        let doc = self.doc;
        let kind = doc.kind(id);
        let resolved = StyleDescriptor::cascade(parent, doc.declared_style(id), kind);

        match kind {
            Kind::Break => String::new(),
            Kind::Root => self.render_children(id, &resolved, emitted),

            Kind::CodeBlock => block(&format!(
                "\\begin{{verbatim}}\n{}\n\\end{{verbatim}}",
                doc.text_content(id)
            )),
            Kind::MathBlock => block(&self.math(id, MathMode::Display)),

            // Block containers only carry alignment; inline styles are left
            // for their children so no command spans several paragraphs.
            Kind::Container | Kind::UnorderedList | Kind::OrderedList => {
                let (environment, inner) = Self::alignment(&resolved, emitted);
                let content = self.render_children(id, &resolved, &inner);
                let core = match kind {
                    Kind::UnorderedList => format!("\\begin{{itemize}}\n{content}\\end{{itemize}}"),
                    Kind::OrderedList => {
                        format!("\\begin{{enumerate}}\n{content}\\end{{enumerate}}")
                    }
                    _ => content.trim().to_string(),
                };
                block(&with_environment(core, environment))
            }

            Kind::Paragraph | Kind::Heading(_) => {
                let (environment, aligned) = Self::alignment(&resolved, emitted);
                let (wrappers, inner) = Wrappers::plan(&resolved, &aligned, kind);
                let content = self.render_children(id, &resolved, &inner);
                let content = content.trim().to_string();
                let core = match kind {
                    Kind::Heading(level) => format!(
                        "\\{}{{{}}}",
                        heading_command(level),
                        wrappers.apply(content, true)
                    ),
                    _ => wrappers.apply(content, false),
                };
                block(&with_environment(core, environment))
            }

            Kind::ListItem | Kind::CheckboxItem => {
                let (wrappers, inner) = Wrappers::plan(&resolved, emitted, kind);
                let content = self.render_children(id, &resolved, &inner);
                let marker = match kind {
                    Kind::CheckboxItem if doc.attrs.is_checked(id) => "\\item[$\\boxtimes$] ",
                    Kind::CheckboxItem => "\\item[$\\square$] ",
                    _ => "\\item ",
                };
                format!("{marker}{}\n", wrappers.apply(content.trim().to_string(), true))
            }

            _ => {
                let (wrappers, inner) = Wrappers::plan(&resolved, emitted, kind);
                let core = self.render_inline(id, kind, &resolved, &inner);
                wrappers.apply(core, false)
            }
        }
    }

    fn render_inline(
        &self,
        id: NodeId,
        kind: Kind,
        resolved: &StyleDescriptor,
        emitted: &StyleDescriptor,
    ) -> String {
        let doc = self.doc;
        match kind {
            Kind::Text => {
                let text = doc.node(id).map_or("", |node| doc.text(node.text));
                escape(&collapse_whitespace(text))
            }
            Kind::MathInline => self.math(id, MathMode::Inline),
            Kind::InlineCode => inline_code(&doc.text_content(id)),
            Kind::Image => match doc.attrs.src(id) {
                Some(src) => format!("\\includegraphics[width=\\textwidth]{{{src}}}"),
                None => String::new(),
            },
            Kind::Anchor => {
                let content = self.render_children(id, resolved, emitted);
                match doc.attrs.href(id) {
                    Some(href) => {
                        let target = escape(href);
                        if content == target {
                            format!("\\url{{{target}}}")
                        } else {
                            format!("\\href{{{target}}}{{{content}}}")
                        }
                    }
                    None => content,
                }
            }
            _ => {
                let content = self.render_children(id, resolved, emitted);
                match kind {
                    Kind::Bold => format!("\\textbf{{{content}}}"),
                    Kind::Italic => format!("\\textit{{{content}}}"),
                    Kind::Underline => format!("\\underline{{{content}}}"),
                    Kind::Sans => format!("\\textsf{{{content}}}"),
                    _ => content,
                }
            }
        }
    }

    /// Math is emitted from its canonical source; the preview is never read.
    fn math(&self, id: NodeId, mode: MathMode) -> String {
        let source = match self.doc.attrs.math_source(id) {
            Some(source) => source.into_owned(),
            None => self.doc.text_content(id),
        };
        mode.delimit(&source)
    }
}
