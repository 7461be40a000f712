//! Ordered rewrite stages from markup to an HTML fragment.
//!
//! Each stage is a pure function over the whole text. Opaque regions are
//! rendered and protected first so no later stage can corrupt them; generic
//! formatting runs on what is left; protected content comes back last.
//!
//! Command arguments may not contain unescaped brace groups. Commands nested
//! inside arguments are resolved innermost first by repeating the inline
//! rules until nothing changes; anything still unmatched stays literal.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ir::{Color, FontSize, Length, ToCss};
use crate::latex::unescape;
use crate::math::{MathMode, MathRenderer, math_fragment};
use crate::protect::ProtectedBlocks;

use super::html_escape;

/// A command argument: escaped braces and `\name{}` escapes are allowed,
/// unescaped brace groups are not.
const ARG: &str = r"((?:\\[{}]|\\[A-Za-z]+\{\}|[^{}])*)";

const SIZES: &str = "tiny|scriptsize|footnotesize|small|normalsize|large|Large|LARGE|huge|Huge";

/// Inline-code delimiters accepted by `\verb`.
pub const VERB_DELIMITERS: [char; 5] = ['|', '+', '!', '@', '#'];

static VERBATIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{verbatim\}(.*?)\\end\{verbatim\}").unwrap());

static CHECKLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{itemize\}(\s*\\item\s*\[\$\\(?:square|boxtimes)\$\].*?)\\end\{itemize\}")
        .unwrap()
});

static BRACKET_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").unwrap());

static DOLLAR_DISPLAY_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

/// Escaped characters (`\$` included) belong to the expression.
static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$((?:\\.|[^$\\])+?)\$").unwrap());

static VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\verb(?:\|([^|\n]*)\||\+([^+\n]*)\+|!([^!\n]*)!|@([^@\n]*)@|#([^#\n]*)#)")
        .unwrap()
});

static TEXTTT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\texttt\{{{ARG}\}}")).unwrap());

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\includegraphics(?:\[([^\]]*)\])?\{([^}]*)\}").unwrap()
});

static IMAGE_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"width\s*=\s*([0-9]*\.?[0-9]*)\s*\\(?:textwidth|linewidth)").unwrap()
});

static INLINE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\\(textbf|textit|emph|underline|textsf)\{{{ARG}\}}")).unwrap()
});

static COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\\(textcolor|colorbox)(\[HTML\])?\{{([A-Za-z0-9]+)\}}\{{{ARG}\}}"
    ))
    .unwrap()
});

/// A size declaration; trailing blanks belong to the command.
static SIZE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\({SIZES})\b[ \t]*")).unwrap());

/// Text ending in the first argument of a two-argument command.
static FIRST_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\(?:textcolor|colorbox)(?:\[HTML\])?\{[A-Za-z0-9]*\}|\\href\{(?:\\[{}]|[^{}])*\})$")
        .unwrap()
});

static SIZE_ARGUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\({SIZES})\{{{ARG}\}}")).unwrap());

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\href\{{{ARG}\}}\{{{ARG}\}}")).unwrap());

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\\url\{{{ARG}\}}")).unwrap());

static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\\(section|subsection|subsubsection|paragraph)\*?\{{{ARG}\}}"
    ))
    .unwrap()
});

static ALIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\\begin\{(center|flushright|flushleft)\}(.*?)\\end\{(center|flushright|flushleft)\}",
    )
    .unwrap()
});

static LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{(itemize|enumerate)\}(.*?)\\end\{(itemize|enumerate)\}").unwrap()
});

static ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\item\b").unwrap());

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)*").unwrap());

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:h[1-6]|div|ul|ol|li|pre|p|blockquote)\b").unwrap()
});

static HARD_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\\\*?(?:\[[^\]\n]*\])?|\\newline\b").unwrap());

/// Call-scoped state shared by the stages of one conversion.
pub struct StageContext<'r> {
    /// Opaque regions held back from later stages.
    pub blocks: ProtectedBlocks,
    renderer: Option<&'r dyn MathRenderer>,
}

impl<'r> StageContext<'r> {
    /// Create a context for converting `source`.
    pub fn new(source: &str, renderer: Option<&'r dyn MathRenderer>) -> Self {
        Self {
            blocks: ProtectedBlocks::for_source(source),
            renderer,
        }
    }

    /// The math capability, if one is configured.
    pub fn renderer(&self) -> Option<&'r dyn MathRenderer> {
        self.renderer
    }
}

/// A named forward stage.
#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub run: fn(&str, &mut StageContext<'_>) -> String,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Stage").field(&self.name).finish()
    }
}

/// The forward pipeline, in execution order.
///
/// Everything up to `html_escape` protects regions; the order among those
/// is part of the contract (a checklist's `$\square$` marker must be gone
/// before math detection runs).
pub const FORWARD_STAGES: &[Stage] = &[
    Stage { name: "verbatim", run: verbatim },
    Stage { name: "checklists", run: checklists },
    Stage { name: "display_math", run: display_math },
    Stage { name: "inline_math", run: inline_math },
    Stage { name: "inline_code", run: inline_code },
    Stage { name: "html_escape", run: escape_html },
    Stage { name: "images", run: images },
    Stage { name: "size_scopes", run: size_scopes },
    Stage { name: "inline", run: inline },
    Stage { name: "sections", run: sections },
    Stage { name: "lists", run: lists },
    Stage { name: "alignment", run: alignment },
    Stage { name: "paragraphs", run: paragraphs },
    Stage { name: "line_breaks", run: line_breaks },
    Stage { name: "unescape", run: unescape_text },
    Stage { name: "restore", run: restore },
];

/// Run every stage in order.
pub fn run_stages(text: &str, ctx: &mut StageContext<'_>) -> String {
    FORWARD_STAGES.iter().fold(text.to_string(), |acc, stage| {
        let out = (stage.run)(&acc, ctx);
        log::trace!("stage {}: {} -> {} bytes", stage.name, acc.len(), out.len());
        out
    })
}

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn verbatim(text: &str, ctx: &mut StageContext<'_>) -> String {
    VERBATIM
        .replace_all(text, |caps: &Captures| {
            let body = group(caps, 1);
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            let body = body
                .strip_suffix("\r\n")
                .or_else(|| body.strip_suffix('\n'))
                .unwrap_or(body);
            ctx.blocks
                .protect(format!("<pre><code>{}</code></pre>", html_escape(body)))
        })
        .into_owned()
}

fn checklists(text: &str, ctx: &mut StageContext<'_>) -> String {
    CHECKLIST
        .replace_all(text, |caps: &Captures| {
            let mut html = String::from("<ul class=\"checklist\">");
            for item in ITEM.split(group(caps, 1)).skip(1) {
                let item = item.trim_start();
                let (checked, rest) = if let Some(rest) = item.strip_prefix("[$\\boxtimes$]") {
                    (true, rest)
                } else if let Some(rest) = item.strip_prefix("[$\\square$]") {
                    (false, rest)
                } else {
                    (false, item)
                };
                let content = rest.trim();
                if content.is_empty() && rest.len() == item.len() {
                    continue;
                }
                let input = if checked {
                    "<input type=\"checkbox\" checked disabled>"
                } else {
                    "<input type=\"checkbox\" disabled>"
                };
                html.push_str("<li>");
                html.push_str(input);
                if !content.is_empty() {
                    html.push(' ');
                    html.push_str(&html_escape(&unescape(content)));
                }
                html.push_str("</li>");
            }
            html.push_str("</ul>");
            ctx.blocks.protect(html)
        })
        .into_owned()
}

fn protect_math(
    regex: &Regex,
    text: &str,
    mode: MathMode,
    ctx: &mut StageContext<'_>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;

    while let Some(caps) = regex.captures_at(text, search) {
        let Some(m) = caps.get(0) else {
            break;
        };
        if is_escaped(text, m.start()) {
            // Delimiters are ASCII, so the next byte is a char boundary.
            search = m.start() + 1;
            continue;
        }

        out.push_str(&text[last..m.start()]);
        let fragment = math_fragment(group(&caps, 1), mode, ctx.renderer());
        out.push_str(&ctx.blocks.protect(fragment));
        last = m.end();
        search = last;
    }

    out.push_str(&text[last..]);
    out
}

/// Whether the character at `pos` follows an odd run of backslashes.
///
/// `\\` is a line break, so `\\$x$` still opens math.
fn is_escaped(text: &str, pos: usize) -> bool {
    text.as_bytes()[..pos]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

fn display_math(text: &str, ctx: &mut StageContext<'_>) -> String {
    let text = protect_math(&BRACKET_MATH, text, MathMode::Display, ctx);
    protect_math(&DOLLAR_DISPLAY_MATH, &text, MathMode::Display, ctx)
}

fn inline_math(text: &str, ctx: &mut StageContext<'_>) -> String {
    protect_math(&INLINE_MATH, text, MathMode::Inline, ctx)
}

fn inline_code(text: &str, ctx: &mut StageContext<'_>) -> String {
    let text = VERB.replace_all(text, |caps: &Captures| {
        let raw = (1..=VERB_DELIMITERS.len())
            .find_map(|i| caps.get(i))
            .map_or("", |m| m.as_str());
        ctx.blocks
            .protect(format!("<code>{}</code>", html_escape(raw)))
    });
    TEXTTT
        .replace_all(&text, |caps: &Captures| {
            let content = unescape(group(caps, 1));
            ctx.blocks
                .protect(format!("<code>{}</code>", html_escape(&content)))
        })
        .into_owned()
}

fn escape_html(text: &str, _ctx: &mut StageContext<'_>) -> String {
    html_escape(text)
}

fn images(text: &str, _ctx: &mut StageContext<'_>) -> String {
    IMAGE
        .replace_all(text, |caps: &Captures| {
            let options = group(caps, 1);
            let style = match IMAGE_WIDTH.captures(options) {
                Some(width) => {
                    let factor = group(&width, 1).parse::<f32>().unwrap_or(1.0);
                    format!("width: {}%", (factor * 100.0).round())
                }
                None => "max-width: 100%".to_string(),
            };
            format!("<img src=\"{}\" style=\"{style}\">", group(caps, 2))
        })
        .into_owned()
}

fn color_span(caps: &Captures) -> Option<String> {
    let value = group(caps, 3);
    let color = if caps.get(2).is_some() {
        Color::from_hex(value)?
    } else {
        Color::from_name(value)?
    };
    let property = match group(caps, 1) {
        "colorbox" => "background-color",
        _ => "color",
    };
    Some(format!(
        "<span style=\"{property}: {}\">{}</span>",
        color.to_css_string(),
        group(caps, 4)
    ))
}

fn size_span(command: &str, content: &str) -> String {
    let points = FontSize::from_command(command).map_or(10.0, FontSize::points);
    format!(
        "<span style=\"font-size: {}\">{content}</span>",
        Length::Pt(points).to_css_string()
    )
}

/// One sweep of every inline rule.
fn inline_sweep(text: &str) -> String {
    let text = INLINE_STYLE.replace_all(text, |caps: &Captures| {
        let content = group(caps, 2);
        match group(caps, 1) {
            "textbf" => format!("<b>{content}</b>"),
            "textit" | "emph" => format!("<i>{content}</i>"),
            "underline" => format!("<u>{content}</u>"),
            _ => format!(
                "<span class=\"sans\" style=\"font-family: sans-serif\">{content}</span>"
            ),
        }
    });

    let text = COLOR.replace_all(&text, |caps: &Captures| {
        color_span(caps).unwrap_or_else(|| group(caps, 0).to_string())
    });

    let text = HREF.replace_all(&text, |caps: &Captures| {
        format!("<a href=\"{}\">{}</a>", group(caps, 1), group(caps, 2))
    });
    let text = URL.replace_all(&text, |caps: &Captures| {
        let url = group(caps, 1);
        format!("<a href=\"{url}\">{url}</a>")
    });

    SIZE_ARGUMENT
        .replace_all(&text, |caps: &Captures| {
            size_span(group(caps, 1), group(caps, 2))
        })
        .into_owned()
}

/// Length of a bare declaration's scope: up to the end of the line or the
/// brace closing the enclosing group.
fn scope_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' if depth == 0 => return i,
            b'}' => depth -= 1,
            b'\n' if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Whether a brace following `before` opens a command argument rather than a group.
fn is_argument_brace(before: &str) -> bool {
    let stem = before.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if stem.len() < before.len() {
        return stem.ends_with('\\');
    }
    before.ends_with('}') && FIRST_ARGUMENT.is_match(before)
}

/// Rewrite size declarations into argument form.
///
/// Both `{\large text}` and a bare `\large text` become `\large{text}`. A
/// bare declaration's scope runs to the end of its line or enclosing group.
fn scope_declarations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;

    while let Some(caps) = SIZE_COMMAND.captures_at(text, search) {
        let Some(m) = caps.get(0) else {
            break;
        };
        let before = &text[..m.start()];
        let rest = &text[m.end()..];
        let name_end = caps.get(1).map_or(m.end(), |name| name.end());
        if before.ends_with('\\') || text[name_end..].starts_with('{') {
            search = m.end();
            continue;
        }

        let end = m.end() + scope_len(rest);
        let grouped = before
            .strip_suffix('{')
            .is_some_and(|outer| !is_argument_brace(outer))
            && text[end..].starts_with('}');

        if grouped {
            out.push_str(&text[last..m.start() - 1]);
        } else {
            out.push_str(&text[last..m.start()]);
        }
        out.push('\\');
        out.push_str(group(&caps, 1));
        out.push('{');
        out.push_str(&scope_declarations(&text[m.end()..end]));
        out.push('}');

        last = if grouped { end + 1 } else { end };
        search = last;
    }

    out.push_str(&text[last..]);
    out
}

fn size_scopes(text: &str, _ctx: &mut StageContext<'_>) -> String {
    scope_declarations(text)
}

fn inline(text: &str, _ctx: &mut StageContext<'_>) -> String {
    let mut current = text.to_string();
    loop {
        let next = inline_sweep(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sections(text: &str, _ctx: &mut StageContext<'_>) -> String {
    SECTION
        .replace_all(text, |caps: &Captures| {
            let level = match group(caps, 1) {
                "section" => 1,
                "subsection" => 2,
                "subsubsection" => 3,
                _ => 4,
            };
            format!("<h{level}>{}</h{level}>", group(caps, 2).trim())
        })
        .into_owned()
}

fn lists(text: &str, _ctx: &mut StageContext<'_>) -> String {
    LIST.replace_all(text, |caps: &Captures| {
        let env = group(caps, 1);
        if env != group(caps, 3) {
            return group(caps, 0).to_string();
        }
        let tag = if env == "enumerate" { "ol" } else { "ul" };

        let mut html = format!("<{tag}>");
        for item in ITEM.split(group(caps, 2)).skip(1) {
            let item = item.trim();
            if !item.is_empty() {
                html.push_str(&format!("<li>{item}</li>"));
            }
        }
        html.push_str(&format!("</{tag}>"));
        html
    })
    .into_owned()
}

fn alignment(text: &str, _ctx: &mut StageContext<'_>) -> String {
    ALIGNMENT
        .replace_all(text, |caps: &Captures| {
            let env = group(caps, 1);
            if env != group(caps, 3) {
                return group(caps, 0).to_string();
            }
            let align = match env {
                "center" => "center",
                "flushright" => "right",
                _ => "left",
            };
            format!(
                "<div style=\"text-align: {align}\">{}</div>",
                group(caps, 2)
            )
        })
        .into_owned()
}

fn paragraphs(text: &str, ctx: &mut StageContext<'_>) -> String {
    let is_block_content = |content: &str| {
        ["<pre", "<ul", "<ol", "<div"]
            .iter()
            .any(|tag| content.starts_with(tag))
    };

    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let has_block = BLOCK_TAG.is_match(chunk)
                || ctx
                    .blocks
                    .blocks_in(chunk)
                    .iter()
                    .any(|b| is_block_content(&b.content));
            if has_block {
                chunk.to_string()
            } else {
                format!("<p>{chunk}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_breaks(text: &str, _ctx: &mut StageContext<'_>) -> String {
    HARD_BREAK
        .replace_all(text, "<br>")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

fn unescape_text(text: &str, _ctx: &mut StageContext<'_>) -> String {
    unescape(text)
}

fn restore(text: &str, ctx: &mut StageContext<'_>) -> String {
    let restored = ctx.blocks.restore_all(text);
    if ctx.blocks.contains_token(&restored) {
        log::warn!("protected block placeholder left in output");
    }
    restored
}
