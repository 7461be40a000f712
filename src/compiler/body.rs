//! Locating the document body inside a full source file.

use memchr::memmem;

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

/// Byte range of the body, or `None` when the source has no envelope.
fn body_range(source: &str) -> Option<(usize, usize)> {
    let start = memmem::find(source.as_bytes(), BEGIN_DOCUMENT.as_bytes())? + BEGIN_DOCUMENT.len();
    let end = memmem::find(&source.as_bytes()[start..], END_DOCUMENT.as_bytes())
        .map_or(source.len(), |offset| start + offset);
    Some((start, end))
}

/// Return the text between `\begin{document}` and `\end{document}`.
///
/// Without a `\begin{document}` the whole source is the body. A missing
/// `\end{document}` extends the body to the end of the text.
///
/// # Examples
///
/// ```
/// use texbridge::compiler::extract_body;
///
/// let source = "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}\n";
/// assert_eq!(extract_body(source), "\nHi\n");
/// assert_eq!(extract_body("just text"), "just text");
/// ```
pub fn extract_body(source: &str) -> &str {
    match body_range(source) {
        Some((start, end)) => &source[start..end],
        None => source,
    }
}

/// Replace the body of `source` with `body`, keeping preamble and trailer.
///
/// When `source` has no envelope the result is `body` itself.
pub fn splice_body(source: &str, body: &str) -> String {
    let Some((start, end)) = body_range(source) else {
        return body.to_string();
    };

    let body = body.trim_matches('\n');
    let trailer = &source[end..];
    let mut result = String::with_capacity(start + body.len() + trailer.len() + 2);
    result.push_str(&source[..start]);
    result.push('\n');
    result.push_str(body);
    result.push('\n');
    result.push_str(trailer);
    result
}
