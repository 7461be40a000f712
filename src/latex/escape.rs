//! Reversible escaping of LaTeX reserved characters.
//!
//! Both directions are single left-to-right scans, so an inserted escape
//! sequence is never rescanned: `\` becomes `\textbackslash{}` and the braces
//! it introduces are not escaped a second time.

/// Reserved characters and their markup-safe forms, backslash first.
const ESCAPES: [(char, &str); 10] = [
    ('\\', "\\textbackslash{}"),
    ('{', "\\{"),
    ('}', "\\}"),
    ('$', "\\$"),
    ('&', "\\&"),
    ('#', "\\#"),
    ('%', "\\%"),
    ('_', "\\_"),
    ('^', "\\textasciicircum{}"),
    ('~', "\\textasciitilde{}"),
];

/// Escape the ten reserved characters in plain text.
///
/// # Examples
///
/// ```
/// use texbridge::latex::escape;
///
/// assert_eq!(escape("50% of $5"), "50\\% of \\$5");
/// assert_eq!(escape("a\\b"), "a\\textbackslash{}b");
/// ```
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);

    for c in text.chars() {
        match ESCAPES.iter().find(|(reserved, _)| *reserved == c) {
            Some((_, escaped)) => result.push_str(escaped),
            None => result.push(c),
        }
    }

    result
}

/// Resolve escaped reserved characters back to literal text.
///
/// Backslashes that do not start a known escape sequence (for example an
/// unknown command) are kept as-is.
///
/// # Examples
///
/// ```
/// use texbridge::latex::unescape;
///
/// assert_eq!(unescape("\\$5"), "$5");
/// assert_eq!(unescape("\\textbf{x}"), "\\textbf{x}");
/// ```
pub fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = memchr::memchr(b'\\', rest.as_bytes()) {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match ESCAPES.iter().find(|(_, escaped)| tail.starts_with(escaped)) {
            Some((literal, escaped)) => {
                result.push(*literal);
                rest = &tail[escaped.len()..];
            }
            None => {
                result.push('\\');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    result
}
