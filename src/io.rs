//! Reading markup and HTML sources from disk.

use std::borrow::Cow;
use std::path::Path;

use memchr::memmem;

use crate::error::Result;

/// Read a source file, decoding it to text.
///
/// See [`decode_text`] for how the encoding is chosen.
pub fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let bytes = std::fs::read(path.as_ref())?;
    let hint = extract_inputenc(&bytes);
    Ok(decode_text(&bytes, hint).into_owned())
}

/// Decode bytes to a string.
///
/// 1. UTF-8 (a BOM is handled by `encoding_rs`)
/// 2. If malformed, the hint encoding (from `\usepackage[...]{inputenc}`)
/// 3. Windows-1252, a superset of ISO-8859-1
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(inputenc_label(name).as_bytes())
    {
        log::debug!("decoding source as {}", encoding.name());
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    log::debug!("source is not UTF-8, falling back to windows-1252");
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Map `inputenc` option names onto encoding labels.
fn inputenc_label(option: &str) -> &str {
    match option {
        "latin9" => "iso-8859-15",
        "ansinew" => "windows-1252",
        "applemac" => "macintosh",
        "utf8x" => "utf-8",
        other => other,
    }
}

/// Find the encoding option of `\usepackage[...]{inputenc}` in the preamble.
pub fn extract_inputenc(bytes: &[u8]) -> Option<&str> {
    let end = memmem::find(bytes, b"]{inputenc}")?;
    let start = memchr::memrchr(b'[', &bytes[..end])? + 1;
    let option = std::str::from_utf8(&bytes[start..end]).ok()?.trim();
    // With several options the last one names the encoding.
    option.rsplit(',').next().map(str::trim).filter(|o| !o.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("naïve".as_bytes(), None), "naïve");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        assert_eq!(decode_text(b"caf\xe9 \x93quoted\x94", None), "café \u{201c}quoted\u{201d}");
    }

    #[test]
    fn test_decode_uses_inputenc_hint() {
        // 0xA4 is the euro sign in Latin-9 but a currency sign in Latin-1.
        assert_eq!(decode_text(b"\xa4", Some("latin9")), "\u{20ac}");
    }

    #[test]
    fn test_extract_inputenc() {
        let source = b"\\documentclass{article}\n\\usepackage[latin1]{inputenc}\n";
        assert_eq!(extract_inputenc(source), Some("latin1"));
        assert_eq!(extract_inputenc(b"\\usepackage{xcolor}"), None);
    }
}
