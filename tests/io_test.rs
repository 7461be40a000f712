//! Reading source files in legacy encodings.

use std::io::Write;

use tempfile::NamedTempFile;
use texbridge::io::read_source;

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_utf8_source() {
    let file = write_temp("\\section{Café}".as_bytes());
    assert_eq!(read_source(file.path()).unwrap(), "\\section{Café}");
}

#[test]
fn test_windows_1252_fallback() {
    let file = write_temp(b"\\section{Caf\xe9} costs \x80 5");
    assert_eq!(read_source(file.path()).unwrap(), "\\section{Café} costs € 5");
}

#[test]
fn test_inputenc_hint_wins_over_fallback() {
    let file = write_temp(
        b"\\usepackage[latin9]{inputenc}\n\\begin{document}\n\\section{Caf\xe9} \xa4\n\\end{document}\n",
    );
    let source = read_source(file.path()).unwrap();
    assert!(source.contains("\\section{Café} €"));

    let compiled = texbridge::compile_markup(&source);
    assert!(compiled.html.starts_with("<h1>Café</h1>"));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_source(dir.path().join("absent.tex")).unwrap_err();
    assert!(matches!(err, texbridge::Error::Io(_)));
}
