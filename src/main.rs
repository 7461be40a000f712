//! texbridge - LaTeX subset <-> HTML converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use texbridge::Converter;
use texbridge::io::read_source;
use texbridge::ir::{Document, FontFamily, Kind, NodeId, StyleDescriptor, ToCss, resolve_style};

#[derive(Parser)]
#[command(name = "texbridge")]
#[command(version, about = "Convert between a LaTeX subset and HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    texbridge html notes.tex -o notes.html    Render markup to an HTML fragment
    texbridge tex notes.html                  Convert HTML back to markup
    texbridge tree notes.tex --json           Dump the document tree
    texbridge roundtrip notes.tex             Markup -> tree -> markup")]
struct Cli {
    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert markup to an HTML fragment
    Html {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Render math previews as MathML
        #[arg(long)]
        mathml: bool,
    },

    /// Convert HTML back to markup
    Tex {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Print the document tree built from markup
    Tree {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },

    /// Convert markup to a tree and back
    Roundtrip {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Html {
            input,
            output,
            mathml,
        } => {
            let converter = if mathml {
                mathml_converter()?
            } else {
                Converter::new()
            };
            let source = read(&input)?;
            let compiled = converter.compile_markup(&source);
            write(output.as_deref(), &compiled.html)
        }
        Command::Tex { input, output } => {
            let html = read(&input)?;
            let markup = Converter::new().html_to_markup(&html);
            write(output.as_deref(), &markup)
        }
        Command::Tree { input, json } => {
            let source = read(&input)?;
            let doc = Converter::new().compile_markup(&source).document;
            if json {
                let tree = tree_node(&doc, doc.root());
                let text = serde_json::to_string_pretty(&tree).map_err(|e| e.to_string())?;
                println!("{text}");
            } else {
                print_outline(&doc, doc.root(), 0);
            }
            Ok(())
        }
        Command::Roundtrip { input } => {
            let source = read(&input)?;
            let converter = Converter::new();
            let doc = converter.compile_markup(&source).document;
            println!("{}", converter.render_markup(&doc));
            Ok(())
        }
    }
}

#[cfg(feature = "mathml")]
fn mathml_converter() -> Result<Converter, String> {
    Ok(Converter::new().with_math(Box::new(texbridge::math::MathMlRenderer)))
}

#[cfg(not(feature = "mathml"))]
fn mathml_converter() -> Result<Converter, String> {
    Err("built without the `mathml` feature".to_string())
}

fn read(path: &Path) -> Result<String, String> {
    read_source(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn write(path: Option<&Path>, text: &str) -> Result<(), String> {
    match path {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| format!("{}: {e}", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Tree node as printed by `tree --json`.
#[derive(Serialize)]
struct TreeNode {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    math_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

fn tree_node(doc: &Document, id: NodeId) -> TreeNode {
    let kind = doc.kind(id);
    TreeNode {
        kind: kind.name(),
        level: match kind {
            Kind::Heading(level) => Some(level),
            _ => None,
        },
        text: (kind == Kind::Text).then(|| doc.text_content(id)),
        href: doc.attrs.href(id).map(str::to_string),
        src: doc.attrs.src(id).map(str::to_string),
        math_source: doc.attrs.math_source(id).map(|s| s.into_owned()),
        checked: (kind == Kind::CheckboxItem).then(|| doc.attrs.is_checked(id)),
        style: describe_style(&resolve_style(doc, id)),
        children: doc.children(id).map(|c| tree_node(doc, c)).collect(),
    }
}

fn describe_style(style: &StyleDescriptor) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(color) = style.color {
        parts.push(format!("color: {}", color.to_css_string()));
    }
    if let Some(background) = style.background_color {
        parts.push(format!("background: {}", background.to_css_string()));
    }
    if let Some(align) = style.text_align {
        parts.push(format!("align: {}", align.to_css_string()));
    }
    if style.font_family == FontFamily::Sans {
        parts.push("family: sans".to_string());
    }
    if let Some(size) = style.font_size_bucket() {
        parts.push(format!("size: {}", size.command()));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn print_outline(doc: &Document, id: NodeId, depth: usize) {
    let kind = doc.kind(id);
    let indent = "  ".repeat(depth);
    let mut line = match kind {
        Kind::Text => format!("{indent}{:?}", doc.text_content(id)),
        Kind::Heading(level) => format!("{indent}heading({level})"),
        _ => format!("{indent}{}", kind.name()),
    };
    if let Some(source) = doc.attrs.math_source(id) {
        line.push_str(&format!(" source={source:?}"));
    }
    if let Some(href) = doc.attrs.href(id) {
        line.push_str(&format!(" href={href:?}"));
    }
    if kind != Kind::Text
        && let Some(style) = describe_style(&resolve_style(doc, id))
    {
        line.push_str(&format!(" [{style}]"));
    }
    println!("{line}");

    for child in doc.children(id) {
        print_outline(doc, child, depth + 1);
    }
}
