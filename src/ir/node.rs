//! Tree node types and kinds.

use super::style::StyleId;

/// Unique identifier for a node within a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node ID (always 0).
    pub const ROOT: NodeId = NodeId(0);
}

/// What a node is, independent of the element it was built from.
///
/// Visual styling (colour, alignment, family, size) is declared separately
/// through the node's [`StyleId`]; link targets, image sources and math
/// sources live in [`AttributeMap`](super::AttributeMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    /// Leaf text content. References a range in the document's text buffer.
    #[default]
    Text,
    /// Document root.
    Root,
    /// Section heading, level 1-4.
    Heading(u8),
    Bold,
    Italic,
    Underline,
    /// Sans-serif span.
    Sans,
    /// Hyperlink. Target in the attribute map.
    Anchor,
    /// Included graphic. Source (and alt text) in the attribute map.
    Image,
    UnorderedList,
    OrderedList,
    ListItem,
    /// List item led by a checkbox. Checked state in the attribute map.
    CheckboxItem,
    /// Verbatim block. Its single text child is raw, never escaped.
    CodeBlock,
    /// Inline code span. Its single text child is raw.
    InlineCode,
    /// Inline math. Leaf; the canonical source is in the attribute map.
    MathInline,
    /// Display math. Leaf; the canonical source is in the attribute map.
    MathBlock,
    /// Generic block container (`div`, `section`, ...).
    Container,
    /// Paragraph of inline content.
    Paragraph,
    /// Generic inline element (`span` and unrecognised tags); carries style only.
    Inline,
    /// Hard line break.
    Break,
}

impl Kind {
    /// Kinds rendered as their own block, separated by blank lines.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Kind::Heading(_)
                | Kind::UnorderedList
                | Kind::OrderedList
                | Kind::CodeBlock
                | Kind::MathBlock
                | Kind::Container
                | Kind::Paragraph
        )
    }

    /// Short lowercase name, used in tree dumps.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Text => "text",
            Kind::Root => "root",
            Kind::Heading(_) => "heading",
            Kind::Bold => "bold",
            Kind::Italic => "italic",
            Kind::Underline => "underline",
            Kind::Sans => "sans",
            Kind::Anchor => "anchor",
            Kind::Image => "image",
            Kind::UnorderedList => "unordered-list",
            Kind::OrderedList => "ordered-list",
            Kind::ListItem => "list-item",
            Kind::CheckboxItem => "checkbox-item",
            Kind::CodeBlock => "code-block",
            Kind::InlineCode => "inline-code",
            Kind::MathInline => "math-inline",
            Kind::MathBlock => "math-block",
            Kind::Container => "container",
            Kind::Paragraph => "paragraph",
            Kind::Inline => "inline",
            Kind::Break => "break",
        }
    }
}

/// Range into the document text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    /// Byte offset into `Document::text`.
    pub start: u32,
    /// Length in bytes.
    pub len: u32,
}

impl TextRange {
    /// Create a new text range.
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Check if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the end offset.
    pub fn end(&self) -> u32 {
        self.start + self.len
    }
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Kind,
    /// Parent node (None for root).
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Declared style.
    pub style: StyleId,
    /// Text content range (only for Text nodes).
    pub text: TextRange,
}

impl Node {
    /// Create a new node with default values.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            next_sibling: None,
            style: StyleId::DEFAULT,
            text: TextRange::default(),
        }
    }

    /// Create a text node with the given range.
    pub fn text(range: TextRange) -> Self {
        Self {
            text: range,
            ..Self::new(Kind::Text)
        }
    }
}
