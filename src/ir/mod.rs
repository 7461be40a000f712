//! Document tree for the rendered surface.
//!
//! The tree is what both compilers agree on:
//! - Nodes with a [`Kind`] (heading, list item, math, ...)
//! - Declared styles interned in a [`StylePool`]
//! - Sparse attributes (href, src, math source) in an [`AttributeMap`]
//! - One text buffer with range references
//!
//! # Example
//!
//! ```
//! use texbridge::ir::{Document, Kind, Node, NodeId};
//!
//! let mut doc = Document::new();
//! let heading = doc.alloc_node(Node::new(Kind::Heading(1)));
//! doc.append_child(NodeId::ROOT, heading);
//! doc.append_text_node(heading, "Demo");
//!
//! assert_eq!(doc.text_content(heading), "Demo");
//! ```

mod attrs;
mod node;
mod style;

pub use attrs::AttributeMap;
pub use node::{Kind, Node, NodeId, TextRange};
pub use style::{
    BASE_FONT_SIZE, Color, DeclaredStyle, FontFamily, FontSize, Length, NAMED_COLORS,
    StyleDescriptor, StyleId, StylePool, TextAlign, ToCss,
};

/// A converted document.
///
/// Uses a parent-pointer / first-child / next-sibling representation. Each
/// node has exactly one parent, so ownership is containment.
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes in the tree (index 0 is always the root).
    nodes: Vec<Node>,
    /// Declared styles with deduplication.
    pub styles: StylePool,
    /// Sparse attributes (href, src, alt, math source, checked).
    pub attrs: AttributeMap,
    text: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document with a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Kind::Root)],
            styles: StylePool::new(),
            attrs: AttributeMap::new(),
            text: String::new(),
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Kind of a node; unknown IDs read as the root.
    pub fn kind(&self, id: NodeId) -> Kind {
        self.node(id).map_or(Kind::Root, |n| n.kind)
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a new node and return its ID.
    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append text to the buffer and return the range.
    pub fn append_text(&mut self, text: &str) -> TextRange {
        let start = self.text.len() as u32;
        self.text.push_str(text);
        TextRange::new(start, text.len() as u32)
    }

    /// Create a text node under `parent`.
    pub fn append_text_node(&mut self, parent: NodeId, text: &str) -> NodeId {
        let range = self.append_text(text);
        let id = self.alloc_node(Node::text(range));
        self.append_child(parent, id);
        id
    }

    /// Get text from a range.
    pub fn text(&self, range: TextRange) -> &str {
        &self.text[range.start as usize..range.end() as usize]
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.kind == Kind::Text {
            out.push_str(self.text(node.text));
            return;
        }
        for child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Append a child node to a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(child_node) = self.nodes.get_mut(child.0 as usize) {
            child_node.parent = Some(parent);
        }

        let Some(parent_node) = self.nodes.get(parent.0 as usize) else {
            return;
        };
        match parent_node.first_child {
            Some(first_child) => {
                let mut current = first_child;
                while let Some(next) = self.nodes.get(current.0 as usize).and_then(|n| n.next_sibling)
                {
                    current = next;
                }
                if let Some(last_node) = self.nodes.get_mut(current.0 as usize) {
                    last_node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent.0 as usize) {
                    parent_node.first_child = Some(child);
                }
            }
        }
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        let first_child = self
            .nodes
            .get(parent.0 as usize)
            .and_then(|n| n.first_child);
        ChildIter {
            doc: self,
            current: first_child,
        }
    }

    /// Iterate over all nodes in depth-first order.
    pub fn iter_dfs(&self) -> DfsIter<'_> {
        DfsIter {
            doc: self,
            stack: vec![NodeId::ROOT],
        }
    }

    /// The style a node declares itself.
    pub fn declared_style(&self, id: NodeId) -> &DeclaredStyle {
        static EMPTY: DeclaredStyle = DeclaredStyle {
            color: None,
            background_color: None,
            text_align: None,
            font_family: None,
            font_size: None,
        };
        self.node(id)
            .and_then(|n| self.styles.get(n.style))
            .unwrap_or(&EMPTY)
    }
}

/// Resolve the effective style of `id` from its ancestor chain.
///
/// Starts from the default descriptor at the root and cascades each
/// ancestor's declared style down to the node.
pub fn resolve_style(doc: &Document, id: NodeId) -> StyleDescriptor {
    let mut chain = Vec::new();
    let mut current = Some(id);
    while let Some(node_id) = current {
        let Some(node) = doc.node(node_id) else {
            break;
        };
        chain.push(node_id);
        current = node.parent;
    }

    chain
        .iter()
        .rev()
        .fold(StyleDescriptor::default(), |parent, &node_id| {
            StyleDescriptor::cascade(&parent, doc.declared_style(node_id), doc.kind(node_id))
        })
}

/// Iterator over children of a node.
pub struct ChildIter<'a> {
    doc: &'a Document,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self
            .doc
            .nodes
            .get(current.0 as usize)
            .and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Depth-first iterator over all nodes.
pub struct DfsIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse order so they're visited left-to-right
        let mut children: Vec<NodeId> = self.doc.children(current).collect();
        children.reverse();
        self.stack.extend(children);

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.root(), NodeId::ROOT);

        let root = doc.node(NodeId::ROOT).unwrap();
        assert_eq!(root.kind, Kind::Root);
        assert!(root.parent.is_none());
    }

    #[test]
    fn test_dfs_iteration() {
        let mut doc = Document::new();

        let para1 = doc.alloc_node(Node::new(Kind::Paragraph));
        let para2 = doc.alloc_node(Node::new(Kind::Paragraph));
        doc.append_child(NodeId::ROOT, para1);
        doc.append_child(NodeId::ROOT, para2);
        let text = doc.append_text_node(para1, "Text");

        let nodes: Vec<_> = doc.iter_dfs().collect();
        assert_eq!(nodes, vec![NodeId::ROOT, para1, text, para2]);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let para = doc.alloc_node(Node::new(Kind::Paragraph));
        doc.append_child(NodeId::ROOT, para);
        doc.append_text_node(para, "Hello, ");
        let bold = doc.alloc_node(Node::new(Kind::Bold));
        doc.append_child(para, bold);
        doc.append_text_node(bold, "World");

        assert_eq!(doc.text_content(para), "Hello, World");
        assert_eq!(doc.text_content(NodeId::ROOT), "Hello, World");
    }

    #[test]
    fn test_resolve_style_walks_ancestors() {
        let mut doc = Document::new();

        let red = doc.styles.intern(DeclaredStyle {
            color: Some(Color::rgb(255, 0, 0)),
            background_color: Some(Color::rgb(255, 255, 0)),
            text_align: Some(TextAlign::Right),
            ..Default::default()
        });
        let div = doc.alloc_node(Node::new(Kind::Container));
        doc.node_mut(div).unwrap().style = red;
        doc.append_child(NodeId::ROOT, div);

        let sans = doc.alloc_node(Node::new(Kind::Sans));
        doc.append_child(div, sans);
        let text = doc.append_text_node(sans, "x");

        let style = resolve_style(&doc, text);
        assert_eq!(style.color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.text_align, Some(TextAlign::Right));
        assert_eq!(style.font_family, FontFamily::Sans);
        assert_eq!(style.background_color, None);

        let root_style = resolve_style(&doc, NodeId::ROOT);
        assert_eq!(root_style, StyleDescriptor::default());
    }
}
