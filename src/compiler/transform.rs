//! Rendered HTML (arena DOM) to document tree.

use crate::dom::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId};
use crate::ir::{Document, Kind, Node, NodeId};
use crate::math::SOURCE_ATTR;

use super::css::parse_inline_style;

/// How an element is turned into tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mapping {
    /// Node of this kind; children are converted recursively.
    Node(Kind),
    /// Node of this kind holding the element's raw text as its only child.
    Raw(Kind),
    /// Math leaf; preview children are discarded.
    Math(Kind),
    /// Element and its subtree are dropped.
    Skip,
}

/// Map an element to its kind.
fn map_element(dom: &ArenaDom, id: ArenaNodeId, tag: &str) -> Mapping {
    if dom.get_attr(id, SOURCE_ATTR).is_some()
        || dom.has_class(id, "math-inline")
        || dom.has_class(id, "math-block")
    {
        let display = dom.has_class(id, "math-block")
            || (tag == "div" && !dom.has_class(id, "math-inline"));
        return Mapping::Math(if display {
            Kind::MathBlock
        } else {
            Kind::MathInline
        });
    }

    match tag {
        "h1" => Mapping::Node(Kind::Heading(1)),
        "h2" => Mapping::Node(Kind::Heading(2)),
        "h3" => Mapping::Node(Kind::Heading(3)),
        "h4" | "h5" | "h6" => Mapping::Node(Kind::Heading(4)),

        "b" | "strong" => Mapping::Node(Kind::Bold),
        "i" | "em" => Mapping::Node(Kind::Italic),
        "u" | "ins" => Mapping::Node(Kind::Underline),
        "span" if dom.has_class(id, "sans") => Mapping::Node(Kind::Sans),

        "a" => Mapping::Node(Kind::Anchor),
        "img" => Mapping::Node(Kind::Image),

        "ul" => Mapping::Node(Kind::UnorderedList),
        "ol" => Mapping::Node(Kind::OrderedList),
        "li" if checkbox_of(dom, id).is_some() => Mapping::Node(Kind::CheckboxItem),
        "li" => Mapping::Node(Kind::ListItem),

        "pre" => Mapping::Raw(Kind::CodeBlock),
        "code" | "kbd" | "samp" | "tt" => Mapping::Raw(Kind::InlineCode),

        "br" => Mapping::Node(Kind::Break),
        "p" => Mapping::Node(Kind::Paragraph),

        "div" | "section" | "article" | "nav" | "header" | "footer" | "main" | "aside"
        | "blockquote" | "figure" | "address" | "details" | "center" => {
            Mapping::Node(Kind::Container)
        }

        "input" | "script" | "style" | "head" | "title" | "template" | "noscript" | "button" => {
            Mapping::Skip
        }

        _ => Mapping::Node(Kind::Inline),
    }
}

/// The checkbox input of a list item, if it has one.
fn checkbox_of(dom: &ArenaDom, li: ArenaNodeId) -> Option<ArenaNodeId> {
    dom.find_from(li, |id, _| {
        dom.is_tag(id, "input")
            && dom
                .get_attr(id, "type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
    })
}

/// Whether an element becomes a block-level node.
fn is_block_element(dom: &ArenaDom, id: ArenaNodeId) -> bool {
    let Some(tag) = dom.element_name(id) else {
        return false;
    };
    match map_element(dom, id, tag.as_ref()) {
        Mapping::Node(kind) | Mapping::Raw(kind) | Mapping::Math(kind) => {
            kind.is_block() || matches!(kind, Kind::ListItem | Kind::CheckboxItem)
        }
        Mapping::Skip => false,
    }
}

/// Strip the textual placeholder delimiters a math preview may show.
fn strip_math_delimiters(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix("\\[")
        .and_then(|t| t.strip_suffix("\\]"))
        .or_else(|| text.strip_prefix("$$").and_then(|t| t.strip_suffix("$$")))
        .or_else(|| text.strip_prefix('$').and_then(|t| t.strip_suffix('$')))
        .unwrap_or(text)
        .trim()
}

struct TransformContext<'a> {
    dom: &'a ArenaDom,
    doc: Document,
}

impl<'a> TransformContext<'a> {
    fn new(dom: &'a ArenaDom) -> Self {
        Self {
            dom,
            doc: Document::new(),
        }
    }

    fn transform(mut self) -> Document {
        let body = self.dom.find_by_tag("body").unwrap_or(self.dom.document());
        self.process_children(body, NodeId::ROOT);
        self.doc
    }

    fn process_children(&mut self, dom_parent: ArenaNodeId, parent: NodeId) {
        for child_id in self.dom.children(dom_parent).collect::<Vec<_>>() {
            self.process_node(child_id, parent);
        }
    }

    fn process_node(&mut self, dom_id: ArenaNodeId, parent: NodeId) {
        let Some(node) = self.dom.get(dom_id) else {
            return;
        };

        match &node.data {
            ArenaNodeData::Text(text) => {
                if text.trim().is_empty() {
                    // Inter-element whitespace: dropped at block boundaries,
                    // kept as one space between inline siblings.
                    if self.separates_inline(node, self.doc.kind(parent)) {
                        self.doc.append_text_node(parent, " ");
                    }
                    return;
                }
                self.doc.append_text_node(parent, text);
            }

            ArenaNodeData::Element { name, .. } => {
                let mapping = map_element(self.dom, dom_id, name.local.as_ref());
                let kind = match mapping {
                    Mapping::Skip => return,
                    Mapping::Node(kind) | Mapping::Raw(kind) | Mapping::Math(kind) => kind,
                };

                let mut ir_node = Node::new(kind);
                if let Some(css) = self.dom.get_attr(dom_id, "style") {
                    let declared = parse_inline_style(css);
                    ir_node.style = self.doc.styles.intern(declared);
                }
                let id = self.doc.alloc_node(ir_node);
                self.doc.append_child(parent, id);

                self.store_attributes(dom_id, id, kind);

                match mapping {
                    Mapping::Node(_) => self.process_children(dom_id, id),
                    Mapping::Raw(_) => {
                        let raw = self.dom.deep_text(dom_id);
                        if !raw.is_empty() {
                            self.doc.append_text_node(id, &raw);
                        }
                    }
                    Mapping::Math(_) | Mapping::Skip => {}
                }
            }

            ArenaNodeData::Document | ArenaNodeData::Comment => {}
        }
    }

    /// Whether whitespace `node` sits between inline content.
    ///
    /// At the start or end of a block parent there is nothing to separate;
    /// inside an inline parent the space may still separate it from outside text.
    fn separates_inline(&self, node: &ArenaNode, parent_kind: Kind) -> bool {
        if matches!(parent_kind, Kind::UnorderedList | Kind::OrderedList) {
            return false;
        }
        let block_parent = parent_kind == Kind::Root
            || parent_kind.is_block()
            || matches!(parent_kind, Kind::ListItem | Kind::CheckboxItem);

        let is_inline = |sibling: ArenaNodeId| match self.dom.get(sibling) {
            Some(_) => !is_block_element(self.dom, sibling),
            None => !block_parent,
        };
        is_inline(node.prev_sibling) && is_inline(node.next_sibling)
    }

    fn store_attributes(&mut self, dom_id: ArenaNodeId, id: NodeId, kind: Kind) {
        let dom = self.dom;
        match kind {
            Kind::Anchor => {
                if let Some(href) = dom.get_attr(dom_id, "href") {
                    self.doc.attrs.set_href(id, href);
                }
            }
            Kind::Image => {
                if let Some(src) = dom.get_attr(dom_id, "src") {
                    self.doc.attrs.set_src(id, src);
                }
                if let Some(alt) = dom.get_attr(dom_id, "alt") {
                    self.doc.attrs.set_alt(id, alt);
                }
            }
            Kind::MathInline | Kind::MathBlock => match dom.get_attr(dom_id, SOURCE_ATTR) {
                Some(encoded) => self.doc.attrs.set_math_source_encoded(id, encoded),
                None => {
                    let preview = dom.deep_text(dom_id);
                    self.doc
                        .attrs
                        .set_math_source(id, strip_math_delimiters(&preview));
                }
            },
            Kind::CheckboxItem => {
                let checked = checkbox_of(dom, dom_id)
                    .is_some_and(|input| dom.get_attr(input, "checked").is_some());
                self.doc.attrs.set_checked(id, checked);
            }
            _ => {}
        }
    }
}

/// Build a document tree from a parsed DOM.
pub fn transform(dom: &ArenaDom) -> Document {
    TransformContext::new(dom).transform()
}
