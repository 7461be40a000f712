//! Sparse node attributes.
//!
//! Only anchors, images, math nodes and checkbox items carry attributes, so
//! they are kept in per-attribute maps instead of on every node. String values
//! share one contiguous buffer and are referenced by [`TextRange`].

use std::borrow::Cow;
use std::collections::HashMap;

use super::node::{NodeId, TextRange};
use crate::math;

/// Sparse attribute storage for a [`Document`](super::Document).
#[derive(Debug, Default, Clone)]
pub struct AttributeMap {
    buffer: String,
    href: HashMap<NodeId, TextRange>,
    src: HashMap<NodeId, TextRange>,
    alt: HashMap<NodeId, TextRange>,
    /// Percent-encoded canonical math source.
    math_source: HashMap<NodeId, TextRange>,
    checked: HashMap<NodeId, bool>,
}

impl AttributeMap {
    /// Create a new empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, s: &str) -> TextRange {
        let start = self.buffer.len() as u32;
        self.buffer.push_str(s);
        TextRange::new(start, s.len() as u32)
    }

    fn get_str(&self, range: TextRange) -> &str {
        &self.buffer[range.start as usize..range.end() as usize]
    }

    /// Set the link target of an anchor.
    pub fn set_href(&mut self, node: NodeId, href: &str) {
        if !href.is_empty() {
            let range = self.append(href);
            self.href.insert(node, range);
        }
    }

    /// Get the link target of an anchor.
    pub fn href(&self, node: NodeId) -> Option<&str> {
        self.href.get(&node).map(|r| self.get_str(*r))
    }

    /// Set the source of an image.
    pub fn set_src(&mut self, node: NodeId, src: &str) {
        if !src.is_empty() {
            let range = self.append(src);
            self.src.insert(node, range);
        }
    }

    /// Get the source of an image.
    pub fn src(&self, node: NodeId) -> Option<&str> {
        self.src.get(&node).map(|r| self.get_str(*r))
    }

    /// Set the alt text of an image.
    pub fn set_alt(&mut self, node: NodeId, alt: &str) {
        if !alt.is_empty() {
            let range = self.append(alt);
            self.alt.insert(node, range);
        }
    }

    /// Get the alt text of an image.
    pub fn alt(&self, node: NodeId) -> Option<&str> {
        self.alt.get(&node).map(|r| self.get_str(*r))
    }

    /// Set the percent-encoded canonical source of a math node.
    ///
    /// An empty expression is still recorded: the node exists and its source
    /// is the empty string.
    pub fn set_math_source_encoded(&mut self, node: NodeId, encoded: &str) {
        let range = self.append(encoded);
        self.math_source.insert(node, range);
    }

    /// Set the canonical source of a math node from the raw expression.
    pub fn set_math_source(&mut self, node: NodeId, expression: &str) {
        self.set_math_source_encoded(node, &math::encode_source(expression));
    }

    /// Percent-encoded canonical source, as stored.
    pub fn math_source_encoded(&self, node: NodeId) -> Option<&str> {
        self.math_source.get(&node).map(|r| self.get_str(*r))
    }

    /// Decoded math expression.
    pub fn math_source(&self, node: NodeId) -> Option<Cow<'_, str>> {
        self.math_source_encoded(node).map(math::decode_source)
    }

    /// Set the checked state of a checkbox item.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.checked.insert(node, checked);
    }

    /// Whether a checkbox item is checked (false if never set).
    pub fn is_checked(&self, node: NodeId) -> bool {
        self.checked.get(&node).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_image_attributes() {
        let mut attrs = AttributeMap::new();
        let node = NodeId(1);

        attrs.set_href(node, "https://example.com");
        attrs.set_alt(node, "");

        assert_eq!(attrs.href(node), Some("https://example.com"));
        assert_eq!(attrs.alt(node), None);
        assert_eq!(attrs.src(node), None);
    }

    #[test]
    fn test_math_source_encoded_round_trip() {
        let mut attrs = AttributeMap::new();
        let node = NodeId(3);

        attrs.set_math_source(node, "\\frac{a}{b}");

        assert_eq!(
            attrs.math_source_encoded(node),
            Some("%5Cfrac%7Ba%7D%7Bb%7D")
        );
        assert_eq!(attrs.math_source(node).as_deref(), Some("\\frac{a}{b}"));
    }

    #[test]
    fn test_empty_math_source_is_kept() {
        let mut attrs = AttributeMap::new();
        attrs.set_math_source(NodeId(2), "");
        assert_eq!(attrs.math_source(NodeId(2)).as_deref(), Some(""));
    }

    #[test]
    fn test_checked_defaults_false() {
        let mut attrs = AttributeMap::new();
        attrs.set_checked(NodeId(4), true);
        assert!(attrs.is_checked(NodeId(4)));
        assert!(!attrs.is_checked(NodeId(5)));
    }
}
