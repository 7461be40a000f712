//! Call-scoped store for opaque regions.
//!
//! Regions that generic rewrite stages must not touch (verbatim code, math,
//! checklists, inline code) are rendered up front, stored here, and replaced
//! by a placeholder token. After every other stage has run, [`ProtectedBlocks::restore_all`]
//! puts the stored content back verbatim.
//!
//! Tokens have the form `__PROTECTED_BLOCK_<index>__`. If the source already
//! contains that text literally, the store lengthens its tag until it no
//! longer collides, so restoring never rewrites user text.

use memchr::memmem;

const DEFAULT_TAG: &str = "PROTECTED_BLOCK";

/// A rendered region held back from the rewrite stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedBlock {
    /// Sequential index within one conversion; never reused.
    pub index: usize,
    /// Final rendered content restored in place of the token.
    pub content: String,
}

/// Placeholder store for one conversion call.
#[derive(Debug, Clone)]
pub struct ProtectedBlocks {
    tag: String,
    blocks: Vec<ProtectedBlock>,
}

impl Default for ProtectedBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtectedBlocks {
    /// Create an empty store using the default token tag.
    pub fn new() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            blocks: Vec::new(),
        }
    }

    /// Create a store whose tokens cannot collide with text in `source`.
    ///
    /// Escaped underscores become literal ones during unescaping, so the check
    /// ignores backslashes.
    pub fn for_source(source: &str) -> Self {
        let mut store = Self::new();
        let plain = source.replace('\\', "");
        while plain.contains(&store.prefix()) {
            store.tag.push_str("_X");
        }
        store
    }

    fn prefix(&self) -> String {
        format!("__{}_", self.tag)
    }

    /// Store rendered content and return the token that stands in for it.
    pub fn protect(&mut self, content: impl Into<String>) -> String {
        let index = self.blocks.len();
        self.blocks.push(ProtectedBlock {
            index,
            content: content.into(),
        });
        format!("__{}_{}__", self.tag, index)
    }

    /// Get a stored block by index.
    pub fn get(&self, index: usize) -> Option<&ProtectedBlock> {
        self.blocks.get(index)
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if nothing has been protected.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// If `text` is exactly one token, return the block it stands for.
    pub fn block_for_token(&self, text: &str) -> Option<&ProtectedBlock> {
        let prefix = self.prefix();
        let digits = text.strip_prefix(&prefix)?.strip_suffix("__")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.get(digits.parse().ok()?)
    }

    /// Check whether any token of this store appears in `text`.
    pub fn contains_token(&self, text: &str) -> bool {
        let prefix = self.prefix();
        let finder = memmem::Finder::new(prefix.as_bytes());
        finder
            .find_iter(text.as_bytes())
            .any(|pos| self.token_at(text, pos, prefix.len()).is_some())
    }

    /// Blocks whose tokens appear in `text`, in order of appearance.
    pub fn blocks_in(&self, text: &str) -> Vec<&ProtectedBlock> {
        let prefix = self.prefix();
        let finder = memmem::Finder::new(prefix.as_bytes());
        finder
            .find_iter(text.as_bytes())
            .filter_map(|pos| self.token_at(text, pos, prefix.len()))
            .map(|(index, _)| &self.blocks[index])
            .collect()
    }

    /// Replace every token in `text` with its stored content.
    ///
    /// Stored content may itself contain tokens of earlier blocks (a verbatim
    /// block inside a checklist item); those are expanded as well. Indices
    /// only ever point backwards, so expansion terminates.
    pub fn restore_all(&self, text: &str) -> String {
        if self.blocks.is_empty() {
            return text.to_string();
        }

        let prefix = self.prefix();
        let finder = memmem::Finder::new(prefix.as_bytes());
        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        for pos in finder.find_iter(text.as_bytes()) {
            if pos < last {
                continue;
            }
            let Some((index, end)) = self.token_at(text, pos, prefix.len()) else {
                continue;
            };
            result.push_str(&text[last..pos]);
            let content = &self.blocks[index].content;
            if content.contains(&prefix) {
                result.push_str(&self.restore_all(content));
            } else {
                result.push_str(content);
            }
            last = end;
        }
        result.push_str(&text[last..]);

        result
    }

    /// Parse a token starting at `pos`, returning its index and end offset.
    fn token_at(&self, text: &str, pos: usize, prefix_len: usize) -> Option<(usize, usize)> {
        let digits_start = pos + prefix_len;
        let bytes = text.as_bytes();
        let digits_len = bytes[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits_len == 0 {
            return None;
        }
        let digits_end = digits_start + digits_len;
        if !text[digits_end..].starts_with("__") {
            return None;
        }
        let index: usize = text[digits_start..digits_end].parse().ok()?;
        (index < self.blocks.len()).then_some((index, digits_end + 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_tokens() {
        let mut store = ProtectedBlocks::new();
        assert_eq!(store.protect("a"), "__PROTECTED_BLOCK_0__");
        assert_eq!(store.protect("b"), "__PROTECTED_BLOCK_1__");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().content, "b");
    }

    #[test]
    fn test_restore_all() {
        let mut store = ProtectedBlocks::new();
        let t0 = store.protect("<pre>x</pre>");
        let t1 = store.protect("<code>$</code>");
        let text = format!("before {t0} middle {t1}{t0} after");

        let restored = store.restore_all(&text);
        assert_eq!(
            restored,
            "before <pre>x</pre> middle <code>$</code><pre>x</pre> after"
        );
        assert!(!store.contains_token(&restored));
    }

    #[test]
    fn test_restore_nested_tokens() {
        let mut store = ProtectedBlocks::new();
        let inner = store.protect("<pre>code</pre>");
        let outer = store.protect(format!("<li>{inner}</li>"));

        assert_eq!(store.restore_all(&outer), "<li><pre>code</pre></li>");
    }

    #[test]
    fn test_unknown_index_left_alone() {
        let mut store = ProtectedBlocks::new();
        store.protect("x");
        let text = "__PROTECTED_BLOCK_7__ and __PROTECTED_BLOCK___";
        assert_eq!(store.restore_all(text), text);
    }

    #[test]
    fn test_block_for_token() {
        let mut store = ProtectedBlocks::new();
        let token = store.protect("<div>m</div>");
        assert_eq!(store.block_for_token(&token).unwrap().index, 0);
        assert!(store.block_for_token("__PROTECTED_BLOCK_0__ ").is_none());
    }

    #[test]
    fn test_blocks_in() {
        let mut store = ProtectedBlocks::new();
        let t0 = store.protect("<pre>a</pre>");
        let t1 = store.protect("<code>b</code>");
        let text = format!("{t1} then {t0}");

        let found: Vec<_> = store.blocks_in(&text).iter().map(|b| b.index).collect();
        assert_eq!(found, vec![1, 0]);
        assert!(store.blocks_in("plain").is_empty());
    }

    #[test]
    fn test_tag_avoids_literal_collision() {
        let source = "literal \\_\\_PROTECTED\\_BLOCK\\_0\\_\\_ text";
        let mut store = ProtectedBlocks::for_source(source);
        let token = store.protect("X");
        assert_ne!(token, "__PROTECTED_BLOCK_0__");

        let text = format!("__PROTECTED_BLOCK_0__ {token}");
        assert_eq!(store.restore_all(&text), "__PROTECTED_BLOCK_0__ X");
    }
}
