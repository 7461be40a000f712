//! Declared styles, the style pool, and style resolution.
//!
//! Nodes carry only the style they declare themselves (parsed from the
//! `style` attribute). [`StyleDescriptor`] is the resolved view: it is
//! computed from a node's declared style and its ancestors', never read off a
//! live rendering environment.

use std::collections::HashMap;
use std::fmt::Write;
use std::hash::{Hash, Hasher};

use super::node::Kind;

/// Trait for converting style values back to CSS strings.
pub trait ToCss {
    /// Write this value as CSS to the buffer.
    fn to_css(&self, buf: &mut String);

    /// Convert to a CSS string (convenience method).
    fn to_css_string(&self) -> String {
        let mut buf = String::new();
        self.to_css(&mut buf);
        buf
    }
}

/// Unique identifier for a style in the StylePool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleId(pub u32);

impl StyleId {
    /// The empty style (always 0).
    pub const DEFAULT: StyleId = StyleId(0);
}

/// RGBA color (8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Colour names understood in both directions.
///
/// These are the base `xcolor` names with their CSS values, so a name
/// survives markup → tree → markup unchanged.
pub const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("darkgray", Color::rgb(169, 169, 169)),
    ("lightgray", Color::rgb(211, 211, 211)),
    ("brown", Color::rgb(165, 42, 42)),
    ("lime", Color::rgb(0, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("pink", Color::rgb(255, 192, 203)),
    ("purple", Color::rgb(128, 0, 128)),
    ("teal", Color::rgb(0, 128, 128)),
    ("violet", Color::rgb(238, 130, 238)),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Create a new opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a new color with alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Look up a named colour (case-insensitive).
    pub fn from_name(name: &str) -> Option<Color> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }

    /// Parse `RRGGBB` (no leading `#`).
    pub fn from_hex(hex: &str) -> Option<Color> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::rgb(r, g, b))
    }

    /// The colour's name if it is in [`NAMED_COLORS`].
    pub fn name(&self) -> Option<&'static str> {
        NAMED_COLORS
            .iter()
            .find(|(_, c)| c == self)
            .map(|(n, _)| *n)
    }

    /// Upper-case `RRGGBB`, ignoring alpha.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Fully transparent colours paint nothing.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Opaque black is the default text colour.
    pub fn is_default_text(&self) -> bool {
        *self == Color::BLACK
    }
}

impl ToCss for Color {
    fn to_css(&self, buf: &mut String) {
        if self.a == 255 {
            let _ = write!(buf, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
        } else if self.a == 0 {
            buf.push_str("transparent");
        } else {
            let alpha = self.a as f32 / 255.0;
            let _ = write!(buf, "rgba({},{},{},{:.2})", self.r, self.g, self.b, alpha);
        }
    }
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    /// Parsed but has no markup counterpart.
    Justify,
}

impl TextAlign {
    /// Alignment environment name, if this alignment can be expressed.
    pub fn environment(self) -> Option<&'static str> {
        match self {
            TextAlign::Left => Some("flushleft"),
            TextAlign::Center => Some("center"),
            TextAlign::Right => Some("flushright"),
            TextAlign::Justify => None,
        }
    }
}

impl ToCss for TextAlign {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        });
    }
}

/// Length value with unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Pt(f32),
    Em(f32),
    Rem(f32),
    Percent(f32),
}

impl Eq for Length {}

impl Hash for Length {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (tag, v) = match self {
            Length::Px(v) => (0u8, v),
            Length::Pt(v) => (1, v),
            Length::Em(v) => (2, v),
            Length::Rem(v) => (3, v),
            Length::Percent(v) => (4, v),
        };
        tag.hash(state);
        v.to_bits().hash(state);
    }
}

impl ToCss for Length {
    fn to_css(&self, buf: &mut String) {
        let _ = match self {
            Length::Px(v) => write!(buf, "{v}px"),
            Length::Pt(v) => write!(buf, "{v}pt"),
            Length::Em(v) => write!(buf, "{v}em"),
            Length::Rem(v) => write!(buf, "{v}rem"),
            Length::Percent(v) => write!(buf, "{v}%"),
        };
    }
}

/// Style a node declares for itself (its `style` attribute).
///
/// `None` means "not declared here"; inheritable properties then come from
/// the parent during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DeclaredStyle {
    pub color: Option<Color>,
    pub background_color: Option<Color>,
    pub text_align: Option<TextAlign>,
    pub font_family: Option<String>,
    pub font_size: Option<Length>,
}

impl DeclaredStyle {
    /// Check if nothing is declared.
    pub fn is_empty(&self) -> bool {
        *self == DeclaredStyle::default()
    }
}

impl ToCss for DeclaredStyle {
    fn to_css(&self, buf: &mut String) {
        let mut decl = |name: &str, value: &dyn ToCss, buf: &mut String| {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(name);
            buf.push_str(": ");
            value.to_css(buf);
            buf.push(';');
        };

        if let Some(c) = &self.color {
            decl("color", c, buf);
        }
        if let Some(c) = &self.background_color {
            decl("background-color", c, buf);
        }
        if let Some(a) = &self.text_align {
            decl("text-align", a, buf);
        }
        if let Some(f) = &self.font_family {
            decl("font-family", f, buf);
        }
        if let Some(l) = &self.font_size {
            decl("font-size", l, buf);
        }
    }
}

impl ToCss for String {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(self);
    }
}

/// Style pool for deduplicated declared styles.
///
/// Styles are interned: identical styles share the same StyleId.
#[derive(Clone)]
pub struct StylePool {
    styles: Vec<DeclaredStyle>,
    intern_map: HashMap<DeclaredStyle, StyleId>,
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

impl StylePool {
    /// Create a new style pool with the empty style at index 0.
    pub fn new() -> Self {
        let empty = DeclaredStyle::default();
        let mut intern_map = HashMap::new();
        intern_map.insert(empty.clone(), StyleId::DEFAULT);

        Self {
            styles: vec![empty],
            intern_map,
        }
    }

    /// Intern a style, returning its StyleId.
    pub fn intern(&mut self, style: DeclaredStyle) -> StyleId {
        if let Some(&id) = self.intern_map.get(&style) {
            return id;
        }

        let id = StyleId(self.styles.len() as u32);
        self.intern_map.insert(style.clone(), id);
        self.styles.push(style);
        id
    }

    /// Get a style by ID.
    pub fn get(&self, id: StyleId) -> Option<&DeclaredStyle> {
        self.styles.get(id.0 as usize)
    }

    /// Get the number of unique styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Always false: the empty style is always present.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl std::fmt::Debug for StylePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StylePool")
            .field("count", &self.styles.len())
            .finish()
    }
}

/// Font family bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    #[default]
    Default,
    Sans,
}

impl FontFamily {
    /// Bucket a CSS `font-family` list.
    pub fn classify(family: &str) -> FontFamily {
        let lower = family.to_ascii_lowercase();
        let is_serif_first = lower
            .split(',')
            .next()
            .is_some_and(|first| first.trim().trim_matches(['"', '\'']) == "serif");
        if !is_serif_first
            && (lower.contains("sans") || lower.contains("helvetica") || lower.contains("arial"))
        {
            FontFamily::Sans
        } else {
            FontFamily::Default
        }
    }
}

/// Discrete font-size buckets, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontSize {
    Tiny,
    ScriptSize,
    FootnoteSize,
    Small,
    NormalSize,
    Large,
    LargeX,
    LargeXX,
    Huge,
    HugeX,
}

impl FontSize {
    /// All buckets, smallest first.
    pub const ALL: [FontSize; 10] = [
        FontSize::Tiny,
        FontSize::ScriptSize,
        FontSize::FootnoteSize,
        FontSize::Small,
        FontSize::NormalSize,
        FontSize::Large,
        FontSize::LargeX,
        FontSize::LargeXX,
        FontSize::Huge,
        FontSize::HugeX,
    ];

    /// Bucket a numeric size.
    ///
    /// Small sizes are matched upwards and large sizes downwards; everything
    /// strictly between 9 and 12 is `normalsize`.
    pub fn from_size(size: f32) -> FontSize {
        if size <= 6.0 {
            FontSize::Tiny
        } else if size <= 7.0 {
            FontSize::ScriptSize
        } else if size <= 8.0 {
            FontSize::FootnoteSize
        } else if size <= 9.0 {
            FontSize::Small
        } else if size >= 24.0 {
            FontSize::HugeX
        } else if size >= 20.0 {
            FontSize::Huge
        } else if size >= 17.0 {
            FontSize::LargeXX
        } else if size >= 14.0 {
            FontSize::LargeX
        } else if size >= 12.0 {
            FontSize::Large
        } else {
            FontSize::NormalSize
        }
    }

    /// Fixed size the markup compiler assigns to this bucket.
    pub fn points(self) -> f32 {
        match self {
            FontSize::Tiny => 6.0,
            FontSize::ScriptSize => 7.0,
            FontSize::FootnoteSize => 8.0,
            FontSize::Small => 9.0,
            FontSize::NormalSize => 10.0,
            FontSize::Large => 12.0,
            FontSize::LargeX => 14.0,
            FontSize::LargeXX => 17.0,
            FontSize::Huge => 20.0,
            FontSize::HugeX => 24.0,
        }
    }

    /// Size command name (without backslash).
    pub fn command(self) -> &'static str {
        match self {
            FontSize::Tiny => "tiny",
            FontSize::ScriptSize => "scriptsize",
            FontSize::FootnoteSize => "footnotesize",
            FontSize::Small => "small",
            FontSize::NormalSize => "normalsize",
            FontSize::Large => "large",
            FontSize::LargeX => "Large",
            FontSize::LargeXX => "LARGE",
            FontSize::Huge => "huge",
            FontSize::HugeX => "Huge",
        }
    }

    /// Look up a bucket by its command name (case-sensitive).
    pub fn from_command(name: &str) -> Option<FontSize> {
        FontSize::ALL.into_iter().find(|s| s.command() == name)
    }
}

/// Size that relative units resolve against when no ancestor sets one.
pub const BASE_FONT_SIZE: f32 = 10.0;

/// Fully resolved style of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleDescriptor {
    /// Inherited text colour.
    pub color: Option<Color>,
    /// Background of this node only (not inherited).
    pub background_color: Option<Color>,
    /// Inherited alignment.
    pub text_align: Option<TextAlign>,
    /// Inherited family bucket.
    pub font_family: FontFamily,
    /// Inherited numeric size; `None` when nothing sets one.
    pub font_size: Option<f32>,
}

impl StyleDescriptor {
    /// Resolve a node's style from its parent's resolved style.
    pub fn cascade(parent: &StyleDescriptor, declared: &DeclaredStyle, kind: Kind) -> Self {
        let parent_size = parent.font_size.unwrap_or(BASE_FONT_SIZE);
        let font_size = match declared.font_size {
            // Absolute units are taken at face value so markup sizes survive
            // the round trip through a style attribute.
            Some(Length::Px(v) | Length::Pt(v)) => Some(v),
            Some(Length::Em(v)) => Some(parent_size * v),
            Some(Length::Rem(v)) => Some(BASE_FONT_SIZE * v),
            Some(Length::Percent(v)) => Some(parent_size * v / 100.0),
            None => parent.font_size,
        };

        let font_family = match (&declared.font_family, kind) {
            (_, Kind::Sans) => FontFamily::Sans,
            (Some(family), _) => FontFamily::classify(family),
            (None, _) => parent.font_family,
        };

        Self {
            color: declared.color.or(parent.color),
            background_color: declared.background_color,
            text_align: declared.text_align.or(parent.text_align),
            font_family,
            font_size,
        }
    }

    /// Size bucket, if any size is in effect.
    pub fn font_size_bucket(&self) -> Option<FontSize> {
        self.font_size.map(FontSize::from_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_color_to_css() {
        assert_eq!(Color::BLACK.to_css_string(), "#000000");
        assert_eq!(Color::rgb(0, 128, 255).to_css_string(), "#0080ff");
        assert_eq!(Color::TRANSPARENT.to_css_string(), "transparent");
    }

    #[test]
    fn test_named_colors_round_trip() {
        for (name, color) in NAMED_COLORS {
            assert_eq!(Color::from_name(name), Some(*color));
            assert_eq!(color.name(), Some(*name));
        }
    }

    #[test]
    fn test_hex() {
        assert_eq!(Color::from_hex("ff8800"), Some(Color::rgb(255, 136, 0)));
        assert_eq!(Color::rgb(255, 136, 0).to_hex(), "FF8800");
        assert_eq!(Color::from_hex("ff88"), None);
        assert_eq!(Color::from_hex("zz8800"), None);
    }

    #[test]
    fn test_declared_style_to_css() {
        let style = DeclaredStyle {
            color: Some(Color::rgb(255, 0, 0)),
            font_size: Some(Length::Pt(12.0)),
            ..Default::default()
        };
        assert_eq!(style.to_css_string(), "color: #ff0000; font-size: 12pt;");
    }

    #[test]
    fn test_style_interning() {
        let mut pool = StylePool::new();
        let red = DeclaredStyle {
            color: Some(Color::rgb(255, 0, 0)),
            ..Default::default()
        };

        let id1 = pool.intern(red.clone());
        let id2 = pool.intern(red);
        let id3 = pool.intern(DeclaredStyle::default());

        assert_eq!(id1, id2);
        assert_eq!(id3, StyleId::DEFAULT);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_font_size_boundaries() {
        let expected = [
            (6.0, FontSize::Tiny),
            (7.0, FontSize::ScriptSize),
            (8.0, FontSize::FootnoteSize),
            (9.0, FontSize::Small),
            (10.0, FontSize::NormalSize),
            (12.0, FontSize::Large),
            (14.0, FontSize::LargeX),
            (17.0, FontSize::LargeXX),
            (20.0, FontSize::Huge),
            (24.0, FontSize::HugeX),
        ];
        for (size, bucket) in expected {
            assert_eq!(FontSize::from_size(size), bucket, "size {size}");
        }
    }

    #[test]
    fn test_font_size_between_boundaries() {
        assert_eq!(FontSize::from_size(6.5), FontSize::ScriptSize);
        assert_eq!(FontSize::from_size(11.0), FontSize::NormalSize);
        assert_eq!(FontSize::from_size(13.0), FontSize::Large);
        assert_eq!(FontSize::from_size(16.0), FontSize::LargeX);
        assert_eq!(FontSize::from_size(23.9), FontSize::Huge);
        assert_eq!(FontSize::from_size(0.0), FontSize::Tiny);
        assert_eq!(FontSize::from_size(96.0), FontSize::HugeX);
    }

    #[test]
    fn test_points_are_left_inverse() {
        for bucket in FontSize::ALL {
            assert_eq!(FontSize::from_size(bucket.points()), bucket);
            assert_eq!(FontSize::from_command(bucket.command()), Some(bucket));
        }
    }

    #[test]
    fn test_family_classify() {
        assert_eq!(FontFamily::classify("sans-serif"), FontFamily::Sans);
        assert_eq!(FontFamily::classify("Helvetica, Arial"), FontFamily::Sans);
        assert_eq!(FontFamily::classify("serif"), FontFamily::Default);
        assert_eq!(FontFamily::classify("Georgia"), FontFamily::Default);
    }

    #[test]
    fn test_cascade_inherits() {
        let parent = StyleDescriptor {
            color: Some(Color::rgb(255, 0, 0)),
            background_color: Some(Color::rgb(255, 255, 0)),
            text_align: Some(TextAlign::Center),
            font_family: FontFamily::Sans,
            font_size: Some(12.0),
        };
        let child = StyleDescriptor::cascade(&parent, &DeclaredStyle::default(), Kind::Inline);

        assert_eq!(child.color, parent.color);
        assert_eq!(child.text_align, parent.text_align);
        assert_eq!(child.font_family, FontFamily::Sans);
        assert_eq!(child.font_size, Some(12.0));
        assert_eq!(child.background_color, None);
    }

    #[test]
    fn test_cascade_relative_sizes() {
        let parent = StyleDescriptor {
            font_size: Some(12.0),
            ..Default::default()
        };
        let em = DeclaredStyle {
            font_size: Some(Length::Em(2.0)),
            ..Default::default()
        };
        let pct = DeclaredStyle {
            font_size: Some(Length::Percent(50.0)),
            ..Default::default()
        };

        let em_style = StyleDescriptor::cascade(&parent, &em, Kind::Inline);
        let pct_style = StyleDescriptor::cascade(&StyleDescriptor::default(), &pct, Kind::Inline);

        assert_eq!(em_style.font_size, Some(24.0));
        assert_eq!(pct_style.font_size, Some(5.0));
        assert_eq!(pct_style.font_size_bucket(), Some(FontSize::Tiny));
    }

    #[test]
    fn test_sans_kind_implies_family() {
        let style =
            StyleDescriptor::cascade(&StyleDescriptor::default(), &DeclaredStyle::default(), Kind::Sans);
        assert_eq!(style.font_family, FontFamily::Sans);
    }

    proptest! {
        #[test]
        fn prop_font_size_is_monotonic(a in 0.0f32..100.0, b in 0.0f32..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(FontSize::from_size(lo) <= FontSize::from_size(hi));
        }
    }
}
