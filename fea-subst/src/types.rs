//! Names and references used when writing rules.
//!
//! Rules are written against [`Item`]s, which are whatever the caller typed:
//! a glyph name, a class name, a gset name, or a literal list. Validation turns
//! each item into a [`GlyphOrClass`], which is what ends up in the output.

use std::{
    fmt::{Debug, Display},
    rc::Rc,
};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The sigil that starts every class name in feature syntax.
pub const CLASS_SIGIL: char = '@';

/// The marker that starts a setting token inside a glyph list.
pub const SETTING_MARKER: char = '#';

/// The setting token meaning "the target may also be the first glyph".
pub const START_TOKEN: &str = "#start";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlyphName(SmolStr);

impl GlyphName {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for GlyphName {
    fn from(value: String) -> Self {
        GlyphName(value.into())
    }
}

impl From<&str> for GlyphName {
    fn from(value: &str) -> Self {
        GlyphName(value.into())
    }
}

impl From<SmolStr> for GlyphName {
    fn from(value: SmolStr) -> Self {
        GlyphName(value)
    }
}

impl Debug for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// lets a HashSet<GlyphName> be queried with a &str
impl std::borrow::Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl PartialEq<&str> for GlyphName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// The name of a glyph class, stored without its sigil.
///
/// Formatting with `Display` adds the sigil back.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassName(SmolStr);

impl ClassName {
    /// Create a class name, dropping a leading `@` if present.
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        Self(SmolStr::new(s.strip_prefix(CLASS_SIGIL).unwrap_or(s)))
    }

    /// The name without its sigil.
    pub fn bare(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for ClassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CLASS_SIGIL}{}", self.0)
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CLASS_SIGIL}{}", self.0)
    }
}

/// A named, ordered list of glyphs.
///
/// Cloning is cheap; the members are shared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphClass {
    name: ClassName,
    glyphs: Rc<[GlyphName]>,
}

impl GlyphClass {
    pub(crate) fn new(name: ClassName, glyphs: Vec<GlyphName>) -> Self {
        GlyphClass {
            name,
            glyphs: glyphs.into(),
        }
    }

    pub fn name(&self) -> &ClassName {
        &self.name
    }

    pub fn glyphs(&self) -> &[GlyphName] {
        &self.glyphs
    }

    pub fn contains(&self, glyph: &GlyphName) -> bool {
        self.glyphs.contains(glyph)
    }
}

/// An unresolved reference, as written by the caller.
///
/// A name may be a glyph, a gset, a class (with or without its sigil), a
/// preset, or a setting token. Lists are literal glyph lists, and may carry
/// setting tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Name(SmolStr),
    List(Vec<SmolStr>),
}

impl Item {
    /// Iterate the raw names in this item.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        let (one, many) = match self {
            Item::Name(name) => (Some(name.as_str()), &[][..]),
            Item::List(names) => (None, names.as_slice()),
        };
        one.into_iter().chain(many.iter().map(SmolStr::as_str))
    }

    /// `true` if this item carries the sequence-start token.
    pub fn has_start_token(&self) -> bool {
        self.names().any(|name| name == START_TOKEN)
    }

    /// This item as a list, with the sequence-start token removed.
    pub(crate) fn without_start_token(&self) -> Vec<SmolStr> {
        self.names()
            .filter(|name| *name != START_TOKEN)
            .map(SmolStr::new)
            .collect()
    }
}

impl From<&str> for Item {
    fn from(src: &str) -> Item {
        Item::Name(src.into())
    }
}

impl From<SmolStr> for Item {
    fn from(src: SmolStr) -> Item {
        Item::Name(src)
    }
}

impl From<&GlyphName> for Item {
    fn from(src: &GlyphName) -> Item {
        Item::Name(src.0.clone())
    }
}

impl From<&ClassName> for Item {
    fn from(src: &ClassName) -> Item {
        Item::Name(SmolStr::new(src.to_string()))
    }
}

impl<const N: usize> From<[&str; N]> for Item {
    fn from(src: [&str; N]) -> Item {
        Item::List(src.iter().map(|s| SmolStr::new(s)).collect())
    }
}

impl From<Vec<SmolStr>> for Item {
    fn from(src: Vec<SmolStr>) -> Item {
        Item::List(src)
    }
}

impl From<&[GlyphName]> for Item {
    fn from(src: &[GlyphName]) -> Item {
        Item::List(src.iter().map(|g| g.0.clone()).collect())
    }
}

/// A validated reference, usable inside a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlyphOrClass {
    Glyph(GlyphName),
    Class(GlyphClass),
}

impl GlyphOrClass {
    /// `true` if `glyph` is matched by this reference.
    pub fn contains(&self, glyph: &GlyphName) -> bool {
        match self {
            GlyphOrClass::Glyph(name) => name == glyph,
            GlyphOrClass::Class(class) => class.contains(glyph),
        }
    }
}

impl Display for GlyphOrClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlyphOrClass::Glyph(name) => Display::fmt(name, f),
            GlyphOrClass::Class(class) => Display::fmt(class.name(), f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_normalizes_sigil() {
        assert_eq!(ClassName::new("@any"), ClassName::new("any"));
        assert_eq!(ClassName::new("any").to_string(), "@any");
        assert_eq!(ClassName::new("@any").bare(), "any");
    }

    #[test]
    fn start_token_is_stripped() {
        let item = Item::from(["#start", "b", "o"]);
        assert!(item.has_start_token());
        assert_eq!(
            item.without_start_token(),
            vec![SmolStr::new("b"), SmolStr::new("o")]
        );

        let bare = Item::from("#start");
        assert!(bare.has_start_token());
        assert!(bare.without_start_token().is_empty());
    }

    #[test]
    fn items_deserialize_from_string_or_list() {
        let one: Item = serde_json::from_str("\"a\"").unwrap();
        let many: Item = serde_json::from_str("[\"a\", \"b\"]").unwrap();
        assert_eq!(one, Item::from("a"));
        assert_eq!(many, Item::from(["a", "b"]));
    }
}
