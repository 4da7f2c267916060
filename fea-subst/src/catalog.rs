//! The glyphs and gsets that rules may refer to.

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

use crate::{error::CatalogError, types::GlyphName};

/// A read-only view of the glyphs and glyph sets ("gsets") available to rules.
///
/// The catalog is expected to be fully loaded before compilation starts.
pub trait GlyphCatalog {
    fn glyph_exists(&self, name: &str) -> bool;

    fn gset_exists(&self, name: &str) -> bool;

    /// The members of a gset, in definition order.
    fn gset(&self, name: &str) -> Result<&[GlyphName], CatalogError>;

    /// Every known glyph, in catalog order.
    ///
    /// Classes derived from the whole catalog (the `any` preset, complements)
    /// use this order.
    fn glyph_order(&self) -> impl Iterator<Item = &GlyphName>;

    /// A glyph as a one-element list, or the members of a gset.
    ///
    /// Gset names win over glyph names.
    fn glyph_or_gset(&self, name: &str) -> Result<Vec<GlyphName>, CatalogError> {
        if self.gset_exists(name) {
            self.gset(name).map(<[_]>::to_vec)
        } else if self.glyph_exists(name) {
            Ok(vec![GlyphName::new(name)])
        } else {
            Err(CatalogError::MissingSet(name.into()))
        }
    }
}

/// An in-memory catalog: a glyph order plus named gsets.
#[derive(Clone, Debug, Default)]
pub struct GlyphSets {
    glyphs: IndexSet<GlyphName>,
    sets: IndexMap<SmolStr, Vec<GlyphName>>,
}

impl GlyphSets {
    pub fn new<T: Into<GlyphName>>(glyphs: impl IntoIterator<Item = T>) -> Self {
        GlyphSets {
            glyphs: glyphs.into_iter().map(Into::<GlyphName>::into).collect(),
            sets: IndexMap::new(),
        }
    }

    /// Parse a glyph order file: one name per line.
    ///
    /// Empty lines and lines starting with `#` are skipped. A name may only
    /// appear once.
    pub fn from_glyph_order(text: &str) -> Result<Self, CatalogError> {
        let mut glyphs = IndexSet::new();
        for line in text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
        {
            if line.bytes().any(|b| b.is_ascii_whitespace()) {
                return Err(CatalogError::InvalidGlyphName(line.to_string()));
            }
            if !glyphs.insert(GlyphName::new(line)) {
                return Err(CatalogError::DuplicateGlyph(line.into()));
            }
        }
        Ok(GlyphSets {
            glyphs,
            sets: IndexMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Define a new gset; every member must already be a known glyph.
    pub fn add_set<T: Into<GlyphName>>(
        &mut self,
        name: impl Into<SmolStr>,
        members: impl IntoIterator<Item = T>,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        let members: Vec<GlyphName> = members
            .into_iter()
            .map(Into::<GlyphName>::into)
            .collect();
        let missing: Vec<SmolStr> = members
            .iter()
            .filter(|glyph| !self.glyphs.contains(*glyph))
            .map(|glyph| glyph.as_str().into())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::MissingGlyphs {
                set: name,
                glyphs: missing,
            });
        }
        self.insert_set(name, members)
    }

    /// Define a new gset, registering unknown members as placeholder glyphs.
    ///
    /// Placeholders are appended to the glyph order. This lets gsets name
    /// intermediate glyphs that only exist as substitution steps.
    pub fn add_set_lenient<T: Into<GlyphName>>(
        &mut self,
        name: impl Into<SmolStr>,
        members: impl IntoIterator<Item = T>,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if self.sets.contains_key(&name) {
            return Err(CatalogError::DuplicateSet(name));
        }
        let members: Vec<GlyphName> = members
            .into_iter()
            .map(Into::<GlyphName>::into)
            .collect();
        for glyph in &members {
            if self.glyphs.insert(glyph.clone()) {
                log::warn!("gset '{name}' registers placeholder glyph '{glyph}'");
            }
        }
        self.insert_set(name, members)
    }

    /// Define a new gset as the concatenation of existing gsets.
    pub fn combine_sets(
        &mut self,
        name: impl Into<SmolStr>,
        existing: &[&str],
    ) -> Result<(), CatalogError> {
        let mut combined = Vec::new();
        for set in existing {
            combined.extend_from_slice(self.gset(set)?);
        }
        self.insert_set(name.into(), combined)
    }

    fn insert_set(&mut self, name: SmolStr, members: Vec<GlyphName>) -> Result<(), CatalogError> {
        if self.sets.contains_key(&name) {
            return Err(CatalogError::DuplicateSet(name));
        }
        log::debug!("gset '{name}' created with {} glyph(s)", members.len());
        self.sets.insert(name, members);
        Ok(())
    }
}

impl GlyphCatalog for GlyphSets {
    fn glyph_exists(&self, name: &str) -> bool {
        self.glyphs.contains(name)
    }

    fn gset_exists(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    fn gset(&self, name: &str) -> Result<&[GlyphName], CatalogError> {
        self.sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogError::MissingSet(name.into()))
    }

    fn glyph_order(&self) -> impl Iterator<Item = &GlyphName> {
        self.glyphs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> GlyphSets {
        let mut glyphs = GlyphSets::new(["a", "b", "o", "e"]);
        glyphs.add_set("vowels", ["a", "o", "e"]).unwrap();
        glyphs
    }

    #[test]
    fn glyph_order_skips_comments() {
        let glyphs = GlyphSets::from_glyph_order("# order\na\n\nb\no\n").unwrap();
        let order: Vec<_> = glyphs.glyph_order().map(GlyphName::as_str).collect();
        assert_eq!(order, ["a", "b", "o"]);
    }

    #[test]
    fn glyph_order_rejects_whitespace() {
        let err = GlyphSets::from_glyph_order("a\nb c\n").unwrap_err();
        assert_eq!(err, CatalogError::InvalidGlyphName("b c".into()));
    }

    #[test]
    fn glyph_order_rejects_duplicates() {
        let err = GlyphSets::from_glyph_order("a\nb\n# again\na\n").unwrap_err();
        assert_eq!(err, CatalogError::DuplicateGlyph("a".into()));
    }

    #[test]
    fn duplicate_set() {
        let mut glyphs = catalog();
        assert_eq!(
            glyphs.add_set("vowels", ["a"]),
            Err(CatalogError::DuplicateSet("vowels".into()))
        );
    }

    #[test]
    fn set_with_unknown_glyphs() {
        let mut glyphs = catalog();
        assert_eq!(
            glyphs.add_set("heads", ["head.a", "a", "head.o"]),
            Err(CatalogError::MissingGlyphs {
                set: "heads".into(),
                glyphs: vec!["head.a".into(), "head.o".into()],
            })
        );
        assert!(!glyphs.gset_exists("heads"));
    }

    #[test]
    fn lenient_set_registers_placeholders() {
        let mut glyphs = catalog();
        glyphs.add_set_lenient("heads", ["head.a", "a"]).unwrap();
        assert!(glyphs.glyph_exists("head.a"));
        let order: Vec<_> = glyphs.glyph_order().map(GlyphName::as_str).collect();
        assert_eq!(order, ["a", "b", "o", "e", "head.a"]);
    }

    #[test]
    fn combine() {
        let mut glyphs = catalog();
        glyphs.add_set("consonants", ["b"]).unwrap();
        glyphs.combine_sets("all", &["consonants", "vowels"]).unwrap();
        assert_eq!(
            glyphs.gset("all").unwrap(),
            &[
                GlyphName::new("b"),
                GlyphName::new("a"),
                GlyphName::new("o"),
                GlyphName::new("e")
            ]
        );
        assert_eq!(
            glyphs.combine_sets("more", &["nope"]),
            Err(CatalogError::MissingSet("nope".into()))
        );
    }

    #[test]
    fn glyph_or_gset() {
        let glyphs = catalog();
        assert_eq!(glyphs.glyph_or_gset("b").unwrap(), vec![GlyphName::new("b")]);
        assert_eq!(glyphs.glyph_or_gset("vowels").unwrap().len(), 3);
        assert!(glyphs.glyph_or_gset("z").is_err());
    }
}
