//! Glyph classes, created on demand and deduplicated by membership.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    catalog::GlyphCatalog,
    error::Error,
    types::{ClassName, GlyphClass, GlyphName, GlyphOrClass, Item, CLASS_SIGIL, SETTING_MARKER},
};

/// A setting token that is accepted in glyph lists and dropped.
const NOOP_SETTING: &str = "#example";

/// Prefix for the names of classes minted from anonymous glyph lists.
const ANON_CLASS_PREFIX: &str = "class";

/// Classes whose members are computed from the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Every glyph in the catalog, in catalog order.
    Any,
}

impl Preset {
    fn from_name(bare: &str) -> Option<Preset> {
        match bare {
            "any" => Some(Preset::Any),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Any => "any",
        }
    }

    fn glyphs(self, catalog: &impl GlyphCatalog) -> Vec<GlyphName> {
        match self {
            Preset::Any => catalog.glyph_order().cloned().collect(),
        }
    }
}

/// What a single name refers to.
enum Named<'a> {
    Class(GlyphClass),
    Preset(Preset),
    Gset(&'a [GlyphName]),
    Glyph(GlyphName),
}

/// The classes of one compilation, in creation order.
///
/// No two classes have the same members: asking for a class with the members
/// of an existing one returns the existing one.
#[derive(Clone, Debug, Default)]
pub struct ClassIndex {
    classes: IndexMap<ClassName, GlyphClass>,
    presets: HashMap<Preset, ClassName>,
    next_id: usize,
}

/// The state of a [`ClassIndex`] at some point, for rolling back.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint {
    len: usize,
    next_id: usize,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate classes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &GlyphClass> + '_ {
        self.classes.values()
    }

    /// Look up a class (or a materialized preset) by name, with or without sigil.
    pub fn get(&self, name: &str) -> Option<&GlyphClass> {
        let name = ClassName::new(name);
        if let Some(alias) = Preset::from_name(name.bare()).and_then(|p| self.presets.get(&p)) {
            return self.classes.get(alias);
        }
        self.classes.get(&name)
    }

    /// Turn an item into something that can be written in a rule.
    ///
    /// Single glyphs are returned as is. Gsets and literal lists with more than
    /// one glyph become classes, reusing a class with the same members if one
    /// exists. Class and preset names are checked, and presets are materialized
    /// the first time they are used.
    pub fn resolve_reference(
        &mut self,
        catalog: &impl GlyphCatalog,
        item: &Item,
    ) -> Result<GlyphOrClass, Error> {
        match item {
            Item::Name(name) if name.starts_with(SETTING_MARKER) => {
                self.resolve_list(catalog, std::slice::from_ref(name))
            }
            Item::Name(name) => match self.classify(catalog, name)? {
                Named::Class(class) => Ok(GlyphOrClass::Class(class)),
                Named::Preset(preset) => self.materialize(catalog, preset).map(GlyphOrClass::Class),
                Named::Gset(members) => self.class_or_glyph(members.to_vec()),
                Named::Glyph(glyph) => Ok(GlyphOrClass::Glyph(glyph)),
            },
            Item::List(names) => self.resolve_list(catalog, names),
        }
    }

    /// The glyphs a single name stands for, without creating any class.
    ///
    /// The no-op setting stands for nothing.
    pub fn expand(&self, catalog: &impl GlyphCatalog, name: &str) -> Result<Vec<GlyphName>, Error> {
        if name.starts_with(SETTING_MARKER) {
            return Self::filter_settings(&[SmolStr::new(name)]).map(|_| Vec::new());
        }
        Ok(match self.classify(catalog, name)? {
            Named::Class(class) => class.glyphs().to_vec(),
            Named::Preset(preset) => preset.glyphs(catalog),
            Named::Gset(members) => members.to_vec(),
            Named::Glyph(glyph) => vec![glyph],
        })
    }

    /// Every catalog glyph not in `members`, in catalog order.
    pub fn complement(&self, catalog: &impl GlyphCatalog, members: &[GlyphName]) -> Vec<GlyphName> {
        let members: HashSet<&GlyphName> = members.iter().collect();
        catalog
            .glyph_order()
            .filter(|glyph| !members.contains(glyph))
            .cloned()
            .collect()
    }

    /// The class with exactly these members, created if needed.
    pub fn class_for(&mut self, glyphs: Vec<GlyphName>) -> GlyphClass {
        if let Some(existing) = self.find(&glyphs) {
            log::trace!("reusing {} for [{}]", existing.name(), join(&glyphs));
            return existing.clone();
        }
        let name = loop {
            let candidate = ClassName::new(format!("{ANON_CLASS_PREFIX}{}", self.next_id));
            self.next_id += 1;
            if !self.classes.contains_key(&candidate) {
                break candidate;
            }
        };
        self.insert(name, glyphs)
    }

    fn find(&self, glyphs: &[GlyphName]) -> Option<&GlyphClass> {
        self.classes.values().find(|class| class.glyphs() == glyphs)
    }

    fn insert(&mut self, name: ClassName, glyphs: Vec<GlyphName>) -> GlyphClass {
        log::trace!("new class {name} = [{}]", join(&glyphs));
        let class = GlyphClass::new(name.clone(), glyphs);
        self.classes.insert(name, class.clone());
        class
    }

    fn classify<'a, C: GlyphCatalog>(
        &self,
        catalog: &'a C,
        name: &str,
    ) -> Result<Named<'a>, Error> {
        if let Some(bare) = name.strip_prefix(CLASS_SIGIL) {
            return match (self.get(bare), Preset::from_name(bare)) {
                (Some(class), _) => Ok(Named::Class(class.clone())),
                (None, Some(preset)) => Ok(Named::Preset(preset)),
                (None, None) => Err(Error::UnresolvedReference(name.into())),
            };
        }
        if let Some(class) = self.get(name) {
            Ok(Named::Class(class.clone()))
        } else if catalog.gset_exists(name) {
            Ok(Named::Gset(catalog.gset(name)?))
        } else if catalog.glyph_exists(name) {
            Ok(Named::Glyph(GlyphName::new(name)))
        } else if let Some(preset) = Preset::from_name(name) {
            Ok(Named::Preset(preset))
        } else {
            Err(Error::UnresolvedReference(name.into()))
        }
    }

    fn materialize(
        &mut self,
        catalog: &impl GlyphCatalog,
        preset: Preset,
    ) -> Result<GlyphClass, Error> {
        let glyphs = preset.glyphs(catalog);
        if glyphs.is_empty() {
            return Err(Error::EmptyReference);
        }
        let class = match self.find(&glyphs) {
            Some(existing) => existing.clone(),
            None => self.insert(ClassName::new(preset.name()), glyphs),
        };
        self.presets.insert(preset, class.name().clone());
        Ok(class)
    }

    fn resolve_list(
        &mut self,
        catalog: &impl GlyphCatalog,
        names: &[SmolStr],
    ) -> Result<GlyphOrClass, Error> {
        let glyphs = Self::filter_settings(names)?
            .into_iter()
            .map(|name| {
                if catalog.glyph_exists(&name) {
                    Ok(GlyphName::from(name))
                } else {
                    Err(Error::UnresolvedReference(name))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.class_or_glyph(glyphs)
    }

    fn class_or_glyph(&mut self, mut glyphs: Vec<GlyphName>) -> Result<GlyphOrClass, Error> {
        match glyphs.len() {
            0 => Err(Error::EmptyReference),
            1 => Ok(GlyphOrClass::Glyph(glyphs.remove(0))),
            _ => Ok(GlyphOrClass::Class(self.class_for(glyphs))),
        }
    }

    /// Drop no-op settings from a glyph list, rejecting any other setting.
    pub(crate) fn filter_settings(names: &[SmolStr]) -> Result<Vec<SmolStr>, Error> {
        let mut result = Vec::with_capacity(names.len());
        for name in names {
            if name == NOOP_SETTING {
                continue;
            }
            if name.starts_with(SETTING_MARKER) {
                return Err(Error::UnknownClassSetting {
                    setting: name.clone(),
                    items: names.to_vec(),
                });
            }
            result.push(name.clone());
        }
        Ok(result)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.classes.len(),
            next_id: self.next_id,
        }
    }

    /// Forget every class created since `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.classes.truncate(checkpoint.len);
        self.next_id = checkpoint.next_id;
        let classes = &self.classes;
        self.presets.retain(|_, name| classes.contains_key(name));
    }
}

impl Display for ClassIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for class in self.classes.values() {
            writeln!(f, "{} = [ {} ];", class.name(), join(class.glyphs()))?;
        }
        Ok(())
    }
}

fn join(glyphs: &[GlyphName]) -> String {
    glyphs
        .iter()
        .map(GlyphName::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
