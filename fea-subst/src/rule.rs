//! Rules as written, and the validated instructions they become.

use std::fmt::Display;

use smol_str::SmolStr;

use crate::{
    catalog::GlyphCatalog,
    classes::ClassIndex,
    error::Error,
    types::{GlyphName, GlyphOrClass, Item, CLASS_SIGIL},
};

/// The kinds of instruction a lookup can hold.
///
/// A lookup holds instructions of exactly one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Substitution,
}

impl InstructionKind {
    /// The short tag used when naming lookups of this kind.
    pub fn tag(self) -> &'static str {
        match self {
            InstructionKind::Substitution => "sub",
        }
    }
}

impl Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionKind::Substitution => f.write_str("substitution"),
        }
    }
}

/// An unvalidated rule, holding references exactly as they were written.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Substitution(SubstitutionRule),
}

/// A contextual single-glyph substitution, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstitutionRule {
    pub backtrack: Vec<Item>,
    pub target: Item,
    pub lookahead: Vec<Item>,
    pub replacement: Item,
}

/// A validated rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Substitution(Substitution),
}

/// A validated substitution: `sub <backtrack> <target>' <lookahead> by <replacement>;`
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    pub backtrack: Vec<GlyphOrClass>,
    pub target: GlyphName,
    pub lookahead: Vec<GlyphOrClass>,
    pub replacement: Vec<GlyphName>,
}

impl Rule {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Rule::Substitution(_) => InstructionKind::Substitution,
        }
    }

    /// Resolve every reference in this rule.
    ///
    /// The first invalid reference fails the whole rule. Classes may be added to
    /// `classes` along the way; callers that need a clean failure should take a
    /// checkpoint first.
    pub fn validate(
        self,
        catalog: &impl GlyphCatalog,
        classes: &mut ClassIndex,
    ) -> Result<Instruction, Error> {
        match self {
            Rule::Substitution(rule) => rule
                .validate(catalog, classes)
                .map(Instruction::Substitution),
        }
    }
}

impl From<SubstitutionRule> for Rule {
    fn from(src: SubstitutionRule) -> Rule {
        Rule::Substitution(src)
    }
}

impl SubstitutionRule {
    pub fn new(
        backtrack: Vec<Item>,
        target: impl Into<Item>,
        lookahead: Vec<Item>,
        replacement: impl Into<Item>,
    ) -> Self {
        SubstitutionRule {
            backtrack,
            target: target.into(),
            lookahead,
            replacement: replacement.into(),
        }
    }

    pub fn validate(
        self,
        catalog: &impl GlyphCatalog,
        classes: &mut ClassIndex,
    ) -> Result<Substitution, Error> {
        let backtrack = self
            .backtrack
            .iter()
            .map(|item| classes.resolve_reference(catalog, item))
            .collect::<Result<Vec<_>, _>>()?;
        let target = match classes.resolve_reference(catalog, &self.target)? {
            GlyphOrClass::Glyph(glyph) => glyph,
            GlyphOrClass::Class(class) => {
                return Err(Error::InvalidTarget(class.name().to_string()))
            }
        };
        let lookahead = self
            .lookahead
            .iter()
            .map(|item| classes.resolve_reference(catalog, item))
            .collect::<Result<Vec<_>, _>>()?;
        let replacement = resolve_replacement(catalog, &self.replacement)?;
        Ok(Substitution {
            backtrack,
            target,
            lookahead,
            replacement,
        })
    }
}

/// Replacement glyphs are written literally, so they never become classes.
fn resolve_replacement(
    catalog: &impl GlyphCatalog,
    item: &Item,
) -> Result<Vec<GlyphName>, Error> {
    let mut glyphs = Vec::new();
    for name in item.names() {
        if name.starts_with(CLASS_SIGIL) {
            return Err(Error::InvalidReplacement {
                item: name.into(),
                reason: "classes cannot be used as replacements",
            });
        }
        if catalog.gset_exists(name) {
            glyphs.extend_from_slice(catalog.gset(name)?);
        } else if catalog.glyph_exists(name) {
            glyphs.push(GlyphName::new(name));
        } else {
            return Err(Error::InvalidReplacement {
                item: name.into(),
                reason: "neither a glyph nor a gset",
            });
        }
    }
    if glyphs.is_empty() {
        return Err(Error::InvalidReplacement {
            item: SmolStr::default(),
            reason: "the replacement is empty",
        });
    }
    Ok(glyphs)
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Substitution(_) => InstructionKind::Substitution,
        }
    }

    /// `true` if this instruction cannot share a lookup with `existing`.
    ///
    /// Rules in one lookup all match against the sequence as it was before the
    /// lookup ran. Two rules conflict when one inserts a glyph the other
    /// expects as backtrack context, or when both rewrite the same target.
    pub fn conflicts_with(&self, existing: &Instruction) -> bool {
        match (self, existing) {
            (Instruction::Substitution(new), Instruction::Substitution(old)) => {
                new.conflicts_with(old)
            }
        }
    }
}

impl Substitution {
    pub fn conflicts_with(&self, existing: &Substitution) -> bool {
        let feeds = |replacement: &[GlyphName], backtrack: &[GlyphOrClass]| {
            replacement
                .iter()
                .any(|glyph| backtrack.iter().any(|ctx| ctx.contains(glyph)))
        };
        feeds(&self.replacement, &existing.backtrack)
            || feeds(&existing.replacement, &self.backtrack)
            || self.target == existing.target
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Substitution(sub) => Display::fmt(sub, f),
        }
    }
}

impl Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("sub ")?;
        for item in &self.backtrack {
            write!(f, "{item} ")?;
        }
        write!(f, "{}'", self.target)?;
        for item in &self.lookahead {
            write!(f, " {item}")?;
        }
        f.write_str(" by")?;
        for glyph in &self.replacement {
            write!(f, " {glyph}")?;
        }
        f.write_str(";")
    }
}
