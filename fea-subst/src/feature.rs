//! Turning high-level directives into lookups.
//!
//! A [`Feature`] owns the classes and lookups of one compilation. Each directive
//! is validated into one or more instructions, and each instruction goes into
//! the first existing lookup that can take it without conflict, or into a new
//! lookup appended at the end.
//!
//! Directives are all-or-nothing: if any part of a directive fails, classes
//! and lookups are restored to what they were before it started.

use std::fmt::Display;

use smol_str::SmolStr;

use crate::{
    catalog::GlyphCatalog,
    classes::{Checkpoint, ClassIndex, Preset},
    error::Error,
    lookup::Lookup,
    rule::{Instruction, InstructionKind, Rule, SubstitutionRule},
    types::{GlyphName, Item, CLASS_SIGIL},
};

/// Emitted verbatim at the top of every feature block.
const LANGUAGE_SYSTEMS: &[&str] = &[
    "script DFLT;",
    "language dflt;",
    "script latn;",
    "language dflt;",
];

/// A feature under construction.
#[derive(Debug)]
pub struct Feature<'a, C> {
    name: SmolStr,
    catalog: &'a C,
    classes: ClassIndex,
    lookups: Vec<Lookup>,
    counter: usize,
}

/// Everything needed to undo a failed directive.
struct Snapshot {
    classes: Checkpoint,
    lookup_lens: Vec<usize>,
    counter: usize,
}

impl<'a, C: GlyphCatalog> Feature<'a, C> {
    pub fn new(name: impl Into<SmolStr>, catalog: &'a C) -> Self {
        Feature {
            name: name.into(),
            catalog,
            classes: ClassIndex::new(),
            lookups: Vec::new(),
            counter: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &ClassIndex {
        &self.classes
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    /// Replace `target` with `replacement` wherever it occurs.
    pub fn replace(
        &mut self,
        target: impl Into<Item>,
        replacement: impl Into<Item>,
    ) -> Result<(), Error> {
        self.substitute(Vec::new(), target, Vec::new(), replacement)
    }

    /// Insert `left` before the target, keeping the target itself.
    ///
    /// If `target` names a gset, one rule is added per member.
    pub fn append_left(
        &mut self,
        backtrack: Vec<Item>,
        target: impl Into<Item>,
        lookahead: Vec<Item>,
        left: impl Into<Item>,
    ) -> Result<(), Error> {
        let target = target.into();
        let left = left.into();
        self.transaction(|feature| {
            let mut glyphs: Vec<GlyphName> = Vec::new();
            for name in target.names() {
                if feature.catalog.gset_exists(name) || feature.catalog.glyph_exists(name) {
                    glyphs.extend(feature.catalog.glyph_or_gset(name)?);
                } else {
                    glyphs.extend(feature.classes.expand(feature.catalog, name)?);
                }
            }
            if glyphs.is_empty() {
                return Err(Error::EmptyReference);
            }
            for glyph in glyphs {
                let replacement: Vec<SmolStr> = left
                    .names()
                    .map(SmolStr::new)
                    .chain(Some(SmolStr::new(glyph.as_str())))
                    .collect();
                feature.compile_rule(SubstitutionRule::new(
                    backtrack.clone(),
                    &glyph,
                    lookahead.clone(),
                    replacement,
                ))?;
            }
            Ok(())
        })
    }

    /// Replace the target with itself in this context.
    ///
    /// A lookup rewrites each glyph at most once, so this keeps later rules in
    /// the same lookup from touching the glyph.
    pub fn skip(
        &mut self,
        backtrack: Vec<Item>,
        target: impl Into<Item>,
        lookahead: Vec<Item>,
    ) -> Result<(), Error> {
        let target = target.into();
        self.substitute(backtrack, target.clone(), lookahead, target)
    }

    /// The general substitution directive.
    ///
    /// If the first backtrack slot contains `#start`, the rule also applies
    /// when the target is the first glyph of the sequence.
    pub fn substitute(
        &mut self,
        backtrack: Vec<Item>,
        target: impl Into<Item>,
        lookahead: Vec<Item>,
        replacement: impl Into<Item>,
    ) -> Result<(), Error> {
        let rule = SubstitutionRule::new(backtrack, target, lookahead, replacement);
        self.add_rule(rule)
    }

    /// Add an already assembled rule, as [`substitute`](Self::substitute) does.
    pub fn add_rule(&mut self, rule: SubstitutionRule) -> Result<(), Error> {
        self.transaction(|feature| feature.compile_rule(rule))
    }

    fn compile_rule(&mut self, rule: SubstitutionRule) -> Result<(), Error> {
        match rule.backtrack.first() {
            Some(first) if first.has_start_token() => self.expand_sequence_start(rule),
            _ => self.place(rule.into()),
        }
    }

    /// Emulate "preceded by one of these glyphs, or by nothing at all".
    ///
    /// Lookups can only match glyphs that are there, so the start of the
    /// sequence is reached by elimination: a new lookup first skips the target
    /// when it follows any glyph outside the allowed set, then applies the
    /// rule without its first backtrack slot.
    fn expand_sequence_start(&mut self, rule: SubstitutionRule) -> Result<(), Error> {
        let allowed = ClassIndex::filter_settings(&rule.backtrack[0].without_start_token())?;

        let excluded = if allowed.is_empty() {
            Some(Item::Name(SmolStr::new(format!(
                "{CLASS_SIGIL}{}",
                Preset::Any.name()
            ))))
        } else {
            let mut ordinary = rule.clone();
            ordinary.backtrack[0] = match allowed.as_slice() {
                [single] => Item::Name(single.clone()),
                _ => Item::List(allowed.clone()),
            };
            self.compile_rule(ordinary)?;

            let mut members = Vec::new();
            for name in &allowed {
                members.extend(self.classes.expand(self.catalog, name)?);
            }
            let complement = self.classes.complement(self.catalog, &members);
            (!complement.is_empty()).then(|| Item::from(complement.as_slice()))
        };

        let reduced = SubstitutionRule {
            backtrack: rule.backtrack[1..].to_vec(),
            ..rule.clone()
        };
        let skip = excluded.map(|excluded| {
            let mut backtrack = rule.backtrack.clone();
            backtrack[0] = excluded;
            SubstitutionRule::new(
                backtrack,
                rule.target.clone(),
                rule.lookahead.clone(),
                rule.target.clone(),
            )
        });

        let skip = skip.map(|skip| self.validate(skip.into())).transpose()?;
        let reduced = self.validate(reduced.into())?;
        let lookup = self.create_lookup(reduced.kind());
        if let Some(skip) = skip {
            lookup.add(skip, false)?;
        }
        lookup.add(reduced, true)
    }

    /// Put an instruction in the first lookup that accepts it.
    fn place(&mut self, rule: Rule) -> Result<(), Error> {
        let instruction = self.validate(rule)?;
        match self
            .lookups
            .iter_mut()
            .find(|lookup| lookup.accepts(&instruction))
        {
            Some(lookup) => lookup.add(instruction, false),
            None => self.create_lookup(instruction.kind()).add(instruction, false),
        }
    }

    fn validate(&mut self, rule: Rule) -> Result<Instruction, Error> {
        rule.validate(self.catalog, &mut self.classes)
    }

    fn create_lookup(&mut self, kind: InstructionKind) -> &mut Lookup {
        self.counter += 1;
        let name = format!("{}_{}_{}", self.name, kind.tag(), self.counter);
        log::debug!("new lookup '{name}'");
        let idx = self.lookups.len();
        self.lookups.push(Lookup::new(name, kind));
        &mut self.lookups[idx]
    }

    /// Run `op`, undoing all of its changes if it fails.
    fn transaction(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let snapshot = Snapshot {
            classes: self.classes.checkpoint(),
            lookup_lens: self.lookups.iter().map(Lookup::len).collect(),
            counter: self.counter,
        };
        let result = op(self);
        if let Err(err) = &result {
            log::debug!("rolling back '{}' after error: {err}", self.name);
            self.lookups.truncate(snapshot.lookup_lens.len());
            for (lookup, len) in self.lookups.iter_mut().zip(snapshot.lookup_lens) {
                lookup.truncate(len);
            }
            self.counter = snapshot.counter;
            self.classes.rollback(snapshot.classes);
        }
        result
    }

    /// The class declarations followed by the feature block.
    pub fn compile(&self) -> String {
        self.to_string()
    }
}

impl<C: GlyphCatalog> Display for Feature<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.classes.is_empty() {
            writeln!(f, "{}", self.classes)?;
        }
        writeln!(f, "feature {} {{", self.name)?;
        for line in LANGUAGE_SYSTEMS {
            writeln!(f, "    {line}")?;
        }
        writeln!(f)?;
        for lookup in &self.lookups {
            writeln!(f, "{lookup}")?;
            writeln!(f)?;
        }
        writeln!(f, "}} {};", self.name)
    }
}
