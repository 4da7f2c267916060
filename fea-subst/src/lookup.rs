//! Named groups of rules that are applied in a single pass.

use std::fmt::Display;

use smol_str::SmolStr;

use crate::{
    error::Error,
    rule::{Instruction, InstructionKind},
};

const INDENT: &str = "    ";

/// A named, ordered list of instructions of a single kind.
///
/// Members never conflict with each other (see [`Instruction::conflicts_with`])
/// unless they were added with `force`.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookup {
    name: SmolStr,
    kind: InstructionKind,
    instructions: Vec<Instruction>,
}

impl Lookup {
    pub fn new(name: impl Into<SmolStr>, kind: InstructionKind) -> Self {
        Lookup {
            name: name.into(),
            kind,
            instructions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InstructionKind {
        self.kind
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The members that `instruction` conflicts with.
    pub fn conflicts<'a>(
        &'a self,
        instruction: &'a Instruction,
    ) -> impl Iterator<Item = &'a Instruction> + 'a {
        self.instructions
            .iter()
            .filter(move |existing| instruction.conflicts_with(existing))
    }

    /// `true` if `instruction` could be added without forcing.
    pub fn accepts(&self, instruction: &Instruction) -> bool {
        instruction.kind() == self.kind && self.conflicts(instruction).next().is_none()
    }

    /// Append an instruction.
    ///
    /// Fails if the instruction is of the wrong kind, or if it conflicts with
    /// a member and `force` is false. Forced additions are kept even when they
    /// conflict.
    pub fn add(&mut self, instruction: Instruction, force: bool) -> Result<(), Error> {
        if instruction.kind() != self.kind {
            return Err(Error::KindMismatch {
                lookup: self.name.clone(),
                expected: self.kind,
                found: instruction.kind(),
            });
        }
        let conflicts: Vec<String> = self
            .conflicts(&instruction)
            .map(ToString::to_string)
            .collect();
        if !conflicts.is_empty() {
            if !force {
                return Err(Error::Conflict {
                    lookup: self.name.clone(),
                    rule: instruction.to_string(),
                    conflicts,
                });
            }
            log::warn!(
                "forcing [{instruction}] into '{}' despite conflicts with [{}]",
                self.name,
                conflicts.join("], [")
            );
        }
        log::debug!("'{}' += [{instruction}]", self.name);
        self.instructions.push(instruction);
        Ok(())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.instructions.truncate(len);
    }
}

impl Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{INDENT}lookup {} {{", self.name)?;
        for instruction in &self.instructions {
            writeln!(f, "{INDENT}{INDENT}{instruction}")?;
        }
        write!(f, "{INDENT}}} {};", self.name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        catalog::GlyphSets,
        classes::ClassIndex,
        rule::{Rule, SubstitutionRule},
        types::Item,
    };

    fn instruction(backtrack: &[&str], target: &str, replacement: &str) -> Instruction {
        let catalog = GlyphSets::new(["a", "b", "o", "e"]);
        let backtrack = backtrack.iter().map(|name| Item::from(*name)).collect();
        Rule::from(SubstitutionRule::new(backtrack, target, vec![], replacement))
            .validate(&catalog, &mut ClassIndex::new())
            .unwrap()
    }

    #[test]
    fn accepts_unrelated_rules() {
        let mut lookup = Lookup::new("ccmp_sub_1", InstructionKind::Substitution);
        lookup.add(instruction(&[], "a", "o"), false).unwrap();
        lookup.add(instruction(&["b"], "e", "o"), false).unwrap();
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn rejects_second_rule_for_target() {
        let mut lookup = Lookup::new("ccmp_sub_1", InstructionKind::Substitution);
        lookup.add(instruction(&[], "a", "o"), false).unwrap();
        let err = lookup
            .add(instruction(&["b"], "a", "e"), false)
            .unwrap_err();
        assert!(
            matches!(&err, Error::Conflict { conflicts, .. } if conflicts == &["sub a' by o;"]),
            "{err}"
        );
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn rejects_rule_reading_a_replacement() {
        let mut lookup = Lookup::new("ccmp_sub_1", InstructionKind::Substitution);
        lookup.add(instruction(&[], "a", "o"), false).unwrap();
        let candidate = instruction(&["o"], "b", "b");
        assert!(!lookup.accepts(&candidate));
        assert!(lookup.add(candidate, false).is_err());
    }

    #[test]
    fn force_keeps_conflicting_rule() {
        let mut lookup = Lookup::new("ccmp_sub_1", InstructionKind::Substitution);
        lookup.add(instruction(&["o"], "a", "a"), false).unwrap();
        lookup.add(instruction(&[], "a", "e"), true).unwrap();
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn renders_block_in_insertion_order() {
        let mut lookup = Lookup::new("ccmp_sub_1", InstructionKind::Substitution);
        lookup.add(instruction(&[], "a", "o"), false).unwrap();
        lookup.add(instruction(&["b"], "e", "b"), false).unwrap();
        assert_eq!(
            lookup.to_string(),
            "    lookup ccmp_sub_1 {\n        sub a' by o;\n        \
             sub b e' by b;\n    } ccmp_sub_1;"
        );
    }
}
