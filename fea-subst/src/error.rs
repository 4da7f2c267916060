//! Error types related to rule compilation

use std::{io, path::PathBuf};

use smol_str::SmolStr;
use thiserror::Error;

use crate::rule::InstructionKind;

/// An error reported by a [`GlyphCatalog`](crate::GlyphCatalog).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Glyph set '{0}' does not exist")]
    MissingSet(SmolStr),
    #[error("Glyph set '{0}' already exists")]
    DuplicateSet(SmolStr),
    #[error("Glyph set '{set}' references glyphs that do not exist: {}", .glyphs.join(", "))]
    MissingGlyphs { set: SmolStr, glyphs: Vec<SmolStr> },
    #[error("Invalid glyph name {0:?}")]
    InvalidGlyphName(String),
    #[error("Glyph '{0}' is listed more than once")]
    DuplicateGlyph(SmolStr),
}

/// An error produced while compiling directives into lookups.
///
/// Any error aborts the directive that produced it; the feature is left as it
/// was before the directive started.
#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is neither a class, a preset, a gset nor a glyph")]
    UnresolvedReference(SmolStr),
    #[error("Unknown class setting '{setting}' in [{}]", .items.join(" "))]
    UnknownClassSetting {
        setting: SmolStr,
        items: Vec<SmolStr>,
    },
    #[error("Invalid replacement '{item}': {reason}")]
    InvalidReplacement { item: SmolStr, reason: &'static str },
    #[error("Target '{0}' must resolve to exactly one glyph")]
    InvalidTarget(String),
    #[error("A glyph list is empty once its settings are removed")]
    EmptyReference,
    #[error("Lookup '{lookup}' only accepts {expected} instructions, not {found}")]
    KindMismatch {
        lookup: SmolStr,
        expected: InstructionKind,
        found: InstructionKind,
    },
    #[error("[{rule}] conflicts with [{}] in lookup '{lookup}'", .conflicts.join("], ["))]
    Conflict {
        lookup: SmolStr,
        rule: String,
        conflicts: Vec<String>,
    },
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_error_is_send_and_sync() {
        fn send_me_baby<T: Send + Sync>() {}
        send_me_baby::<Error>();
    }

    #[test]
    fn conflict_message_lists_every_rule() {
        let err = Error::Conflict {
            lookup: "ccmp_sub_1".into(),
            rule: "sub o b' by b;".into(),
            conflicts: vec!["sub a' by o;".into(), "sub e' by o;".into()],
        };
        assert_eq!(
            err.to_string(),
            "[sub o b' by b;] conflicts with [sub a' by o;], [sub e' by o;] in lookup 'ccmp_sub_1'"
        );
    }
}
