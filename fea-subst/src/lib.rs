//! Compiling contextual glyph substitution directives into OpenType feature code.
//!
//! Directives ("replace this glyph", "skip it in this context", "only at the
//! start of the sequence") are validated against a [`GlyphCatalog`], grouped
//! into lookups so that no two rules in a lookup interfere, and rendered as
//! feature file syntax: glyph class declarations followed by one feature block.

mod catalog;
mod classes;
pub mod directives;
mod error;
mod feature;
mod lookup;
pub mod output;
mod rule;
mod types;

pub use catalog::{GlyphCatalog, GlyphSets};
pub use classes::{ClassIndex, Preset};
pub use directives::{Directive, FeatureSource, SourceFormat};
pub use error::{CatalogError, Error};
pub use feature::Feature;
pub use lookup::Lookup;
pub use rule::{Instruction, InstructionKind, Rule, Substitution, SubstitutionRule};
pub use types::{ClassName, GlyphClass, GlyphName, GlyphOrClass, Item, START_TOKEN};
