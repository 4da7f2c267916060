//! Directive files: a feature name plus an ordered list of directives.
//!
//! ```yaml
//! feature: ccmp
//! rules:
//!   - op: replace
//!     target: f
//!     replacement: f2
//!   - op: append_left
//!     target: Ha glyphs
//!     left: Ha
//!   - op: substitute
//!     backtrack: [["#start", b]]
//!     target: a
//!     replacement: e
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{catalog::GlyphCatalog, error::Error, feature::Feature, types::Item};

/// The feature tag used when a directive file does not name one.
pub const DEFAULT_FEATURE: &str = "ccmp";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSource {
    #[serde(default = "default_feature")]
    pub feature: SmolStr,
    #[serde(default)]
    pub rules: Vec<Directive>,
}

fn default_feature() -> SmolStr {
    SmolStr::new_inline(DEFAULT_FEATURE)
}

/// One line of a directive file; see the verbs on [`Feature`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Directive {
    Replace {
        target: Item,
        replacement: Item,
    },
    AppendLeft {
        #[serde(default)]
        backtrack: Vec<Item>,
        target: Item,
        #[serde(default)]
        lookahead: Vec<Item>,
        left: Item,
    },
    Skip {
        #[serde(default)]
        backtrack: Vec<Item>,
        target: Item,
        #[serde(default)]
        lookahead: Vec<Item>,
    },
    Substitute {
        #[serde(default)]
        backtrack: Vec<Item>,
        target: Item,
        #[serde(default)]
        lookahead: Vec<Item>,
        replacement: Item,
    },
}

/// The formats a directive file can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// Guess the format from a file extension; anything but `.json` is YAML.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => SourceFormat::Json,
            _ => SourceFormat::Yaml,
        }
    }
}

/// An error loading a directive file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeatureSource {
    pub fn parse(text: &str, format: SourceFormat) -> Result<Self, SourceError> {
        match format {
            SourceFormat::Yaml => serde_yaml::from_str(text).map_err(Into::into),
            SourceFormat::Json => serde_json::from_str(text).map_err(Into::into),
        }
    }

    /// Apply every directive in order, stopping at the first failure.
    pub fn build<'a, C: GlyphCatalog>(&self, catalog: &'a C) -> Result<Feature<'a, C>, Error> {
        let mut feature = Feature::new(self.feature.clone(), catalog);
        for (i, directive) in self.rules.iter().enumerate() {
            log::debug!("directive {i}: {directive:?}");
            directive.apply(&mut feature)?;
        }
        Ok(feature)
    }

    /// Build the feature and render it.
    pub fn compile(&self, catalog: &impl GlyphCatalog) -> Result<String, Error> {
        self.build(catalog).map(|feature| feature.compile())
    }
}

impl Directive {
    pub fn apply<C: GlyphCatalog>(&self, feature: &mut Feature<'_, C>) -> Result<(), Error> {
        match self.clone() {
            Directive::Replace {
                target,
                replacement,
            } => feature.replace(target, replacement),
            Directive::AppendLeft {
                backtrack,
                target,
                lookahead,
                left,
            } => feature.append_left(backtrack, target, lookahead, left),
            Directive::Skip {
                backtrack,
                target,
                lookahead,
            } => feature.skip(backtrack, target, lookahead),
            Directive::Substitute {
                backtrack,
                target,
                lookahead,
                replacement,
            } => feature.substitute(backtrack, target, lookahead, replacement),
        }
    }
}
