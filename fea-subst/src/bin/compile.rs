//! Compile a directive file into feature code.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use fea_subst::{output::write_features, FeatureSource, GlyphSets, SourceFormat};
use indexmap::IndexMap;
use log::info;

/// Compile substitution directives into OpenType feature code.
///
/// usage: DIRECTIVES --glyphs GLYPH_ORDER [--sets SETS]
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct Args {
    /// A YAML or JSON file listing the directives, in order.
    ///
    /// Files ending in `.json` are read as JSON, anything else as YAML.
    directives: PathBuf,

    /// Path to a file containing the glyph order.
    ///
    /// This should be a utf-8 encoded file with one name per line.
    #[arg(short, long)]
    glyphs: PathBuf,

    /// Path to a JSON object mapping gset names to lists of glyph names.
    #[arg(short, long)]
    sets: Option<PathBuf>,

    /// Reject gsets that name glyphs missing from the glyph order.
    ///
    /// By default such glyphs are registered as placeholders, with a warning.
    #[arg(long)]
    strict_sets: bool,

    /// Override the feature tag named in the directive file.
    #[arg(short, long)]
    feature: Option<String>,

    /// Where to write the feature code. Defaults to stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("io failed for '{0}': '{1}'")]
    File(PathBuf, #[source] io::Error),
    #[error("Invalid directives in '{0}': {1}")]
    Directives(PathBuf, #[source] fea_subst::directives::SourceError),
    #[error("Invalid gsets in '{0}': {1}")]
    Sets(PathBuf, #[source] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] fea_subst::CatalogError),
    #[error(transparent)]
    Compile(#[from] fea_subst::Error),
    #[error("io error: '{0}'")]
    Stdout(#[from] io::Error),
}

fn main() -> Result<(), Error> {
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{ts}: {style}{level}{style:#}: {}", record.args())
        })
        .init();

    let args = Args::parse();
    let catalog = args.load_catalog()?;
    let mut source = args.load_directives()?;
    if let Some(feature) = &args.feature {
        source.feature = feature.into();
    }
    info!(
        "compiling {} directive(s) into '{}' against {} glyph(s)",
        source.rules.len(),
        source.feature,
        catalog.len()
    );
    let features = source.compile(&catalog)?;

    match &args.out {
        Some(path) => write_features(path, &features)?,
        None => io::stdout().write_all(features.as_bytes())?,
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| Error::File(path.to_path_buf(), e))
}

impl Args {
    fn load_catalog(&self) -> Result<GlyphSets, Error> {
        let mut catalog = GlyphSets::from_glyph_order(&read(&self.glyphs)?)?;
        let Some(sets_path) = &self.sets else {
            return Ok(catalog);
        };
        let sets: IndexMap<String, Vec<String>> = serde_json::from_str(&read(sets_path)?)
            .map_err(|e| Error::Sets(sets_path.clone(), e))?;
        for (name, members) in sets {
            if self.strict_sets {
                catalog.add_set(name, members)?;
            } else {
                catalog.add_set_lenient(name, members)?;
            }
        }
        Ok(catalog)
    }

    fn load_directives(&self) -> Result<FeatureSource, Error> {
        let text = read(&self.directives)?;
        FeatureSource::parse(&text, SourceFormat::for_path(&self.directives))
            .map_err(|e| Error::Directives(self.directives.clone(), e))
    }
}
