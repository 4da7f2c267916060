//! End-to-end compilation of the files in test-data.

use std::{fs, path::Path};

use fea_subst::{
    output::write_features, Error, FeatureSource, GlyphCatalog, GlyphSets, SourceFormat,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

static TEST_DATA: &str = "./test-data";

fn read(name: &str) -> String {
    fs::read_to_string(Path::new(TEST_DATA).join(name)).unwrap()
}

fn catalog() -> GlyphSets {
    let mut catalog = GlyphSets::from_glyph_order(&read("glyph_order.txt")).unwrap();
    let sets: IndexMap<String, Vec<String>> = serde_json::from_str(&read("sets.json")).unwrap();
    for (name, members) in sets {
        catalog.add_set(name, members).unwrap();
    }
    catalog
}

fn source(name: &str) -> FeatureSource {
    FeatureSource::parse(&read(name), SourceFormat::for_path(Path::new(name))).unwrap()
}

#[test]
fn catalog_from_files() {
    let catalog = catalog();
    assert_eq!(catalog.len(), 8);
    assert!(catalog.gset_exists("Ha glyphs"));
    assert_eq!(catalog.glyph_or_gset("round").unwrap(), ["o", "e"]);
}

#[test]
fn compile_yaml_directives() {
    let _ = env_logger::builder().is_test(true).try_init();
    let catalog = catalog();
    let features = source("ccmp.yaml").compile(&catalog).unwrap();
    assert_eq!(features, read("ccmp.fea"));
}

#[test]
fn compile_and_write() {
    let catalog = catalog();
    let features = source("ccmp.yaml").compile(&catalog).unwrap();

    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("out/ccmp.fea");
    write_features(&path, &features).unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), read("ccmp.fea"));
}

#[test]
fn failing_directive_fails_the_file() {
    let catalog = catalog();
    let source = source("bad_replacement.json");
    assert_eq!(source.feature, "liga");
    let err = source.compile(&catalog).unwrap_err();
    assert!(
        matches!(&err, Error::InvalidReplacement { item, .. } if item == "@round"),
        "{err}"
    );
}

#[test]
fn strict_sets_reject_unknown_glyphs() {
    let mut catalog = catalog();
    assert!(catalog.add_set("marks", ["Ha", "virama"]).is_err());
    catalog.add_set_lenient("marks", ["Ha", "virama"]).unwrap();
    assert!(catalog.glyph_exists("virama"));
}
