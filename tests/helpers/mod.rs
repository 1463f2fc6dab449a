#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use declmap::{index_source, DeclKind, Declaration, DeclarationIndex, ExtractOptions};

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

/// Extract a fixture with default options. The index is keyed by `relative`.
pub fn load(relative: &str) -> DeclarationIndex {
    let source = fs::read_to_string(fixture_path(relative)).unwrap();
    index_source(Path::new(relative), &source, &ExtractOptions::default()).unwrap()
}

pub fn names(index: &DeclarationIndex, kind: DeclKind) -> Vec<&str> {
    index.by_kind(kind).map(|d| d.name.as_str()).collect()
}

pub fn count(index: &DeclarationIndex, kind: DeclKind) -> usize {
    index.by_kind(kind).count()
}

/// The only declaration at `name_path`.
pub fn find<'a>(index: &'a DeclarationIndex, name_path: &str) -> &'a Declaration {
    let found = index.by_path(name_path);
    assert_eq!(found.len(), 1, "expected one declaration at {name_path}");
    found[0]
}

pub fn child_names<'a>(index: &'a DeclarationIndex, decl: &Declaration) -> Vec<&'a str> {
    index.children(decl.id).map(|d| d.name.as_str()).collect()
}
