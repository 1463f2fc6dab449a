//! Source file discovery under a project root.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::config::{Config, FileRole, RoleClassifier};
use crate::parser::ParserRegistry;

/// A file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk.
    pub path: PathBuf,
    /// Path relative to the project root, with `/` separators. Used in symbol ids.
    pub relative: PathBuf,
    pub role: FileRole,
}

impl SourceFile {
    /// Classify `path` against `root`. Returns `None` for files outside the
    /// root or in languages no parser handles.
    pub fn classify(
        root: &Path,
        path: &Path,
        registry: &ParserRegistry,
        classifier: &RoleClassifier,
    ) -> Option<Self> {
        registry.parser_for(path)?;
        let relative = relative_path(root, path)?;
        let role = classifier.classify(&relative);
        Some(Self {
            path: path.to_path_buf(),
            relative,
            role,
        })
    }
}

/// Root-relative form of `path` with forward slashes.
pub fn relative_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    Some(PathBuf::from(rel.to_string_lossy().replace('\\', "/")))
}

/// Walk `root` respecting `.gitignore` and friends, returning every supported
/// file whose role is included by `config`, sorted by relative path.
pub fn discover(
    root: &Path,
    registry: &ParserRegistry,
    classifier: &RoleClassifier,
    config: &Config,
) -> Vec<SourceFile> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .require_git(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading file entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(file) = SourceFile::classify(root, entry.path(), registry, classifier) else {
            continue;
        };
        if file.role == FileRole::Ignore || !config.includes(file.role) {
            continue;
        }
        files.push(file);
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(root = %root.display(), files = files.len(), "discovered source files");
    files
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    // Default temp dir names start with a dot, which the walker treats as hidden.
    fn project_dir() -> TempDir {
        tempfile::Builder::new().prefix("declmap").tempdir().unwrap()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export const x = 1;\n").unwrap();
    }

    #[test]
    fn discovers_supported_files_by_role() {
        let dir = project_dir();
        let root = dir.path();
        touch(root, "src/app.ts");
        touch(root, "src/view.jsx");
        touch(root, "src/app.test.ts");
        touch(root, "docs/example.js");
        touch(root, "node_modules/dep/index.js");
        touch(root, "README.md");

        let config = Config::default();
        let files = discover(
            root,
            &ParserRegistry::new(),
            &config.classifier().unwrap(),
            &config,
        );
        let found: Vec<_> = files
            .iter()
            .map(|f| (f.relative.to_string_lossy().to_string(), f.role))
            .collect();
        assert_eq!(
            found,
            vec![
                ("src/app.test.ts".to_string(), FileRole::Tests),
                ("src/app.ts".to_string(), FileRole::Source),
                ("src/view.jsx".to_string(), FileRole::Source),
            ]
        );
    }

    #[test]
    fn gitignored_files_are_skipped() {
        let dir = project_dir();
        let root = dir.path();
        touch(root, "src/keep.ts");
        touch(root, "gen/skip.ts");
        fs::write(root.join(".gitignore"), "gen/\n").unwrap();

        let config = Config::default();
        let files = discover(
            root,
            &ParserRegistry::new(),
            &config.classifier().unwrap(),
            &config,
        );
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("src/keep.ts"));
    }

    #[test]
    fn classify_rejects_outside_paths() {
        let registry = ParserRegistry::new();
        let classifier = RoleClassifier::default();
        assert!(SourceFile::classify(
            Path::new("/repo"),
            Path::new("/elsewhere/a.ts"),
            &registry,
            &classifier
        )
        .is_none());
        assert!(SourceFile::classify(
            Path::new("/repo"),
            Path::new("/repo/a.py"),
            &registry,
            &classifier
        )
        .is_none());
    }
}
