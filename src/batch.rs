//! Parallel indexing of many files.
//!
//! Each file is parsed and extracted on tokio's blocking pool. A semaphore
//! caps how many run at once. Files are independent: one failing never
//! affects the others.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::{Config, FileRole};
use crate::error::{ExtractError, Result};
use crate::extract::{extract, ExtractOptions};
use crate::index::{DeclarationIndex, ProjectIndex};
use crate::parser::ParserRegistry;
use crate::workspace::{self, SourceFile};

/// Result of indexing one file.
#[derive(Debug)]
pub struct FileOutcome {
    /// Root-relative path.
    pub path: PathBuf,
    pub role: FileRole,
    pub result: Result<DeclarationIndex>,
}

/// Read, parse and extract one file. `relative` names the file in the index.
pub fn index_file(
    registry: &ParserRegistry,
    path: &Path,
    relative: &Path,
    options: &ExtractOptions,
) -> Result<DeclarationIndex> {
    let source = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
    let tree = registry.parse(relative, &source)?;
    Ok(extract(&tree, options))
}

/// Index `files` with at most `jobs` running at once. Outcomes are sorted by path.
pub async fn index_files(
    files: Vec<SourceFile>,
    options: ExtractOptions,
    jobs: usize,
) -> Vec<FileOutcome> {
    let registry = Arc::new(ParserRegistry::new());
    let options = Arc::new(options);
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));

    let mut handles = Vec::with_capacity(files.len());
    for file in files {
        // The semaphore is never closed.
        let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
        let registry = Arc::clone(&registry);
        let options = Arc::clone(&options);
        let (path, relative) = (file.path.clone(), file.relative.clone());
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            index_file(&registry, &path, &relative, &options)
        });
        handles.push((file, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (file, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ExtractError::Join(e.to_string())),
        };
        if let Err(e) = &result {
            warn!(path = %file.relative.display(), error = %e, "failed to index file");
        }
        outcomes.push(FileOutcome {
            path: file.relative,
            role: file.role,
            result,
        });
    }

    outcomes.sort_by(|a, b| a.path.cmp(&b.path));
    outcomes
}

/// Discover and index everything under `root`. Files that fail are logged
/// and left out of the project index.
pub async fn index_project(root: &Path, config: &Config) -> Result<ProjectIndex> {
    let registry = ParserRegistry::new();
    let classifier = config.classifier()?;
    let files = workspace::discover(root, &registry, &classifier, config);
    let total = files.len();

    let outcomes = index_files(files, config.extract_options(), config.jobs()).await;
    let indexes: Vec<DeclarationIndex> = outcomes.into_iter().filter_map(|o| o.result.ok()).collect();

    info!(
        files = indexes.len(),
        failed = total - indexes.len(),
        "indexed project"
    );
    Ok(ProjectIndex::new(root.to_path_buf(), indexes))
}

/// Bring `project` up to date after `changed` paths were touched on disk.
///
/// Only files that [`workspace::discover`] would return are re-indexed, so
/// ignore files and role filters apply exactly as on the first run. A changed
/// path that is no longer discoverable (deleted, ignored, excluded) is dropped
/// from the project. Files whose declarations come out unchanged are left
/// alone. Returns whether the project changed.
pub fn refresh(
    project: &mut ProjectIndex,
    root: &Path,
    config: &Config,
    changed: &[PathBuf],
) -> Result<bool> {
    let registry = ParserRegistry::new();
    let classifier = config.classifier()?;
    let options = config.extract_options();
    let indexable: HashMap<PathBuf, SourceFile> =
        workspace::discover(root, &registry, &classifier, config)
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

    let mut touched = false;
    for path in changed {
        let Some(file) = indexable.get(path) else {
            let Some(relative) = workspace::relative_path(root, path) else {
                continue;
            };
            if project.remove(&relative).is_some() {
                debug!(path = %relative.display(), "dropped from index");
                touched = true;
            }
            continue;
        };

        match index_file(&registry, &file.path, &file.relative, &options) {
            Ok(index) => {
                if project
                    .file(&file.relative)
                    .is_some_and(|old| old.unchanged_from(&index))
                {
                    debug!(path = %file.relative.display(), "unchanged");
                    continue;
                }
                debug!(path = %file.relative.display(), declarations = index.len(), "re-indexed");
                project.replace(index);
                touched = true;
            }
            Err(e) => warn!(path = %file.relative.display(), error = %e, "failed to re-index"),
        }
    }
    Ok(touched)
}
