//! Configuration handling for declmap.
//!
//! Settings come from an optional `declmap.toml` at the project root; CLI
//! flags override them afterwards.

use std::fs;
use std::io;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};
use crate::extract::ExtractOptions;

/// What a file is for. Decides whether it is indexed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Source,
    Tests,
    Docs,
    Ignore,
}

/// A `{ pattern, role }` entry from the `rules` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub pattern: String,
    pub role: FileRole,
}

/// declmap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Deepest container nesting that is descended into
    pub max_depth: usize,

    /// Summary truncation length
    pub summary_max_chars: usize,

    /// Worker count for batch indexing; defaults to available parallelism
    pub jobs: Option<usize>,

    /// Recognize describe/it/test calls
    pub detect_tests: bool,

    /// Roles that get indexed
    pub include_roles: Vec<FileRole>,

    /// Extra role rules, checked before the built-in ones
    pub rules: Vec<RoleRule>,
}

impl Default for Config {
    fn default() -> Self {
        let extract = ExtractOptions::default();
        Self {
            max_depth: extract.max_depth,
            summary_max_chars: extract.summary_max_chars,
            jobs: None,
            detect_tests: extract.detect_tests,
            include_roles: vec![FileRole::Source, FileRole::Tests],
            rules: Vec::new(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "declmap.toml";

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ExtractError::io(path, e)),
        };
        Self::parse(&text)
    }

    /// Load `declmap.toml` from the project root, if there is one.
    pub fn discover(root: &Path) -> Result<Self> {
        Self::load(&root.join(Self::FILE_NAME))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ExtractError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Run on every parsed file; callers that override
    /// fields afterwards call it again.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ExtractError::Config("max_depth must be at least 1".into()));
        }
        if self.summary_max_chars == 0 {
            return Err(ExtractError::Config(
                "summary_max_chars must be at least 1".into(),
            ));
        }
        if self.jobs == Some(0) {
            return Err(ExtractError::Config("jobs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_depth: self.max_depth,
            summary_max_chars: self.summary_max_chars,
            detect_tests: self.detect_tests,
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn includes(&self, role: FileRole) -> bool {
        self.include_roles.contains(&role)
    }

    pub fn classifier(&self) -> Result<RoleClassifier> {
        RoleClassifier::new(&self.rules)
    }
}

const GLOBAL_RULES: &[(&str, FileRole)] = &[
    ("tests/**", FileRole::Tests),
    ("test/**", FileRole::Tests),
    ("**/testdata/**", FileRole::Tests),
    ("docs/**", FileRole::Docs),
    ("doc/**", FileRole::Docs),
    (".git/**", FileRole::Ignore),
];

const SCRIPT_RULES: &[(&str, FileRole)] = &[
    ("**/node_modules/**", FileRole::Ignore),
    ("**/dist/**", FileRole::Ignore),
    ("**/build/**", FileRole::Ignore),
    ("**/*.test.*", FileRole::Tests),
    ("**/*.spec.*", FileRole::Tests),
];

/// Ordered glob rules mapping a root-relative path to its [`FileRole`].
/// The first matching rule wins; unmatched paths are `Source`.
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    rules: Vec<(Pattern, FileRole)>,
}

impl RoleClassifier {
    pub fn new(extra: &[RoleRule]) -> Result<Self> {
        let configured = extra.iter().map(|r| (r.pattern.as_str(), r.role));
        let builtin = GLOBAL_RULES.iter().chain(SCRIPT_RULES).copied();
        let rules = configured
            .chain(builtin)
            .map(|(pattern, role)| {
                Pattern::new(pattern)
                    .map(|p| (p, role))
                    .map_err(|e| ExtractError::Config(format!("bad rule pattern `{pattern}`: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn classify(&self, relative: &Path) -> FileRole {
        let path = relative.to_string_lossy().replace('\\', "/");
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches_with(&path, options))
            .map(|(_, role)| *role)
            .unwrap_or(FileRole::Source)
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        let rules = GLOBAL_RULES
            .iter()
            .chain(SCRIPT_RULES)
            .filter_map(|(pattern, role)| Pattern::new(pattern).ok().map(|p| (p, *role)))
            .collect();
        Self { rules }
    }
}
