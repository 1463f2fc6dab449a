use std::path::Path;

use tree_sitter::Language;

use super::{Dialect, LanguageParser};

/// Provider for JavaScript sources (including JSX).
pub struct JavascriptParser {
    _private: (),
}

impl JavascriptParser {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for JavascriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for JavascriptParser {
    fn extensions(&self) -> &[&str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn dialect(&self) -> Dialect {
        Dialect::JavaScript
    }

    fn language_for(&self, _path: &Path) -> Language {
        tree_sitter_javascript::LANGUAGE.into()
    }
}
