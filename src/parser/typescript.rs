use std::path::Path;

use tree_sitter::Language;

use super::{Dialect, LanguageParser};

/// Provider for TypeScript sources. `.tsx` files use the TSX grammar.
pub struct TypescriptParser {
    _private: (),
}

impl TypescriptParser {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for TypescriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for TypescriptParser {
    fn extensions(&self) -> &[&str] {
        &["ts", "mts", "cts", "tsx"]
    }

    fn dialect(&self) -> Dialect {
        Dialect::TypeScript
    }

    fn language_for(&self, path: &Path) -> Language {
        let is_tsx = path.extension().and_then(|e| e.to_str()) == Some("tsx");
        if is_tsx {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        }
    }
}
