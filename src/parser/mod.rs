pub mod javascript;
pub mod typescript;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tree_sitter::{Language, Parser, Tree};

use crate::error::{ExtractError, Result};

/// Source dialect. Gates recognition of TypeScript-only declaration shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    JavaScript,
    TypeScript,
}

impl Dialect {
    pub fn is_typescript(self) -> bool {
        self == Dialect::TypeScript
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::JavaScript => f.write_str("javascript"),
            Dialect::TypeScript => f.write_str("typescript"),
        }
    }
}

/// A parsed file: the concrete syntax tree together with the text it was built from.
///
/// Read-only after construction, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: PathBuf,
    dialect: Dialect,
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

/// Trait for dialect-specific syntax tree providers.
pub trait LanguageParser: Send + Sync {
    /// File extensions this parser handles (e.g., `["ts"]`).
    fn extensions(&self) -> &[&str];

    fn dialect(&self) -> Dialect;

    /// Grammar to use for `path`. Lets one dialect pick between grammar
    /// variants, such as TSX for `.tsx` files.
    fn language_for(&self, path: &Path) -> Language;

    /// Parse `source` into a [`SyntaxTree`].
    fn parse(&self, path: &Path, source: &str) -> Result<SyntaxTree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language_for(path))
            .map_err(|e| ExtractError::provider(path, format!("failed to set language: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::provider(path, "parser produced no tree"))?;

        Ok(SyntaxTree {
            path: path.to_path_buf(),
            dialect: self.dialect(),
            source: source.to_string(),
            tree,
        })
    }
}

/// Registry of the available syntax tree providers.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: Vec::new(),
        };
        registry.register(Box::new(typescript::TypescriptParser::new()));
        registry.register(Box::new(javascript::JavascriptParser::new()));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn LanguageParser>) {
        self.parsers.push(parser);
    }

    /// Return all file extensions supported by registered parsers.
    pub fn supported_extensions(&self) -> std::collections::HashSet<String> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions().iter().map(|e| (*e).to_string()))
            .collect()
    }

    /// Find the appropriate parser for a given file path based on extension.
    pub fn parser_for(&self, path: &Path) -> Option<&dyn LanguageParser> {
        let ext = path.extension()?.to_str()?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .map(|p| p.as_ref())
    }

    /// Parse `source` with whichever parser handles `path`.
    pub fn parse(&self, path: &Path, source: &str) -> Result<SyntaxTree> {
        self.parser_for(path)
            .ok_or_else(|| ExtractError::UnsupportedLanguage(path.to_path_buf()))?
            .parse(path, source)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_picks_dialect_by_extension() {
        let registry = ParserRegistry::new();
        let ts = registry.parser_for(Path::new("src/app.tsx")).map(|p| p.dialect());
        let js = registry.parser_for(Path::new("lib/index.mjs")).map(|p| p.dialect());
        assert_eq!(ts, Some(Dialect::TypeScript));
        assert_eq!(js, Some(Dialect::JavaScript));
        assert!(registry.parser_for(Path::new("main.rs")).is_none());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let registry = ParserRegistry::new();
        let err = registry.parse(Path::new("README.md"), "# hi").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedLanguage(_)));
    }

    #[test]
    fn parsed_tree_keeps_source_and_dialect() {
        let registry = ParserRegistry::new();
        let tree = registry
            .parse(Path::new("a.ts"), "let x = 1;")
            .expect("parse failed");
        assert_eq!(tree.dialect(), Dialect::TypeScript);
        assert_eq!(tree.source(), "let x = 1;");
        assert_eq!(tree.root().kind(), "program");
    }
}
