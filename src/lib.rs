//! Declaration outlines for JavaScript and TypeScript sources.
//!
//! [`index_source`] turns one file's text into a [`DeclarationIndex`]:
//! every named declaration with its kind, modifiers, nesting, heritage and
//! enum values. [`batch::index_project`] does the same for a whole tree.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod parser;
pub mod symbols;
pub mod workspace;

use std::path::Path;

pub use config::{Config, FileRole};
pub use error::{ExtractError, Result};
pub use extract::{extract, ExtractOptions};
pub use index::{DeclarationIndex, Diagnostic, DiagnosticKind, ProjectIndex};
pub use parser::{Dialect, ParserRegistry};
pub use symbols::{DeclId, DeclKind, Declaration, Modifier};

/// Parse and extract `source`. The dialect is picked from `path`'s extension.
pub fn index_source(path: &Path, source: &str, options: &ExtractOptions) -> Result<DeclarationIndex> {
    let tree = ParserRegistry::new().parse(path, source)?;
    Ok(extract(&tree, options))
}
