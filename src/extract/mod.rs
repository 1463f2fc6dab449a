//! Declaration extraction pipeline.
//!
//! One file goes through four strictly sequential stages:
//!
//! 1. [`matcher`] walks the syntax tree and emits raw [`Candidate`]s in
//!    document order, each carrying the keyword tokens and wrapper context
//!    (export, `declare`, decorators) it was found in.
//! 2. [`modifiers`] turns those facts into the final [`Modifiers`] set and
//!    settles default-export exclusivity.
//! 3. [`nesting`] attaches candidates to their containers with a stack of open
//!    containers, assigns name paths and symbol ids, and groups merged
//!    namespaces and interfaces.
//! 4. [`linker`] parses heritage clauses into name references and computes
//!    enum member values.
//!
//! Every stage reports problems as [`Diagnostic`]s; none of them fail.

pub mod linker;
pub mod matcher;
pub mod modifiers;
pub mod nesting;

use tracing::debug;

use crate::index::{DeclarationIndex, Diagnostic, DiagnosticKind};
use crate::parser::SyntaxTree;
use crate::symbols::merkle::compute_merkle_hashes;
use crate::symbols::{
    BindingKind, DeclKind, EnumValue, HeritageRelation, Modifiers, Signature, Span, TypeParam,
};

/// Tunables for a single extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Deepest container nesting that is descended into.
    pub max_depth: usize,
    /// Length at which declaration summaries are cut.
    pub summary_max_chars: usize,
    /// Recognize `describe`/`it`/`test` calls as test declarations.
    pub detect_tests: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            summary_max_chars: 80,
            detect_tests: true,
        }
    }
}

/// Accessibility keyword written on a class member or constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accessibility {
    Public,
    Private,
    Protected,
}

/// What the matcher saw around and on a declaration node, before any
/// modifier rules are applied.
#[derive(Debug, Clone, Default)]
pub(crate) struct SyntaxFacts {
    pub exported: bool,
    pub default_export: bool,
    pub ambient: bool,
    pub class_member: bool,
    pub decorated: bool,
    pub accessibility: Option<Accessibility>,
    pub private_name: bool,
    pub computed_name: bool,
    pub is_static: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub is_readonly: bool,
    pub is_abstract: bool,
    pub is_const: bool,
    pub is_optional: bool,
    pub is_override: bool,
}

/// Raw heritage clause text, parsed into names by the linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeritageClause {
    pub relation: HeritageRelation,
    pub text: String,
}

/// Enum member initializer as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EnumInit {
    /// No initializer: auto-incremented from the previous member.
    Implicit,
    /// A literal, or integer arithmetic over literals folded to a number.
    Literal(EnumValue),
    /// Anything else, kept raw with the identifiers it mentions.
    Expr { raw: String, refs: Vec<String> },
}

/// A declaration as emitted by the matcher and enriched by the modifier resolver.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub kind: DeclKind,
    pub name: Option<String>,
    pub span: Span,
    /// Container depth at which the matcher found it; 0 is module level.
    pub depth: usize,
    pub body_span: Option<Span>,
    pub syntax: SyntaxFacts,
    pub modifiers: Modifiers,
    pub binding: Option<BindingKind>,
    pub signature: Option<Signature>,
    pub type_parameters: Vec<TypeParam>,
    pub type_text: Option<String>,
    pub heritage: Vec<HeritageClause>,
    pub enum_init: Option<EnumInit>,
}

impl Candidate {
    pub fn new(kind: DeclKind, name: Option<String>, span: Span) -> Self {
        Self {
            kind,
            name,
            span,
            depth: 0,
            body_span: None,
            syntax: SyntaxFacts::default(),
            modifiers: Modifiers::new(),
            binding: None,
            signature: None,
            type_parameters: Vec::new(),
            type_text: None,
            heritage: Vec::new(),
            enum_init: None,
        }
    }
}

/// Run the full pipeline over one syntax tree.
///
/// Always produces an index; everything that went wrong is in its diagnostics.
pub fn extract(tree: &SyntaxTree, options: &ExtractOptions) -> DeclarationIndex {
    let mut diagnostics = Vec::new();

    let root = tree.root();
    if root.has_error() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::SyntaxErrors,
            "source contains syntax errors; extraction is best-effort",
            Some(Span::from_node(&root)),
        ));
    }

    let matched = matcher::match_tree(tree, options, &mut diagnostics);
    let candidates = modifiers::resolve(matched, &mut diagnostics);
    let mut nested = nesting::build(candidates, tree, options, &mut diagnostics);
    linker::link(&mut nested, &mut diagnostics);
    compute_merkle_hashes(&mut nested.decls);

    debug!(
        path = %tree.path().display(),
        declarations = nested.decls.len(),
        diagnostics = diagnostics.len(),
        "extracted declarations"
    );

    DeclarationIndex::new(
        tree.path().to_path_buf(),
        tree.dialect(),
        tree.source().lines().count(),
        nested.decls,
        nested.groups,
        diagnostics,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use super::{extract, ExtractOptions};
    use crate::index::DeclarationIndex;
    use crate::parser::ParserRegistry;

    pub fn index_ts(source: &str) -> DeclarationIndex {
        index_as("test.ts", source)
    }

    pub fn index_js(source: &str) -> DeclarationIndex {
        index_as("test.js", source)
    }

    pub fn index_as(path: &str, source: &str) -> DeclarationIndex {
        let tree = ParserRegistry::new()
            .parse(Path::new(path), source)
            .expect("parse failed");
        extract(&tree, &ExtractOptions::default())
    }
}
