//! Declaration Index: the per-file result of extraction and its queries.
//!
//! Declarations live in a flat arena in document order. Parents always come
//! before their children, so a pre-order walk is just the arena in order.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::parser::Dialect;
use crate::symbols::{DeclId, DeclKind, Declaration, HeritageRelation, MergeGroupId, Modifier, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A declaration was recognized but part of it could not be understood.
    MalformedDeclaration,
    DuplicateDefaultExport,
    /// Declarations that cannot merge share a qualified name.
    MergeConflict,
    /// The tree contains ERROR or MISSING nodes.
    SyntaxErrors,
    NestingTooDeep,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::MalformedDeclaration => "malformed declaration",
            DiagnosticKind::DuplicateDefaultExport => "duplicate default export",
            DiagnosticKind::MergeConflict => "merge conflict",
            DiagnosticKind::SyntaxErrors => "syntax errors",
            DiagnosticKind::NestingTooDeep => "nesting too deep",
        };
        f.write_str(label)
    }
}

/// A non-fatal problem found while extracting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "L{}: {}: {}", span.start_line, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Every declaration extracted from one file, with diagnostics.
///
/// Immutable once built. Re-extracting a file replaces its index wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationIndex {
    path: PathBuf,
    dialect: Dialect,
    total_lines: usize,
    declarations: Vec<Declaration>,
    #[serde(skip)]
    groups: Vec<Vec<DeclId>>,
    diagnostics: Vec<Diagnostic>,
}

impl DeclarationIndex {
    pub(crate) fn new(
        path: PathBuf,
        dialect: Dialect,
        total_lines: usize,
        declarations: Vec<Declaration>,
        groups: Vec<Vec<DeclId>>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            path,
            dialect,
            total_lines,
            declarations,
            groups,
            diagnostics,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn total_tokens(&self) -> usize {
        self.top_level().map(|d| d.estimated_tokens).sum()
    }

    /// True when `other` holds the same top-level declarations at the same
    /// places. Merkle hashes cover everything nested below them.
    pub fn unchanged_from(&self, other: &DeclarationIndex) -> bool {
        let fingerprint = |index: &DeclarationIndex| {
            index
                .top_level()
                .map(|d| (d.span, d.merkle_hash))
                .collect::<Vec<_>>()
        };
        self.path == other.path
            && fingerprint(self) == fingerprint(other)
            && self.diagnostics == other.diagnostics
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// All declarations in document order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations.iter().filter(|d| d.parent.is_none())
    }

    pub fn children(&self, id: DeclId) -> impl Iterator<Item = &Declaration> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(move |d| d.children.iter().filter_map(move |c| self.get(*c)))
    }

    pub fn parent(&self, id: DeclId) -> Option<&Declaration> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    /// Containers from the immediate parent up to the top level.
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = &Declaration> + '_ {
        std::iter::successors(self.parent(id), move |d| self.parent(d.id))
    }

    /// Number of containers above `id`.
    pub fn depth(&self, id: DeclId) -> usize {
        self.ancestors(id).count()
    }

    pub fn by_name(&self, name: &str) -> Vec<&Declaration> {
        self.declarations.iter().filter(|d| d.name == name).collect()
    }

    /// Declarations whose slash-joined qualified name is `name_path`.
    pub fn by_path(&self, name_path: &str) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.name_path == name_path)
            .collect()
    }

    pub fn by_symbol_id(&self, symbol_id: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.symbol_id == symbol_id)
    }

    pub fn by_kind(&self, kind: DeclKind) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn with_modifier(&self, modifier: Modifier) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations.iter().filter(move |d| d.has(modifier))
    }

    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a Declaration> + 'a
    where
        F: Fn(&Declaration) -> bool + 'a,
    {
        self.declarations.iter().filter(move |d| predicate(*d))
    }

    pub fn exported(&self) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations
            .iter()
            .filter(|d| d.has(Modifier::Exported) || d.has(Modifier::Default))
    }

    pub fn default_export(&self) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.has(Modifier::Default))
    }

    /// Every declaration site in the merge group, in source order.
    pub fn merge_group(&self, group: MergeGroupId) -> impl Iterator<Item = &Declaration> + '_ {
        self.groups
            .get(group.index())
            .into_iter()
            .flatten()
            .filter_map(move |id| self.get(*id))
    }

    pub fn merge_groups(&self) -> impl Iterator<Item = MergeGroupId> + '_ {
        (0..self.groups.len()).map(MergeGroupId)
    }

    /// Members of `id`, unioned across every declaration it merges with.
    ///
    /// For a namespace declared twice this returns the children of both
    /// blocks, ordered by source position.
    pub fn merged_members(&self, id: DeclId) -> Vec<&Declaration> {
        let Some(decl) = self.get(id) else {
            return Vec::new();
        };
        let mut members: Vec<&Declaration> = match decl.merge_group {
            Some(group) => self
                .merge_group(group)
                .flat_map(|site| self.children(site.id))
                .collect(),
            None => self.children(id).collect(),
        };
        members.sort_by_key(|d| d.span.start);
        members
    }

    /// Members of every declaration named `name_path`.
    pub fn members_of(&self, name_path: &str) -> Vec<&Declaration> {
        let mut members: Vec<&Declaration> = self
            .by_path(name_path)
            .into_iter()
            .flat_map(|d| self.children(d.id))
            .collect();
        members.sort_by_key(|d| d.span.start);
        members
    }

    /// All declarations of the same callable sharing `id`'s parent and name,
    /// signatures first as written.
    pub fn overloads(&self, id: DeclId) -> Vec<&Declaration> {
        let Some(decl) = self.get(id) else {
            return Vec::new();
        };
        self.declarations
            .iter()
            .filter(|d| d.parent == decl.parent && d.name == decl.name && d.kind == decl.kind)
            .collect()
    }

    /// Classes and interfaces naming `name` in an `extends` clause.
    pub fn subtypes_of(&self, name: &str) -> Vec<&Declaration> {
        self.heritage_users(name, HeritageRelation::Extends)
    }

    /// Classes naming `name` in an `implements` clause.
    pub fn implementors_of(&self, name: &str) -> Vec<&Declaration> {
        self.heritage_users(name, HeritageRelation::Implements)
    }

    fn heritage_users(&self, name: &str, relation: HeritageRelation) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.heritage_names(relation).any(|n| n == name))
            .collect()
    }

    /// Pre-order walk with container depth, for outline rendering.
    pub fn outline(&self) -> impl Iterator<Item = (usize, &Declaration)> + '_ {
        self.declarations.iter().map(move |d| (self.depth(d.id), d))
    }
}

/// Indexes for every file under a root, sorted by path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectIndex {
    pub root: PathBuf,
    pub files: Vec<DeclarationIndex>,
}

impl ProjectIndex {
    pub fn new(root: PathBuf, mut files: Vec<DeclarationIndex>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { root, files }
    }

    pub fn total_declarations(&self) -> usize {
        self.files.iter().map(|f| f.len()).sum()
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    pub fn total_diagnostics(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    pub fn file(&self, path: &Path) -> Option<&DeclarationIndex> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Swap in a freshly built index for its file, keeping path order.
    pub fn replace(&mut self, index: DeclarationIndex) {
        match self.files.binary_search_by(|f| f.path.as_path().cmp(index.path())) {
            Ok(pos) => self.files[pos] = index,
            Err(pos) => self.files.insert(pos, index),
        }
    }

    pub fn remove(&mut self, path: &Path) -> Option<DeclarationIndex> {
        let pos = self.files.iter().position(|f| f.path == path)?;
        Some(self.files.remove(pos))
    }

    pub fn find_symbol(&self, symbol_id: &str) -> Option<(&DeclarationIndex, &Declaration)> {
        self.files
            .iter()
            .find_map(|f| f.by_symbol_id(symbol_id).map(|d| (f, d)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extract::test_support::{index_as, index_ts};

    #[test]
    fn unchanged_from_tracks_nested_edits() {
        let before = index_ts("namespace N { export function f() { return 1; } }");
        let same = index_ts("namespace N { export function f() { return 1; } }\n// trailing note");
        let edited = index_ts("namespace N { export function f() { return 2; } }");
        let shifted = index_ts("\nnamespace N { export function f() { return 1; } }");
        assert!(before.unchanged_from(&same));
        assert!(!before.unchanged_from(&edited));
        assert!(!before.unchanged_from(&shifted));
    }

    #[test]
    fn merged_members_union_both_blocks() {
        let index = index_ts(
            "namespace MergedNamespace { export const first = 1; }
             interface Other {}
             namespace MergedNamespace { export const second = 2; }",
        );
        let first_block = index.by_name("MergedNamespace")[0].id;
        let names: Vec<_> = index
            .merged_members(first_block)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["first", "second"]);

        let by_path: Vec<_> = index
            .members_of("MergedNamespace")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(by_path, ["first", "second"]);
    }

    #[test]
    fn merged_interfaces_share_group() {
        let index = index_ts(
            "interface MergedInterface { a: string; }
             interface MergedInterface { b: number; }",
        );
        let group = index.by_name("MergedInterface")[0]
            .merge_group
            .expect("interfaces are grouped");
        assert_eq!(index.merge_group(group).count(), 2);
        assert_eq!(index.merge_groups().count(), 1);
    }

    #[test]
    fn heritage_queries() {
        let index = index_ts(
            "interface Processable { process(): void; }
             abstract class AbstractClass { abstract process(): void; }
             class ImplementedClass extends AbstractClass implements Processable { process() {} }",
        );
        let subtypes: Vec<_> = index
            .subtypes_of("AbstractClass")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(subtypes, ["ImplementedClass"]);
        assert_eq!(index.implementors_of("Processable").len(), 1);
        assert!(index.implementors_of("AbstractClass").is_empty());
    }

    #[test]
    fn overloads_share_parent_and_name() {
        let index = index_ts(
            "class Q {
                run(a: string): void;
                run(a: number): void;
                run(a: any) {}
                other() {}
             }",
        );
        let run = index.by_name("run")[0].id;
        assert_eq!(index.overloads(run).len(), 3);
    }

    #[test]
    fn outline_reports_depth() {
        let index = index_ts("namespace A { export class B { c() {} } }");
        let outline: Vec<_> = index.outline().map(|(depth, d)| (depth, d.name.as_str())).collect();
        assert_eq!(outline, [(0, "A"), (1, "B"), (2, "c")]);
        let c = index.by_name("c")[0].id;
        let ancestors: Vec<_> = index.ancestors(c).map(|d| d.name.as_str()).collect();
        assert_eq!(ancestors, ["B", "A"]);
    }

    #[test]
    fn lookups_by_symbol_id_and_path() {
        let index = index_as("src/shapes.ts", "export namespace Geo { export function area() {} }");
        let area = index.by_symbol_id("src/shapes.ts::Geo/area").expect("symbol");
        assert_eq!(area.kind, DeclKind::Function);
        assert_eq!(index.by_path("Geo/area").len(), 1);
        assert_eq!(index.exported().count(), 2);
        assert_eq!(index.path(), Path::new("src/shapes.ts"));
    }

    #[test]
    fn project_replace_keeps_order() {
        let a = index_as("a.ts", "const a = 1;");
        let b = index_as("b.ts", "const b = 1;");
        let mut project = ProjectIndex::new(PathBuf::from("."), vec![b, a]);
        assert_eq!(project.files[0].path(), Path::new("a.ts"));

        project.replace(index_as("b.ts", "const b = 1; const c = 2;"));
        assert_eq!(project.total_files(), 2);
        assert_eq!(project.total_declarations(), 3);

        project.replace(index_as("0.ts", "let z;"));
        assert_eq!(project.files[0].path(), Path::new("0.ts"));
        assert!(project.find_symbol("b.ts::c").is_some());
        assert!(project.remove(Path::new("a.ts")).is_some());
        assert_eq!(project.total_files(), 2);
    }

    #[test]
    fn diagnostic_display_includes_line() {
        let span = Span {
            start: 0,
            end: 1,
            start_line: 3,
            end_line: 3,
        };
        let diag = Diagnostic::new(DiagnosticKind::MergeConflict, "clash", Some(span));
        assert_eq!(diag.to_string(), "L3: merge conflict: clash");
    }
}
