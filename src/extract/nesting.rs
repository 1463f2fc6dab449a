//! Scope & nesting builder.
//!
//! Candidates arrive in document order with containers ahead of their
//! members, so a single stack of open containers is enough: pop everything
//! whose span does not cover the next candidate, and whatever remains on top
//! is its parent.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Candidate, EnumInit, ExtractOptions, HeritageClause};
use crate::index::{Diagnostic, DiagnosticKind};
use crate::parser::SyntaxTree;
use crate::symbols::merkle::{content_hash, estimate_tokens, summarize};
use crate::symbols::{DeclId, DeclKind, Declaration, MergeGroupId};

/// Placeholder for declarations the matcher could not name.
pub(crate) const ANONYMOUS: &str = "<anonymous>";

/// Unresolved cross-reference input for one declaration, parallel to the arena.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawLinks {
    pub heritage: Vec<HeritageClause>,
    pub enum_init: Option<EnumInit>,
}

/// The declaration arena after nesting, before linking.
#[derive(Debug, Default)]
pub(crate) struct Nested {
    pub decls: Vec<Declaration>,
    /// Members of each merge group, in declaration order.
    pub groups: Vec<Vec<DeclId>>,
    pub links: Vec<RawLinks>,
}

pub(crate) fn build(
    candidates: Vec<Candidate>,
    tree: &SyntaxTree,
    options: &ExtractOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Nested {
    let file = tree.path().to_string_lossy().replace('\\', "/");
    let source = tree.source();

    let mut nested = Nested {
        decls: Vec::with_capacity(candidates.len()),
        groups: Vec::new(),
        links: Vec::with_capacity(candidates.len()),
    };
    let mut open: Vec<DeclId> = Vec::new();
    let mut used_ids: HashSet<String> = HashSet::new();

    for cand in candidates {
        while let Some(&top) = open.last() {
            let container = &nested.decls[top.index()];
            if container.body_span.unwrap_or(container.span).contains(&cand.span) {
                break;
            }
            open.pop();
        }
        let parent = open.last().copied();

        let name = match cand.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedDeclaration,
                    format!("{} on line {} has no name", cand.kind, cand.span.start_line),
                    Some(cand.span),
                ));
                ANONYMOUS.to_string()
            }
        };
        let name_path = match parent {
            Some(p) => format!("{}/{}", nested.decls[p.index()].name_path, name),
            None => name.clone(),
        };
        let symbol_id = unique_symbol_id(&file, &name_path, &mut used_ids);

        let text = cand.span.text(source);
        let id = DeclId(nested.decls.len());
        nested.decls.push(Declaration {
            id,
            symbol_id,
            kind: cand.kind,
            name,
            name_path,
            span: cand.span,
            body_span: cand.body_span,
            modifiers: cand.modifiers,
            binding: cand.binding,
            signature: cand.signature,
            type_parameters: cand.type_parameters,
            type_text: cand.type_text,
            heritage: Vec::new(),
            enum_value: None,
            member_refs: Vec::new(),
            parent,
            children: Vec::new(),
            merge_group: None,
            summary: summarize(text, options.summary_max_chars),
            content_hash: content_hash(text),
            merkle_hash: [0; 32],
            estimated_tokens: estimate_tokens(text),
        });
        nested.links.push(RawLinks {
            heritage: cand.heritage,
            enum_init: cand.enum_init,
        });

        if let Some(p) = parent {
            nested.decls[p.index()].children.push(id);
        }
        if cand.kind.is_container() {
            open.push(id);
        }
    }

    assign_merge_groups(&mut nested);
    report_conflicts(&nested.decls, diagnostics);
    nested
}

fn unique_symbol_id(file: &str, name_path: &str, used: &mut HashSet<String>) -> String {
    let base = format!("{file}::{name_path}");
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Every namespace and interface joins the group of declarations sharing its
/// kind and name path. Singletons get a group of their own.
fn assign_merge_groups(nested: &mut Nested) {
    let mut by_key: HashMap<(DeclKind, String), MergeGroupId> = HashMap::new();
    for decl in nested.decls.iter_mut().filter(|d| d.kind.is_mergeable()) {
        let key = (decl.kind, decl.name_path.clone());
        let group = *by_key.entry(key).or_insert_with(|| {
            nested.groups.push(Vec::new());
            MergeGroupId(nested.groups.len() - 1)
        });
        nested.groups[group.index()].push(decl.id);
        decl.merge_group = Some(group);
    }
}

fn declares_type_or_namespace(kind: DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Class
            | DeclKind::Enum
            | DeclKind::Namespace
            | DeclKind::Interface
            | DeclKind::TypeAlias
    )
}

fn may_share_name(a: DeclKind, b: DeclKind) -> bool {
    use DeclKind::*;
    a == b || matches!((a, b), (Interface, Namespace) | (Namespace, Interface) | (Class, Interface) | (Interface, Class))
}

/// Kinds that cannot merge but share a name path are reported once per
/// clashing declaration. All of them stay in the index.
fn report_conflicts(decls: &[Declaration], diagnostics: &mut Vec<Diagnostic>) {
    let mut by_path: BTreeMap<&str, Vec<&Declaration>> = BTreeMap::new();
    for decl in decls.iter().filter(|d| declares_type_or_namespace(d.kind)) {
        by_path.entry(decl.name_path.as_str()).or_default().push(decl);
    }

    for (path, sharing) in by_path {
        for (i, later) in sharing.iter().enumerate().skip(1) {
            let Some(earlier) = sharing[..i].iter().find(|e| !may_share_name(e.kind, later.kind)) else {
                continue;
            };
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MergeConflict,
                format!(
                    "{} `{path}` on line {} cannot merge with {} on line {}",
                    later.kind, later.span.start_line, earlier.kind, earlier.span.start_line
                ),
                Some(later.span),
            ));
        }
    }
}
