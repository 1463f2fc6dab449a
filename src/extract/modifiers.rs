//! Modifier resolver: turns matcher facts into final modifier sets.

use super::matcher::{LocalExport, Matched};
use super::{Accessibility, Candidate};
use crate::index::{Diagnostic, DiagnosticKind};
use crate::symbols::{BindingKind, Modifier, Modifiers, Span};

/// Compute `modifiers` for every candidate, apply export clauses that name
/// local declarations, and keep at most one default export per module.
pub(crate) fn resolve(matched: Matched, diagnostics: &mut Vec<Diagnostic>) -> Vec<Candidate> {
    let Matched {
        mut candidates,
        local_exports,
    } = matched;

    for cand in &mut candidates {
        cand.modifiers = modifiers_for(cand);
    }
    apply_named_exports(&mut candidates, &local_exports);
    settle_default_export(&mut candidates, &local_exports, diagnostics);
    candidates
}

fn modifiers_for(cand: &Candidate) -> Modifiers {
    let s = &cand.syntax;
    let mut m = Modifiers::new();

    m.set(Modifier::Default, s.default_export);
    m.set(Modifier::Exported, s.exported && !s.default_export);
    m.set(Modifier::Declare, s.ambient);
    m.set(Modifier::Decorated, s.decorated);

    if let Some(accessibility) = s.accessibility {
        m.insert(match accessibility {
            Accessibility::Public => Modifier::Public,
            Accessibility::Private => Modifier::Private,
            Accessibility::Protected => Modifier::Protected,
        });
    }
    // `#name` is private whatever keywords surround it.
    if s.private_name {
        m.remove(Modifier::Public);
        m.insert(Modifier::Private);
    }

    m.set(Modifier::Static, s.class_member && s.is_static);
    m.set(Modifier::Abstract, s.is_abstract);
    m.set(Modifier::Override, s.is_override);
    m.set(Modifier::Readonly, s.is_readonly);
    m.set(
        Modifier::Const,
        s.is_const || cand.binding == Some(BindingKind::Const),
    );
    m.set(Modifier::Async, s.is_async);
    m.set(Modifier::Generator, s.is_generator);
    m.set(Modifier::Optional, s.is_optional);
    m.set(Modifier::Computed, s.computed_name);
    m
}

fn module_level<'a>(
    candidates: &'a [Candidate],
    name: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    candidates
        .iter()
        .enumerate()
        .filter(move |(_, c)| c.depth == 0 && c.name.as_deref() == Some(name))
        .map(|(i, _)| i)
}

/// `export { a, b as c }`: the local declarations become exported.
fn apply_named_exports(candidates: &mut [Candidate], local_exports: &[LocalExport]) {
    for export in local_exports.iter().filter(|e| !e.default) {
        let Some(name) = export.name.as_deref() else {
            continue;
        };
        let targets: Vec<usize> = module_level(candidates, name).collect();
        for i in targets {
            if !candidates[i].modifiers.contains(Modifier::Default) {
                candidates[i].modifiers.insert(Modifier::Exported);
            }
        }
    }
}

/// One thing that asks to be the module's default export.
struct DefaultClaim {
    span: Span,
    targets: Vec<usize>,
}

fn settle_default_export(
    candidates: &mut [Candidate],
    local_exports: &[LocalExport],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut claims: Vec<DefaultClaim> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.depth == 0 && c.syntax.default_export)
        .map(|(i, c)| DefaultClaim {
            span: c.span,
            targets: vec![i],
        })
        .collect();

    for export in local_exports.iter().filter(|e| e.default) {
        let targets = match export.name.as_deref() {
            Some(name) => module_level(candidates, name).collect(),
            None => Vec::new(),
        };
        claims.push(DefaultClaim {
            span: export.span,
            targets,
        });
    }

    claims.sort_by_key(|c| c.span.start);
    let mut claims = claims.into_iter();
    let winners = claims.next().map(|c| c.targets).unwrap_or_default();
    for &i in &winners {
        let m = &mut candidates[i].modifiers;
        m.remove(Modifier::Exported);
        m.insert(Modifier::Default);
    }

    // A later claim may name the winner again (`export default A;`); the
    // winner keeps its tag and only the diagnostic is recorded.
    for losing in claims {
        for &i in losing.targets.iter().filter(|&&i| !winners.contains(&i)) {
            let m = &mut candidates[i].modifiers;
            m.remove(Modifier::Default);
            m.insert(Modifier::Exported);
        }
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DuplicateDefaultExport,
            format!(
                "module already has a default export; line {} is treated as a named export",
                losing.span.start_line
            ),
            Some(losing.span),
        ));
    }
}
