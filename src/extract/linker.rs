//! Reference linker: heritage clauses and enum member values.

use super::nesting::{Nested, RawLinks};
use super::{EnumInit, HeritageClause};
use crate::index::{Diagnostic, DiagnosticKind};
use crate::symbols::{DeclId, DeclKind, Declaration, EnumValue, HeritageRef, HeritageRelation};

pub(crate) fn link(nested: &mut Nested, diagnostics: &mut Vec<Diagnostic>) {
    let links = std::mem::take(&mut nested.links);

    for (decl, raw) in nested.decls.iter_mut().zip(&links) {
        if !raw.heritage.is_empty() {
            decl.heritage = heritage_refs(decl, &raw.heritage, diagnostics);
        }
    }

    let enums: Vec<DeclId> = nested
        .decls
        .iter()
        .filter(|d| d.kind == DeclKind::Enum)
        .map(|d| d.id)
        .collect();
    for id in enums {
        link_enum(&mut nested.decls, &links, id, diagnostics);
    }
}

fn heritage_refs(
    decl: &Declaration,
    clauses: &[HeritageClause],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<HeritageRef> {
    let mut refs: Vec<HeritageRef> = clauses
        .iter()
        .flat_map(|clause| {
            split_top_level(&clause.text)
                .into_iter()
                .filter_map(move |part| {
                    let (name, type_arguments) = split_type_arguments(part);
                    (!name.is_empty()).then(|| HeritageRef {
                        relation: clause.relation,
                        name: name.to_string(),
                        type_arguments: type_arguments.map(str::to_string),
                    })
                })
        })
        .collect();

    if decl.kind == DeclKind::Class {
        let extends = refs
            .iter()
            .filter(|r| r.relation == HeritageRelation::Extends)
            .count();
        if extends > 1 {
            let mut seen_base = false;
            refs.retain(|r| {
                if r.relation != HeritageRelation::Extends {
                    return true;
                }
                !std::mem::replace(&mut seen_base, true)
            });
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedDeclaration,
                format!("class `{}` extends more than one base; keeping the first", decl.name),
                Some(decl.span),
            ));
        }
    }
    refs
}

/// Split a heritage list at commas that are not nested inside brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut prev = '\0';
    for (i, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            // `=>` inside a function type is not a closing bracket.
            '>' if prev != '=' => depth -= 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        prev = ch;
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// `Base<T, U>` -> (`Base`, `<T, U>`).
fn split_type_arguments(part: &str) -> (&str, Option<&str>) {
    match part.find('<') {
        Some(open) if part.ends_with('>') => (part[..open].trim(), Some(&part[open..])),
        _ => (part.trim(), None),
    }
}

/// Compute member values in order: literals as written, computed
/// initializers as raw text, and implicit members by auto-increment.
fn link_enum(
    decls: &mut [Declaration],
    links: &[RawLinks],
    enum_id: DeclId,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let members: Vec<DeclId> = decls[enum_id.index()]
        .children
        .iter()
        .copied()
        .filter(|c| decls[c.index()].kind == DeclKind::EnumMember)
        .collect();

    let mut previous: Option<EnumValue> = None;
    for (position, &member) in members.iter().enumerate() {
        let value = match &links[member.index()].enum_init {
            Some(EnumInit::Literal(value)) => Some(value.clone()),
            Some(EnumInit::Expr { raw, refs }) => {
                let resolved: Vec<DeclId> = refs
                    .iter()
                    .filter_map(|name| {
                        members
                            .iter()
                            .copied()
                            .find(|&m| m != member && decls[m.index()].name == *name)
                    })
                    .collect();
                decls[member.index()].member_refs = resolved;
                Some(EnumValue::Computed(raw.clone()))
            }
            Some(EnumInit::Implicit) | None => match &previous {
                _ if position == 0 => Some(EnumValue::Number(0)),
                Some(EnumValue::Number(n)) => n.checked_add(1).map(EnumValue::Number),
                Some(EnumValue::Computed(raw)) => Some(EnumValue::Computed(format!("({raw}) + 1"))),
                Some(EnumValue::String(_)) | None => {
                    let decl = &decls[member.index()];
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MalformedDeclaration,
                        format!(
                            "enum member `{}` follows a non-numeric member and needs an initializer",
                            decl.name
                        ),
                        Some(decl.span),
                    ));
                    None
                }
            },
        };
        decls[member.index()].enum_value = value.clone();
        previous = value;
    }
}
