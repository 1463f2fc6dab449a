//! Declaration matcher: recognizes declaration shapes in a tree-sitter CST.
//!
//! ## How it works
//!
//! [`match_tree`] walks statement lists (the program, namespace bodies) and
//! dispatches each statement by node kind. Wrappers are peeled off on the way
//! down and recorded in a [`Context`]:
//!
//! - `export_statement` marks the inner declaration exported (or default
//!   exported) and widens its span to include `export` and any decorators.
//! - `ambient_declaration` (`declare ...`) marks everything below it ambient.
//! - `expression_statement` is unwrapped because tree-sitter-typescript parses
//!   a bare `namespace X {}` as an expression.
//!
//! Containers (classes, interfaces, enums, namespaces, test suites) emit their
//! own candidate first and then their members, so candidates come out in
//! document order with every container ahead of what it contains.
//!
//! ## Recognized shapes
//!
//! | Construct                                     | Kind                  |
//! |-----------------------------------------------|-----------------------|
//! | `function`, `function*`, overload signatures  | Function              |
//! | `const f = () => {}` / `= function() {}`      | Function              |
//! | `var`/`let`/`const` bindings, destructuring   | Variable (one per id) |
//! | `class`, `abstract class`, `const C = class`  | Class                 |
//! | methods, constructors, `get`/`set`            | Method/Getter/Setter  |
//! | class/interface fields, parameter properties  | Property              |
//! | `interface` and its signatures                | Interface, ...        |
//! | `enum` / `const enum` and members             | Enum, EnumMember      |
//! | `namespace`, `module`, `declare global`       | Namespace             |
//! | `type Alias = ...`                            | TypeAlias             |
//! | `describe(...)` / `it(...)` / `test(...)`     | TestSuite, TestCase   |

use tree_sitter::Node;

use super::{
    Accessibility, Candidate, EnumInit, ExtractOptions, HeritageClause, SyntaxFacts,
};
use crate::index::{Diagnostic, DiagnosticKind};
use crate::parser::{Dialect, SyntaxTree};
use crate::symbols::{BindingKind, DeclKind, EnumValue, HeritageRelation, Param, Signature, Span, TypeParam};

/// Name given to anonymous default-exported declarations.
pub(crate) const ANONYMOUS_DEFAULT: &str = "default";

const SUITE_CALLEES: &[&str] = &["describe", "suite", "context"];
const CASE_CALLEES: &[&str] = &["it", "test", "specify"];

/// Output of the matcher: candidates in document order plus exports that
/// refer to declarations by name.
#[derive(Debug, Default)]
pub(crate) struct Matched {
    pub candidates: Vec<Candidate>,
    pub local_exports: Vec<LocalExport>,
}

/// `export { a }`, `export { a as default }` or `export default a;`.
///
/// `name` is `None` for a default export of an expression that declares
/// nothing (`export default { ... }`); it still claims the default slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalExport {
    pub name: Option<String>,
    pub default: bool,
    pub span: Span,
}

/// Wrapper state inherited while descending.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    depth: usize,
    exported: bool,
    default_export: bool,
    ambient: bool,
    decorated: bool,
    /// Span of the enclosing `export`/`declare` wrapper, if any.
    wrapper: Option<Span>,
}

impl Context {
    /// Context for the body of a container: only ambience survives.
    fn nested(self) -> Self {
        Context {
            depth: self.depth + 1,
            ambient: self.ambient,
            ..Context::default()
        }
    }

    fn span_for(&self, node: &Node) -> Span {
        self.wrapper.unwrap_or_else(|| Span::from_node(node))
    }

    fn apply(&self, syntax: &mut SyntaxFacts) {
        syntax.exported = self.exported;
        syntax.default_export = self.default_export;
        syntax.ambient = self.ambient;
        syntax.decorated = self.decorated;
    }
}

pub(crate) fn match_tree(
    tree: &SyntaxTree,
    options: &ExtractOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Matched {
    let mut matcher = Matcher {
        src: tree.source().as_bytes(),
        dialect: tree.dialect(),
        options,
        out: Matched::default(),
        diagnostics,
    };
    matcher.walk_statements(tree.root(), Context::default());
    matcher.out
}

struct Matcher<'a> {
    src: &'a [u8],
    dialect: Dialect,
    options: &'a ExtractOptions,
    out: Matched,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Matcher<'_> {
    // -----------------------------------------------------------------------
    // Statement dispatch
    // -----------------------------------------------------------------------

    fn walk_statements(&mut self, node: Node, ctx: Context) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "export_statement" => self.match_export(child, ctx),
                "expression_statement" => self.match_expression_statement(child, ctx),
                _ => self.match_declaration(child, ctx),
            }
        }
    }

    fn match_expression_statement(&mut self, node: Node, ctx: Context) {
        let Some(inner) = node.named_child(0) else {
            return;
        };
        match inner.kind() {
            "internal_module" => self.match_namespace(inner, ctx),
            "call_expression" if self.options.detect_tests => {
                if self.test_kind(&inner).is_some() {
                    self.match_test_call(inner, ctx);
                }
            }
            _ => {}
        }
    }

    fn match_export(&mut self, node: Node, ctx: Context) {
        let export_ctx = Context {
            exported: true,
            default_export: has_child_kind(&node, "default"),
            decorated: has_child_kind(&node, "decorator"),
            wrapper: Some(Span::from_node(&node)),
            ..ctx
        };

        if let Some(decl) = node.child_by_field_name("declaration") {
            self.match_declaration(decl, export_ctx);
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            match value.kind() {
                "class" => self.match_class(value, export_ctx),
                kind if is_function_kind(kind) => self.match_function(value, export_ctx),
                "identifier" => self.out.local_exports.push(LocalExport {
                    name: Some(self.text(&value)),
                    default: true,
                    span: Span::from_node(&node),
                }),
                _ => self.out.local_exports.push(LocalExport {
                    name: None,
                    default: true,
                    span: Span::from_node(&node),
                }),
            }
            return;
        }

        // `export { a } from './a'` and `export * from './b'` name nothing local.
        if node.child_by_field_name("source").is_some() {
            return;
        }

        if ctx.depth > 0 {
            return;
        }
        if let Some(clause) = child_by_kind(&node, "export_clause") {
            let mut cursor = clause.walk();
            for spec in clause.named_children(&mut cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let Some(name) = self.field_text(&spec, "name") else {
                    continue;
                };
                let alias = self.field_text(&spec, "alias");
                self.out.local_exports.push(LocalExport {
                    name: Some(name),
                    default: alias.as_deref() == Some("default"),
                    span: Span::from_node(&spec),
                });
            }
        }
    }

    fn match_declaration(&mut self, node: Node, ctx: Context) {
        if !self.dialect.is_typescript() && is_typescript_only(node.kind()) {
            return;
        }
        match node.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                self.match_function(node, ctx)
            }
            "class_declaration" | "abstract_class_declaration" => self.match_class(node, ctx),
            "interface_declaration" => self.match_interface(node, ctx),
            "type_alias_declaration" => self.match_type_alias(node, ctx),
            "enum_declaration" => self.match_enum(node, ctx),
            "internal_module" | "module" => self.match_namespace(node, ctx),
            "lexical_declaration" | "variable_declaration" => self.match_variables(node, ctx),
            "ambient_declaration" => self.match_ambient(node, ctx),
            "expression_statement" => self.match_expression_statement(node, ctx),
            // Imports, plain statements, comments: not declarations.
            _ => {}
        }
    }

    /// `declare function f(): void;`, `declare namespace N {}`, `declare global {}`.
    fn match_ambient(&mut self, node: Node, ctx: Context) {
        let ambient_ctx = Context {
            ambient: true,
            wrapper: Some(ctx.wrapper.unwrap_or_else(|| Span::from_node(&node))),
            ..ctx
        };

        if has_child_kind(&node, "global") {
            let body = child_by_kind(&node, "statement_block");
            self.emit_namespace(Some("global".to_string()), node, body, ambient_ctx);
            return;
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.match_declaration(child, ambient_ctx);
        }
    }

    // -----------------------------------------------------------------------
    // Functions and variables
    // -----------------------------------------------------------------------

    /// Function declarations, overload signatures, and default-exported
    /// function or arrow expressions.
    fn match_function(&mut self, node: Node, ctx: Context) {
        let name = self
            .field_text(&node, "name")
            .or_else(|| ctx.default_export.then(|| ANONYMOUS_DEFAULT.to_string()));

        let mut cand = Candidate::new(DeclKind::Function, name, ctx.span_for(&node));
        ctx.apply(&mut cand.syntax);
        self.fill_callable(&mut cand, &node);
        self.emit(cand, ctx);
    }

    /// Copy async/generator flags, generics, signature and body span from a
    /// function-like node onto `cand`.
    fn fill_callable(&self, cand: &mut Candidate, func: &Node) {
        cand.syntax.is_async |= has_child_kind(func, "async");
        cand.syntax.is_generator |= func.kind().starts_with("generator") || has_child_kind(func, "*");
        cand.type_parameters = self.type_parameters(func);
        cand.signature = Some(self.signature(func));
        cand.body_span = func.child_by_field_name("body").map(|b| Span::from_node(&b));
    }

    /// `var`/`let`/`const` statements. Each declarator, and each identifier
    /// bound by a destructuring pattern, becomes its own candidate.
    fn match_variables(&mut self, node: Node, ctx: Context) {
        let binding = if node.kind() == "variable_declaration" {
            BindingKind::Var
        } else {
            match self.field_text(&node, "kind").as_deref() {
                Some("let") => BindingKind::Let,
                _ => BindingKind::Const,
            }
        };

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        let single = declarators.len() == 1;

        for decl in declarators {
            let Some(name_node) = decl.child_by_field_name("name") else {
                continue;
            };
            let span = if single {
                ctx.span_for(&node)
            } else {
                Span::from_node(&decl)
            };

            if name_node.kind() != "identifier" {
                let mut names = Vec::new();
                self.pattern_bindings(name_node, &mut names);
                for name in names {
                    let mut cand = Candidate::new(DeclKind::Variable, Some(name), span);
                    ctx.apply(&mut cand.syntax);
                    cand.binding = Some(binding);
                    self.emit(cand, ctx);
                }
                continue;
            }

            let name = self.text(&name_node);
            let value = decl.child_by_field_name("value");
            if let Some(class) = value.filter(|v| v.kind() == "class") {
                self.emit_class(class, Some(name), span, Some(binding), ctx);
                continue;
            }
            let func = value.filter(|v| is_function_kind(v.kind()));

            let mut cand = match func {
                Some(func) => {
                    let mut cand = Candidate::new(DeclKind::Function, Some(name), span);
                    self.fill_callable(&mut cand, &func);
                    cand
                }
                None => {
                    let mut cand = Candidate::new(DeclKind::Variable, Some(name), span);
                    cand.type_text = self.annotation(&decl, "type");
                    cand
                }
            };
            ctx.apply(&mut cand.syntax);
            cand.binding = Some(binding);
            self.emit(cand, ctx);
        }
    }

    /// Collect every identifier bound by an object or array pattern.
    fn pattern_bindings(&self, node: Node, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => out.push(self.text(&node)),
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.pattern_bindings(value, out);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.pattern_bindings(left, out);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.pattern_bindings(child, out);
                }
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    fn match_class(&mut self, node: Node, ctx: Context) {
        let name = self
            .field_text(&node, "name")
            .or_else(|| ctx.default_export.then(|| ANONYMOUS_DEFAULT.to_string()));
        self.emit_class(node, name, ctx.span_for(&node), None, ctx);
    }

    /// Emit a class and its members. Class declarations come through
    /// [`Self::match_class`]; `const Foo = class {}` passes the binding's
    /// name and span instead.
    fn emit_class(
        &mut self,
        node: Node,
        name: Option<String>,
        span: Span,
        binding: Option<BindingKind>,
        ctx: Context,
    ) {
        let mut cand = Candidate::new(DeclKind::Class, name, span);
        ctx.apply(&mut cand.syntax);
        cand.binding = binding;
        cand.syntax.decorated |= has_child_kind(&node, "decorator");
        cand.syntax.is_abstract =
            node.kind() == "abstract_class_declaration" || has_child_kind(&node, "abstract");
        cand.type_parameters = self.type_parameters(&node);
        cand.heritage = self.class_heritage(&node);

        let body = node.child_by_field_name("body");
        cand.body_span = body.map(|b| Span::from_node(&b));
        self.emit(cand, ctx);

        if let Some(body) = body {
            if self.enter(ctx, &body) {
                self.match_class_body(body, ctx.nested());
            }
        }
    }

    fn class_heritage(&self, node: &Node) -> Vec<HeritageClause> {
        let Some(heritage) = child_by_kind(node, "class_heritage") else {
            return Vec::new();
        };

        let mut clauses = Vec::new();
        let mut cursor = heritage.walk();
        for clause in heritage.named_children(&mut cursor) {
            let (relation, keyword) = match clause.kind() {
                "extends_clause" => (HeritageRelation::Extends, "extends"),
                "implements_clause" => (HeritageRelation::Implements, "implements"),
                _ => continue,
            };
            clauses.push(HeritageClause {
                relation,
                text: strip_keyword(&self.text(&clause), keyword),
            });
        }

        // JavaScript puts the superclass expression directly under class_heritage.
        if clauses.is_empty() {
            let text = strip_keyword(&self.text(&heritage), "extends");
            if !text.is_empty() {
                clauses.push(HeritageClause {
                    relation: HeritageRelation::Extends,
                    text,
                });
            }
        }
        clauses
    }

    fn match_class_body(&mut self, body: Node, ctx: Context) {
        // Method decorators are siblings of the method in class_body.
        let mut pending_decorator = false;
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "decorator" {
                pending_decorator = true;
                continue;
            }
            let decorated =
                std::mem::take(&mut pending_decorator) || has_child_kind(&member, "decorator");
            self.match_member(member, ctx, decorated, true);
        }
    }

    /// Class members and interface signatures.
    fn match_member(&mut self, node: Node, ctx: Context, decorated: bool, class_member: bool) {
        let kind = match node.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                accessor_kind(&node)
            }
            "public_field_definition" | "field_definition" | "property_signature" => {
                DeclKind::Property
            }
            "index_signature" => DeclKind::IndexSignature,
            "call_signature" => DeclKind::CallSignature,
            "construct_signature" => DeclKind::ConstructSignature,
            _ => return,
        };

        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"));
        let name = match kind {
            DeclKind::IndexSignature => Some("[index]".to_string()),
            DeclKind::CallSignature => Some("(call)".to_string()),
            DeclKind::ConstructSignature => Some("new".to_string()),
            _ => name_node.map(|n| unquote(&self.text(&n))),
        };

        let mut cand = Candidate::new(kind, name, Span::from_node(&node));
        let s = &mut cand.syntax;
        s.class_member = class_member;
        s.ambient = ctx.ambient || has_child_kind(&node, "declare");
        s.decorated = decorated;
        if kind != DeclKind::IndexSignature {
            s.private_name = name_node.is_some_and(|n| n.kind() == "private_property_identifier");
            s.computed_name = name_node.is_some_and(|n| n.kind() == "computed_property_name");
        }
        s.accessibility = self.accessibility(&node);
        s.is_static = has_child_kind(&node, "static");
        s.is_readonly = has_child_kind(&node, "readonly");
        s.is_abstract =
            node.kind() == "abstract_method_signature" || has_child_kind(&node, "abstract");
        s.is_optional = has_child_kind(&node, "?");
        s.is_override = has_child_kind(&node, "override_modifier");

        match kind {
            DeclKind::Property => {
                cand.type_text = self.annotation(&node, "type");
                if let Some(func) = node
                    .child_by_field_name("value")
                    .filter(|v| is_function_kind(v.kind()))
                {
                    self.fill_callable(&mut cand, &func);
                }
            }
            DeclKind::IndexSignature => cand.type_text = self.annotation(&node, "type"),
            _ => self.fill_callable(&mut cand, &node),
        }
        let constructor = class_member
            && kind == DeclKind::Method
            && cand.name.as_deref() == Some("constructor");
        self.emit(cand, ctx);

        if constructor {
            self.match_parameter_properties(&node, ctx);
        }
    }

    /// `constructor(private x: number, readonly y: string)` also declares the
    /// fields `x` and `y`. They become properties of the class, after the
    /// constructor.
    fn match_parameter_properties(&mut self, ctor: &Node, ctx: Context) {
        let Some(params) = ctor.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = params.walk();
        let params: Vec<Node> = params.named_children(&mut cursor).collect();

        for param in params {
            let accessibility = self.accessibility(&param);
            let is_readonly = has_child_kind(&param, "readonly");
            let is_override = has_child_kind(&param, "override_modifier");
            if accessibility.is_none() && !is_readonly && !is_override {
                continue;
            }
            let Some(pattern) = param
                .child_by_field_name("pattern")
                .filter(|p| p.kind() == "identifier")
            else {
                continue;
            };

            let mut cand =
                Candidate::new(DeclKind::Property, Some(self.text(&pattern)), Span::from_node(&param));
            let s = &mut cand.syntax;
            s.class_member = true;
            s.ambient = ctx.ambient;
            s.decorated = has_child_kind(&param, "decorator");
            s.accessibility = accessibility;
            s.is_readonly = is_readonly;
            s.is_override = is_override;
            s.is_optional = param.kind() == "optional_parameter";
            cand.type_text = self.annotation(&param, "type");
            self.emit(cand, ctx);
        }
    }

    fn accessibility(&self, node: &Node) -> Option<Accessibility> {
        let modifier = child_by_kind(node, "accessibility_modifier")?;
        match self.text(&modifier).as_str() {
            "private" => Some(Accessibility::Private),
            "protected" => Some(Accessibility::Protected),
            "public" => Some(Accessibility::Public),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // TypeScript-only declarations
    // -----------------------------------------------------------------------

    fn match_interface(&mut self, node: Node, ctx: Context) {
        let mut cand = Candidate::new(
            DeclKind::Interface,
            self.field_text(&node, "name"),
            ctx.span_for(&node),
        );
        ctx.apply(&mut cand.syntax);
        cand.type_parameters = self.type_parameters(&node);
        if let Some(clause) = child_by_kind(&node, "extends_type_clause") {
            cand.heritage.push(HeritageClause {
                relation: HeritageRelation::Extends,
                text: strip_keyword(&self.text(&clause), "extends"),
            });
        }

        let body = node.child_by_field_name("body");
        cand.body_span = body.map(|b| Span::from_node(&b));
        self.emit(cand, ctx);

        let Some(body) = body else {
            return;
        };
        if !self.enter(ctx, &body) {
            return;
        }
        let member_ctx = ctx.nested();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            self.match_member(member, member_ctx, false, false);
        }
    }

    fn match_type_alias(&mut self, node: Node, ctx: Context) {
        let mut cand = Candidate::new(
            DeclKind::TypeAlias,
            self.field_text(&node, "name"),
            ctx.span_for(&node),
        );
        ctx.apply(&mut cand.syntax);
        cand.type_parameters = self.type_parameters(&node);
        cand.type_text = self.field_text(&node, "value");
        self.emit(cand, ctx);
    }

    fn match_enum(&mut self, node: Node, ctx: Context) {
        let mut cand = Candidate::new(
            DeclKind::Enum,
            self.field_text(&node, "name"),
            ctx.span_for(&node),
        );
        ctx.apply(&mut cand.syntax);
        cand.syntax.is_const = has_child_kind(&node, "const");

        let body = node.child_by_field_name("body");
        cand.body_span = body.map(|b| Span::from_node(&b));
        self.emit(cand, ctx);

        let Some(body) = body else {
            return;
        };
        if !self.enter(ctx, &body) {
            return;
        }
        let member_ctx = ctx.nested();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let (name_node, value) = match member.kind() {
                "enum_assignment" => (
                    member.child_by_field_name("name"),
                    member.child_by_field_name("value"),
                ),
                "property_identifier" | "string" | "number" | "computed_property_name" => {
                    (Some(member), None)
                }
                _ => continue,
            };

            let name = name_node.map(|n| unquote(&self.text(&n)));
            let mut cand = Candidate::new(DeclKind::EnumMember, name, Span::from_node(&member));
            cand.syntax.ambient = ctx.ambient;
            cand.syntax.computed_name =
                name_node.is_some_and(|n| n.kind() == "computed_property_name");
            cand.enum_init = Some(match value {
                Some(value) => self.enum_init(&value),
                None => EnumInit::Implicit,
            });
            self.emit(cand, member_ctx);
        }
    }

    fn enum_init(&self, value: &Node) -> EnumInit {
        match value.kind() {
            "string" => return EnumInit::Literal(EnumValue::String(unquote(&self.text(value)))),
            "template_string" if !has_child_kind(value, "template_substitution") => {
                return EnumInit::Literal(EnumValue::String(unquote(&self.text(value))));
            }
            _ => {}
        }

        match self.fold_integer(value) {
            Some(n) => EnumInit::Literal(EnumValue::Number(n)),
            None => {
                let mut refs = Vec::new();
                self.collect_identifiers(*value, &mut refs);
                EnumInit::Expr {
                    raw: self.text(value),
                    refs,
                }
            }
        }
    }

    /// Fold integer arithmetic over numeric literals. Anything that mentions
    /// a name, or is not an integer, stays unevaluated.
    fn fold_integer(&self, node: &Node) -> Option<i64> {
        match node.kind() {
            "number" => parse_integer_literal(&self.text(node)),
            "parenthesized_expression" => self.fold_integer(&node.named_child(0)?),
            "unary_expression" => {
                let value = self.fold_integer(&node.child_by_field_name("argument")?)?;
                match self.field_text(node, "operator")?.as_str() {
                    "-" => value.checked_neg(),
                    "+" => Some(value),
                    "~" => Some(!(value as i32) as i64),
                    _ => None,
                }
            }
            "binary_expression" => {
                let left = self.fold_integer(&node.child_by_field_name("left")?)?;
                let right = self.fold_integer(&node.child_by_field_name("right")?)?;
                let op = self.field_text(node, "operator")?;
                fold_binary(&op, left, right)
            }
            _ => None,
        }
    }

    fn collect_identifiers(&self, node: Node, out: &mut Vec<String>) {
        let is_name = node.kind() == "identifier"
            || (node.kind() == "property_identifier"
                && node.parent().is_some_and(|p| p.kind() == "member_expression"));
        if is_name {
            let name = self.text(&node);
            if !out.contains(&name) {
                out.push(name);
            }
            return;
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.collect_identifiers(child, out);
        }
    }

    fn match_namespace(&mut self, node: Node, ctx: Context) {
        let body = node.child_by_field_name("body");
        let name_node = node.child_by_field_name("name");
        let Some(dotted) = name_node.filter(|n| n.kind() == "nested_identifier") else {
            let name = name_node.map(|n| unquote(&self.text(&n)));
            self.emit_namespace(name, node, body, ctx);
            return;
        };

        // `namespace A.B.C {}` declares A, B inside A, and C inside B. The
        // outer levels share the statement's span and have no body of their
        // own, so the next level nests under them.
        let text = self.text(&dotted);
        let segments: Vec<&str> = text.split('.').map(str::trim).collect();
        let Some((innermost, outer)) = segments.split_last() else {
            return;
        };
        let mut ctx = ctx;
        for segment in outer {
            let mut cand =
                Candidate::new(DeclKind::Namespace, Some(segment.to_string()), ctx.span_for(&node));
            ctx.apply(&mut cand.syntax);
            self.emit(cand, ctx);
            if !self.enter(ctx, &node) {
                return;
            }
            ctx = Context {
                exported: true,
                ..ctx.nested()
            };
        }
        self.emit_namespace(Some(innermost.to_string()), node, body, ctx);
    }

    fn emit_namespace(&mut self, name: Option<String>, node: Node, body: Option<Node>, ctx: Context) {
        let mut cand = Candidate::new(DeclKind::Namespace, name, ctx.span_for(&node));
        ctx.apply(&mut cand.syntax);
        cand.body_span = body.map(|b| Span::from_node(&b));
        self.emit(cand, ctx);

        if let Some(body) = body {
            if self.enter(ctx, &body) {
                self.walk_statements(body, ctx.nested());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Test-framework calls
    // -----------------------------------------------------------------------

    fn test_kind(&self, call: &Node) -> Option<DeclKind> {
        let root = self.callee_root(call.child_by_field_name("function")?)?;
        if SUITE_CALLEES.contains(&root.as_str()) {
            Some(DeclKind::TestSuite)
        } else if CASE_CALLEES.contains(&root.as_str()) {
            Some(DeclKind::TestCase)
        } else {
            None
        }
    }

    /// `describe.only` -> `describe`, `test.each(rows)` -> `test`.
    fn callee_root(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.text(&node)),
            "member_expression" => self.callee_root(node.child_by_field_name("object")?),
            "call_expression" => self.callee_root(node.child_by_field_name("function")?),
            _ => None,
        }
    }

    fn match_test_call(&mut self, call: Node, ctx: Context) {
        let Some(kind) = self.test_kind(&call) else {
            return;
        };
        let args = call.child_by_field_name("arguments");
        let mut title = None;
        let mut callback = None;
        if let Some(args) = args {
            let mut cursor = args.walk();
            for (i, arg) in args.named_children(&mut cursor).enumerate() {
                if i == 0 && !is_function_kind(arg.kind()) {
                    title = Some(unquote(&self.text(&arg)));
                }
                if is_function_kind(arg.kind()) {
                    callback = Some(arg);
                }
            }
        }

        let mut cand = Candidate::new(kind, title, Span::from_node(&call));
        cand.syntax.ambient = ctx.ambient;
        let body = callback.and_then(|cb| cb.child_by_field_name("body"));
        cand.body_span = body.map(|b| Span::from_node(&b));
        self.emit(cand, ctx);

        if kind == DeclKind::TestSuite {
            if let Some(body) = body {
                if self.enter(ctx, &body) {
                    self.walk_test_body(body, ctx.nested());
                }
            }
        }
    }

    fn walk_test_body(&mut self, body: Node, ctx: Context) {
        if body.kind() == "call_expression" {
            self.match_nested_call(body, ctx);
            return;
        }
        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            if stmt.kind() != "expression_statement" {
                continue;
            }
            if let Some(call) = stmt.named_child(0).filter(|c| c.kind() == "call_expression") {
                self.match_nested_call(call, ctx);
            }
        }
    }

    /// Inside a suite, tests may sit in callbacks of ordinary calls such as
    /// `cases.forEach(c => it(...))`.
    fn match_nested_call(&mut self, call: Node, ctx: Context) {
        if self.test_kind(&call).is_some() {
            self.match_test_call(call, ctx);
            return;
        }
        let Some(args) = call.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if !is_function_kind(arg.kind()) {
                continue;
            }
            if let Some(body) = arg.child_by_field_name("body") {
                self.walk_test_body(body, ctx);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Signatures and generics
    // -----------------------------------------------------------------------

    fn signature(&self, node: &Node) -> Signature {
        let mut sig = Signature::default();
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if param.kind() == "comment" {
                    continue;
                }
                sig.params.push(self.param(&param));
            }
        } else if let Some(param) = node.child_by_field_name("parameter") {
            sig.params.push(Param {
                name: self.text(&param),
                optional: false,
                rest: false,
                type_text: None,
                default_text: None,
            });
        }
        sig.return_type = self
            .annotation(node, "return_type")
            .or_else(|| self.annotation(node, "type").filter(|_| node.kind() == "construct_signature"));
        sig
    }

    /// Best-effort description of one formal parameter. Shapes that cannot be
    /// decomposed keep their raw text as the name.
    fn param(&self, node: &Node) -> Param {
        let mut param = Param {
            name: String::new(),
            optional: false,
            rest: false,
            type_text: None,
            default_text: None,
        };
        match node.kind() {
            "required_parameter" | "optional_parameter" => {
                let (name, rest) = match node.child_by_field_name("pattern") {
                    Some(pattern) => self.pattern_name(&pattern),
                    None => (self.text(node), false),
                };
                param.name = name;
                param.rest = rest;
                param.optional = node.kind() == "optional_parameter";
                param.type_text = self.annotation(node, "type");
                param.default_text = self.field_text(node, "value");
            }
            "assignment_pattern" => {
                let (name, rest) = match node.child_by_field_name("left") {
                    Some(left) => self.pattern_name(&left),
                    None => (self.text(node), false),
                };
                param.name = name;
                param.rest = rest;
                param.default_text = self.field_text(node, "right");
            }
            _ => {
                let (name, rest) = self.pattern_name(node);
                param.name = name;
                param.rest = rest;
            }
        }
        if param.name.is_empty() {
            param.name = "_".to_string();
        }
        param
    }

    fn pattern_name(&self, node: &Node) -> (String, bool) {
        let text = self.text(node);
        match node.kind() {
            "rest_pattern" => (text.trim_start_matches("...").trim().to_string(), true),
            _ => (text, false),
        }
    }

    fn type_parameters(&self, node: &Node) -> Vec<TypeParam> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        let mut cursor = params.walk();
        params
            .named_children(&mut cursor)
            .filter(|p| p.kind() == "type_parameter")
            .map(|p| TypeParam {
                name: self
                    .field_text(&p, "name")
                    .unwrap_or_else(|| self.text(&p)),
                constraint: self.field_text(&p, "constraint").map(|c| {
                    let c = strip_keyword(&c, "extends");
                    c.strip_prefix(':').unwrap_or(&c).trim().to_string()
                }),
                default: self
                    .field_text(&p, "value")
                    .map(|d| d.trim_start_matches('=').trim().to_string()),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Node helpers
    // -----------------------------------------------------------------------

    fn emit(&mut self, mut cand: Candidate, ctx: Context) {
        cand.depth = ctx.depth;
        self.out.candidates.push(cand);
    }

    /// Check the nesting bound before descending into a container body.
    fn enter(&mut self, ctx: Context, body: &Node) -> bool {
        if ctx.depth < self.options.max_depth {
            return true;
        }
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NestingTooDeep,
            format!(
                "containers nested deeper than {} levels are not descended into",
                self.options.max_depth
            ),
            Some(Span::from_node(body)),
        ));
        false
    }

    fn text(&self, node: &Node) -> String {
        node.utf8_text(self.src).unwrap_or("").to_string()
    }

    fn field_text(&self, node: &Node, field: &str) -> Option<String> {
        node.child_by_field_name(field).map(|n| self.text(&n))
    }

    /// Text of a `type_annotation` field without its leading colon.
    fn annotation(&self, node: &Node, field: &str) -> Option<String> {
        let text = self.field_text(node, field)?;
        let trimmed = text.trim_start();
        Some(trimmed.strip_prefix(':').unwrap_or(trimmed).trim().to_string())
    }
}

fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn is_typescript_only(kind: &str) -> bool {
    matches!(
        kind,
        "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration"
            | "internal_module"
            | "module"
            | "ambient_declaration"
            | "function_signature"
            | "abstract_class_declaration"
    )
}

fn accessor_kind(node: &Node) -> DeclKind {
    if has_child_kind(node, "get") {
        DeclKind::Getter
    } else if has_child_kind(node, "set") {
        DeclKind::Setter
    } else {
        DeclKind::Method
    }
}

/// Parse a JavaScript numeric literal that denotes an integer.
fn parse_integer_literal(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let radix = |prefix: &str, radix: u32| {
        lower
            .strip_prefix(prefix)
            .and_then(|rest| i64::from_str_radix(rest, radix).ok())
    };
    if lower.starts_with("0x") {
        return radix("0x", 16);
    }
    if lower.starts_with("0o") {
        return radix("0o", 8);
    }
    if lower.starts_with("0b") {
        return radix("0b", 2);
    }
    if let Ok(n) = lower.parse::<i64>() {
        return Some(n);
    }
    let float: f64 = lower.parse().ok()?;
    (float.fract() == 0.0 && float.abs() < i64::MAX as f64).then_some(float as i64)
}

/// Integer arithmetic with JavaScript's 32-bit semantics for bitwise operators.
fn fold_binary(op: &str, left: i64, right: i64) -> Option<i64> {
    let shift = (right & 31) as u32;
    match op {
        "+" => left.checked_add(right),
        "-" => left.checked_sub(right),
        "*" => left.checked_mul(right),
        "/" => (right != 0 && left % right == 0).then(|| left / right),
        "%" => left.checked_rem(right),
        "**" => u32::try_from(right).ok().and_then(|exp| left.checked_pow(exp)),
        "<<" => Some((left as i32).wrapping_shl(shift) as i64),
        ">>" => Some((left as i32).wrapping_shr(shift) as i64),
        ">>>" => Some((left as i32 as u32).wrapping_shr(shift) as i64),
        "|" => Some(((left as i32) | (right as i32)) as i64),
        "&" => Some(((left as i32) & (right as i32)) as i64),
        "^" => Some(((left as i32) ^ (right as i32)) as i64),
        _ => None,
    }
}

/// Strip one pair of matching quotes or backticks.
fn unquote(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'"' | b'\'' | b'`') {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}

fn strip_keyword(text: &str, keyword: &str) -> String {
    let trimmed = text.trim_start();
    trimmed
        .strip_prefix(keyword)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// First direct child of `node` with the given kind.
fn child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).find(|c| c.kind() == kind);
    result
}

fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == kind);
    result
}
