use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use serde::Serialize;

pub mod merkle;

/// Index of a [`Declaration`] inside its [`DeclarationIndex`](crate::index::DeclarationIndex) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeclId(pub(crate) usize);

impl DeclId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifier shared by every declaration site of one merged namespace or interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MergeGroupId(pub(crate) usize);

impl MergeGroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    Function,
    Method,
    Getter,
    Setter,
    Property,
    Variable,
    Enum,
    EnumMember,
    Interface,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Namespace,
    TypeAlias,
    TestSuite,
    TestCase,
}

impl DeclKind {
    /// Kinds that own nested declarations in the outline.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Enum
                | DeclKind::Interface
                | DeclKind::Namespace
                | DeclKind::TestSuite
        )
    }

    /// Kinds that take part in namespace/interface declaration merging.
    pub fn is_mergeable(self) -> bool {
        matches!(self, DeclKind::Namespace | DeclKind::Interface)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclKind::Class => "class",
            DeclKind::Function => "function",
            DeclKind::Method => "method",
            DeclKind::Getter => "get",
            DeclKind::Setter => "set",
            DeclKind::Property => "property",
            DeclKind::Variable => "variable",
            DeclKind::Enum => "enum",
            DeclKind::EnumMember => "member",
            DeclKind::Interface => "interface",
            DeclKind::CallSignature => "call",
            DeclKind::ConstructSignature => "new",
            DeclKind::IndexSignature => "index",
            DeclKind::Namespace => "namespace",
            DeclKind::TypeAlias => "type",
            DeclKind::TestSuite => "describe",
            DeclKind::TestCase => "test",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Exported,
    Default,
    Declare,
    Abstract,
    Public,
    Private,
    Protected,
    Static,
    Override,
    Readonly,
    Const,
    Async,
    Generator,
    Optional,
    Computed,
    Decorated,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Modifier::Exported => "export",
            Modifier::Default => "default",
            Modifier::Declare => "declare",
            Modifier::Abstract => "abstract",
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Override => "override",
            Modifier::Readonly => "readonly",
            Modifier::Const => "const",
            Modifier::Async => "async",
            Modifier::Generator => "generator",
            Modifier::Optional => "optional",
            Modifier::Computed => "computed",
            Modifier::Decorated => "decorated",
        };
        f.write_str(label)
    }
}

/// Ordered set of [`Modifier`] flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Modifiers(BTreeSet<Modifier>);

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modifier: Modifier) -> bool {
        self.0.insert(modifier)
    }

    pub fn remove(&mut self, modifier: Modifier) -> bool {
        self.0.remove(&modifier)
    }

    pub fn set(&mut self, modifier: Modifier, on: bool) {
        if on {
            self.0.insert(modifier);
        } else {
            self.0.remove(&modifier);
        }
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0.contains(&modifier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for modifier in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{modifier}")?;
            first = false;
        }
        Ok(())
    }
}

/// The keyword a variable binding was introduced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// Function-scoped, rebindable.
    Var,
    /// Block-scoped, rebindable.
    Let,
    /// Block-scoped, immutable binding.
    Const,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Var => f.write_str("var"),
            BindingKind::Let => f.write_str("let"),
            BindingKind::Const => f.write_str("const"),
        }
    }
}

/// Source location: byte offsets plus 1-based inclusive line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn from_node(node: &tree_sitter::Node) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
        }
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice `source` by this span, or `""` if it does not fit.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.byte_range()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub optional: bool,
    pub rest: bool,
    pub type_text: Option<String>,
    pub default_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub return_type: Option<String>,
}

impl Signature {
    /// Number of parameters, not counting a trailing rest parameter.
    pub fn arity(&self) -> usize {
        self.params.iter().filter(|p| !p.rest).count()
    }

    /// Parameters a caller must supply.
    pub fn required_arity(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !p.rest && !p.optional && p.default_text.is_none())
            .count()
    }

    pub fn has_rest(&self) -> bool {
        self.params.iter().any(|p| p.rest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeritageRelation {
    Extends,
    Implements,
}

/// An unresolved reference from a heritage clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeritageRef {
    pub relation: HeritageRelation,
    /// Referenced name with type arguments stripped (`Base`, `ns.Base`).
    pub name: String,
    /// Raw type argument text including the angle brackets, if any.
    pub type_arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EnumValue {
    Number(i64),
    String(String),
    /// Initializer kept as raw source text.
    Computed(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Number(n) => write!(f, "{n}"),
            EnumValue::String(s) => write!(f, "{s:?}"),
            EnumValue::Computed(raw) => f.write_str(raw),
        }
    }
}

/// A named, source-anchored construct extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub id: DeclId,
    /// `<file>::<name_path>`, unique within the file.
    pub symbol_id: String,
    pub kind: DeclKind,
    pub name: String,
    /// `/`-joined names from the root, e.g. `Outer/Inner/Config`.
    pub name_path: String,
    pub span: Span,
    /// `None` for body-less forms (overload signatures, abstract and ambient members).
    pub body_span: Option<Span>,
    pub modifiers: Modifiers,
    pub binding: Option<BindingKind>,
    pub signature: Option<Signature>,
    pub type_parameters: Vec<TypeParam>,
    /// Type annotation, or the right-hand side of a type alias.
    pub type_text: Option<String>,
    pub heritage: Vec<HeritageRef>,
    pub enum_value: Option<EnumValue>,
    /// Sibling enum members referenced by a computed initializer.
    pub member_refs: Vec<DeclId>,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub merge_group: Option<MergeGroupId>,
    pub summary: String,
    #[serde(skip)]
    pub content_hash: [u8; 32],
    #[serde(skip)]
    pub merkle_hash: [u8; 32],
    pub estimated_tokens: usize,
}

impl Declaration {
    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(modifier)
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// A function or method declared without a body.
    pub fn is_signature_only(&self) -> bool {
        matches!(self.kind, DeclKind::Function | DeclKind::Method) && self.body_span.is_none()
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    pub fn heritage_names(
        &self,
        relation: HeritageRelation,
    ) -> impl Iterator<Item = &str> + '_ {
        self.heritage
            .iter()
            .filter(move |h| h.relation == relation)
            .map(|h| h.name.as_str())
    }
}
