//! Extraction over the TypeScript fixture corpus.

mod helpers;

use std::fs;
use std::path::Path;

use declmap::symbols::{EnumValue, HeritageRelation};
use declmap::{extract, DeclKind, Dialect, ExtractOptions, Modifier, ParserRegistry};
use pretty_assertions::assert_eq;

use helpers::{child_names, count, fixture_path, find, load, names};

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

#[test]
fn classes_and_their_members() {
    let index = load("typescript/classes.ts");
    assert_eq!(index.dialect(), Dialect::TypeScript);
    assert!(index.diagnostics().is_empty(), "{:?}", index.diagnostics());

    assert_eq!(
        names(&index, DeclKind::Class),
        [
            "SimpleClass",
            "ClassWithMethods",
            "ExtendedClass",
            "AbstractClass",
            "ImplementedClass",
            "ConfigClass",
            "BugReport",
            "ExportedClass",
            "OpenRouterProvider",
            "TutorPlugin",
        ]
    );
    assert_eq!(names(&index, DeclKind::Interface), ["Processable"]);
    assert_eq!(count(&index, DeclKind::Property), 10);
    assert_eq!(count(&index, DeclKind::Method), 17);
    assert_eq!(count(&index, DeclKind::Getter), 1);
    assert_eq!(count(&index, DeclKind::Setter), 1);
    assert_eq!(index.len(), 40);

    let class = find(&index, "ClassWithMethods");
    assert_eq!(
        child_names(&index, class),
        [
            "value",
            "constructor",
            "getValue",
            "setValue",
            "createDefault",
            "displayValue",
            "displayValue",
        ]
    );
    assert!(find(&index, "ClassWithMethods/createDefault").has(Modifier::Static));
    assert!(find(&index, "ClassWithMethods/value").has(Modifier::Private));
    assert!(find(&index, "SimpleClass").children.is_empty());
}

#[test]
fn accessor_pair_gets_distinct_symbol_ids() {
    let index = load("typescript/classes.ts");
    let ids: Vec<&str> = index
        .by_path("ClassWithMethods/displayValue")
        .iter()
        .map(|d| d.symbol_id.as_str())
        .collect();
    assert_eq!(
        ids,
        [
            "typescript/classes.ts::ClassWithMethods/displayValue",
            "typescript/classes.ts::ClassWithMethods/displayValue-2",
        ]
    );
}

#[test]
fn class_modifiers() {
    let index = load("typescript/classes.ts");

    let default = index.default_export().expect("default export");
    assert_eq!(default.name, "TutorPlugin");
    assert!(!default.has(Modifier::Exported));

    let exported: Vec<&str> = index
        .with_modifier(Modifier::Exported)
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(exported, ["ExportedClass", "OpenRouterProvider"]);

    assert!(find(&index, "BugReport").has(Modifier::Decorated));
    assert!(find(&index, "AbstractClass").has(Modifier::Abstract));

    let process = find(&index, "AbstractClass/process");
    assert!(process.has(Modifier::Abstract));
    assert!(process.has(Modifier::Protected));
    assert!(process.body_span.is_none());
    assert!(find(&index, "AbstractClass/execute").has(Modifier::Public));

    let config = find(&index, "ConfigClass");
    let id = find(&index, "ConfigClass/id");
    assert!(id.has(Modifier::Readonly));
    assert_eq!(id.parent, Some(config.id));
    assert!(find(&index, "ConfigClass/name").has(Modifier::Optional));
}

#[test]
fn class_heritage() {
    let index = load("typescript/classes.ts");

    let extended = find(&index, "ExtendedClass");
    assert_eq!(
        extended.heritage_names(HeritageRelation::Extends).collect::<Vec<_>>(),
        ["ClassWithMethods"]
    );
    assert_eq!(extended.type_parameters[0].name, "T");

    let implemented = find(&index, "ImplementedClass");
    assert_eq!(
        implemented.heritage_names(HeritageRelation::Extends).collect::<Vec<_>>(),
        ["AbstractClass"]
    );
    assert_eq!(
        implemented.heritage_names(HeritageRelation::Implements).collect::<Vec<_>>(),
        ["Processable"]
    );

    let implementors: Vec<&str> = index
        .implementors_of("Processable")
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(implementors, ["ImplementedClass", "OpenRouterProvider"]);
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[test]
fn function_forms() {
    let index = load("typescript/functions.ts");
    assert_eq!(
        names(&index, DeclKind::Function),
        [
            "simple_function",
            "function_with_params",
            "arrow_function",
            "arrow_with_params",
            "function_expression",
            "named_function_expression",
            "async_function",
            "async_arrow",
            "generator_function",
            "generic_function",
            "optional_params",
            "rest_params",
            "myFunc",
            "exportedFunction",
            "asyncExportedFunction",
            "defaultExportedFunction",
        ]
    );
    assert_eq!(index.len(), 16);
    assert!(index.declarations().iter().all(|d| d.is_top_level()));
}

#[test]
fn function_details() {
    let index = load("typescript/functions.ts");

    assert!(find(&index, "async_function").has(Modifier::Async));
    assert!(find(&index, "async_arrow").has(Modifier::Async));
    assert!(find(&index, "generator_function").has(Modifier::Generator));
    assert!(find(&index, "myFunc").is_signature_only());
    assert!(!find(&index, "simple_function").is_signature_only());
    assert_eq!(
        index.default_export().map(|d| d.name.as_str()),
        Some("defaultExportedFunction")
    );

    let with_params = find(&index, "function_with_params");
    let sig = with_params.signature.as_ref().expect("signature");
    assert_eq!(sig.arity(), 2);
    assert_eq!(sig.return_type.as_deref(), Some("number"));

    let optional = find(&index, "optional_params").signature.as_ref().expect("signature");
    assert_eq!(optional.arity(), 2);
    assert_eq!(optional.required_arity(), 1);

    let rest = find(&index, "rest_params").signature.as_ref().expect("signature");
    assert!(rest.has_rest());
    assert_eq!(rest.arity(), 1);

    let generic = find(&index, "generic_function");
    assert_eq!(generic.type_parameters.len(), 1);
    assert_eq!(generic.type_parameters[0].name, "T");
}

// ---------------------------------------------------------------------------
// Interfaces
// ---------------------------------------------------------------------------

#[test]
fn interfaces_and_signatures() {
    let index = load("typescript/interfaces.ts");
    assert!(index.diagnostics().is_empty(), "{:?}", index.diagnostics());
    assert_eq!(count(&index, DeclKind::Interface), 13);
    assert_eq!(names(&index, DeclKind::Namespace), ["Interfaces"]);

    let indexed = find(&index, "IndexedInterface");
    let kinds: Vec<DeclKind> = index.children(indexed.id).map(|d| d.kind).collect();
    assert_eq!(kinds, [DeclKind::IndexSignature, DeclKind::IndexSignature]);

    let callable = find(&index, "CallableInterface");
    let kinds: Vec<DeclKind> = index.children(callable.id).map(|d| d.kind).collect();
    assert_eq!(kinds, [DeclKind::CallSignature, DeclKind::Property]);

    let constructable = find(&index, "ConstructableInterface");
    let kinds: Vec<DeclKind> = index.children(constructable.id).map(|d| d.kind).collect();
    assert_eq!(kinds, [DeclKind::ConstructSignature]);

    let optional = find(&index, "OptionalInterface");
    assert_eq!(child_names(&index, optional), ["required", "optional", "id"]);
    assert!(find(&index, "OptionalInterface/optional").has(Modifier::Optional));
    assert!(find(&index, "OptionalInterface/id").has(Modifier::Readonly));

    assert_eq!(
        find(&index, "Interfaces/NamespacedInterface").kind,
        DeclKind::Interface
    );
}

#[test]
fn interface_generics_and_heritage() {
    let index = load("typescript/interfaces.ts");

    let generic = find(&index, "GenericInterface");
    let params: Vec<(&str, Option<&str>)> = generic
        .type_parameters
        .iter()
        .map(|p| (p.name.as_str(), p.default.as_deref()))
        .collect();
    assert_eq!(params, [("T", None), ("U", Some("string"))]);

    let extended = find(&index, "ExtendedInterface");
    assert_eq!(
        extended.heritage_names(HeritageRelation::Extends).collect::<Vec<_>>(),
        ["SimpleInterface", "MethodInterface"]
    );
    let subtypes: Vec<&str> = index
        .subtypes_of("MethodInterface")
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(subtypes, ["ExtendedInterface"]);
}

#[test]
fn merged_interface_members_are_unioned() {
    let index = load("typescript/interfaces.ts");
    let sites = index.by_path("MergedInterface");
    assert_eq!(sites.len(), 2);
    assert!(sites[0].merge_group.is_some());
    assert_eq!(sites[0].merge_group, sites[1].merge_group);

    let members: Vec<&str> = index
        .merged_members(sites[1].id)
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(members, ["first", "second"]);
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[test]
fn enums_and_members() {
    let index = load("typescript/enums.ts");
    assert!(index.diagnostics().is_empty(), "{:?}", index.diagnostics());
    assert_eq!(count(&index, DeclKind::Enum), 10);
    assert_eq!(count(&index, DeclKind::EnumMember), 34);
    assert_eq!(names(&index, DeclKind::Namespace), ["EnumNamespace"]);

    let nested = find(&index, "EnumNamespace/NestedEnum");
    assert_eq!(nested.kind, DeclKind::Enum);
    assert!(nested.has(Modifier::Exported));
    assert!(find(&index, "ConstEnum").has(Modifier::Const));
}

#[test]
fn enum_values_are_resolved() {
    let index = load("typescript/enums.ts");
    let values = |path: &str| -> Vec<Option<EnumValue>> {
        index
            .children(find(&index, path).id)
            .map(|m| m.enum_value.clone())
            .collect()
    };

    assert_eq!(
        values("SimpleEnum"),
        [
            Some(EnumValue::Number(0)),
            Some(EnumValue::Number(1)),
            Some(EnumValue::Number(2)),
        ]
    );
    assert_eq!(
        values("MixedEnum"),
        [
            Some(EnumValue::Number(0)),
            Some(EnumValue::Number(1)),
            Some(EnumValue::Number(2)),
            Some(EnumValue::Number(4)),
            Some(EnumValue::String("permissions".into())),
        ]
    );
    assert_eq!(
        find(&index, "StringEnum/Red").enum_value,
        Some(EnumValue::String("red".into()))
    );

    let base = find(&index, "ComputedEnum/Base");
    let double = find(&index, "ComputedEnum/Double");
    assert_eq!(double.enum_value, Some(EnumValue::Computed("Base * 2".into())));
    assert_eq!(double.member_refs, [base.id]);
    assert_eq!(find(&index, "ComputedEnum/Triple").member_refs, [base.id]);
}

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

#[test]
fn namespaces_nest_their_declarations() {
    let index = load("typescript/namespaces.ts");
    assert!(index.diagnostics().is_empty(), "{:?}", index.diagnostics());
    assert_eq!(count(&index, DeclKind::Namespace), 10);
    assert_eq!(
        names(&index, DeclKind::Interface),
        ["Config", "Logger", "Options", "ProcessEnv", "Container"]
    );

    let inner = find(&index, "OuterNamespace/InnerNamespace");
    assert_eq!(child_names(&index, inner), ["data", "Config"]);
    assert_eq!(index.depth(inner.id), 1);
    assert_eq!(
        find(&index, "OuterNamespace/InnerNamespace/Config").symbol_id,
        "typescript/namespaces.ts::OuterNamespace/InnerNamespace/Config"
    );

    let logger = find(&index, "UtilityNamespace/ConsoleLogger");
    assert_eq!(logger.kind, DeclKind::Class);
    assert!(logger.has(Modifier::Exported));
    assert_eq!(
        logger.heritage_names(HeritageRelation::Implements).collect::<Vec<_>>(),
        ["Logger"]
    );
}

#[test]
fn ambient_namespaces() {
    let index = load("typescript/namespaces.ts");

    assert!(find(&index, "ExternalLibrary").has(Modifier::Declare));
    let initialize = find(&index, "ExternalLibrary/initialize");
    assert!(initialize.has(Modifier::Declare));
    assert!(initialize.is_signature_only());

    let env = find(&index, "global/NodeJS/ProcessEnv");
    assert_eq!(env.kind, DeclKind::Interface);
    assert!(env.has(Modifier::Declare));
    assert_eq!(index.depth(env.id), 2);
}

#[test]
fn merged_namespaces_share_a_group() {
    let index = load("typescript/namespaces.ts");
    let sites = index.by_path("MergedNamespace");
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].merge_group, sites[1].merge_group);
    assert_ne!(sites[0].symbol_id, sites[1].symbol_id);

    let members: Vec<&str> = index
        .members_of("MergedNamespace")
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(members, ["first", "second"]);
}

// ---------------------------------------------------------------------------
// Types and variables
// ---------------------------------------------------------------------------

#[test]
fn type_aliases() {
    let index = load("typescript/types.ts");
    assert_eq!(count(&index, DeclKind::TypeAlias), index.len());
    assert!(index.declarations().iter().all(|d| d.type_text.is_some()));

    let exported: Vec<&str> = index.exported().map(|d| d.name.as_str()).collect();
    assert_eq!(exported, ["ExportedType", "ConfigOptions"]);
}

#[test]
fn variables_and_function_values() {
    let index = load("typescript/variables.ts");
    assert_eq!(
        names(&index, DeclKind::Function),
        [
            "arrow_function_const",
            "function_expression",
            "named_function_expression",
            "simple_arrow",
            "arrow_with_params",
            "arrow_with_body",
            "async_arrow_func",
        ]
    );
    assert_eq!(count(&index, DeclKind::Variable), 23);

    assert!(find(&index, "jQuery").has(Modifier::Declare));
    assert!(find(&index, "EXPORTED_CONST").has(Modifier::Exported));
    assert!(find(&index, "exportedLet").has(Modifier::Exported));
    assert!(!find(&index, "simple_let").has(Modifier::Exported));
}

// ---------------------------------------------------------------------------
// Test files
// ---------------------------------------------------------------------------

#[test]
fn test_suites_in_typescript() {
    let index = load("typescript/tests/module.test.ts");

    let suites = names(&index, DeclKind::TestSuite);
    assert_eq!(suites, ["Sample test suite", "Interface test suite"]);

    let first = find(&index, "Sample test suite");
    assert_eq!(
        child_names(&index, first),
        [
            "should pass basic test",
            "should handle async operations",
            "should test with typed parameters",
        ]
    );

    let second = find(&index, "Interface test suite");
    assert_eq!(child_names(&index, second), ["should handle ${testCase.input}"]);

    assert!(find(&index, "TestSample/test_async_method").has(Modifier::Async));
    assert_eq!(names(&index, DeclKind::Interface), ["TestData"]);
    assert_eq!(index.len(), 14);
}

// ---------------------------------------------------------------------------
// Repeat extraction
// ---------------------------------------------------------------------------

#[test]
fn extracting_the_same_tree_twice_gives_the_same_index() {
    let registry = ParserRegistry::new();
    let options = ExtractOptions::default();
    for relative in [
        "typescript/classes.ts",
        "typescript/namespaces.ts",
        "typescript/enums.ts",
        "typescript/interfaces.ts",
    ] {
        let source = fs::read_to_string(fixture_path(relative)).unwrap();
        let tree = registry.parse(Path::new(relative), &source).unwrap();

        let first = extract(&tree, &options);
        let second = extract(&tree, &options);
        assert_eq!(first.declarations(), second.declarations(), "{relative}");
        assert_eq!(first.diagnostics(), second.diagnostics(), "{relative}");
        assert!(first.unchanged_from(&second), "{relative}");
    }
}
