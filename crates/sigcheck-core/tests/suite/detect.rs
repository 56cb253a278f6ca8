use std::path::PathBuf;

use pretty_assertions::assert_eq;
use sigcheck_core::{
    detect, ConflictKind, Decoration, DetectOptions, DetectionEngine, GenericMethodPolicy,
    MemberDeclaration, ParameterType, Severity, SourceLocation, SourceUnit, TypeDeclaration,
    Visibility,
};

fn hello(vis: Visibility, line: u32) -> MemberDeclaration {
    MemberDeclaration::method("hello")
        .visibility(vis)
        .location(SourceLocation::new(line, 12))
        .build()
        .unwrap()
}

fn method(name: &str, params: &[&str], vis: Visibility, line: u32) -> MemberDeclaration {
    MemberDeclaration::method(name)
        .params(params.iter().map(|p| ParameterType::new(*p)))
        .visibility(vis)
        .location(SourceLocation::new(line, 5))
        .build()
        .unwrap()
}

#[test]
fn public_and_protected_hello_is_one_visibility_conflict() {
    let ty = TypeDeclaration::new(
        "ExampleController",
        [
            hello(Visibility::Public, 4),
            hello(Visibility::Protected, 9),
        ],
    )
    .unwrap();

    let findings = detect(&[ty]).unwrap();
    assert_eq!(findings.len(), 1);

    let finding = &findings[0];
    assert_eq!(finding.kind, ConflictKind::VisibilityConflict);
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.type_name, "ExampleController");
    assert_eq!(finding.signature.to_string(), "hello()");
    let lines: Vec<u32> = finding.locations().map(|l| l.line).collect();
    assert_eq!(lines, vec![4, 9]);
    assert_eq!(finding.primary_location().line, 4);
    assert_eq!(
        finding.message(),
        "`hello()` is declared more than once with different visibility in `ExampleController`"
    );
}

#[test]
fn overloads_by_arity_are_not_conflicts() {
    let ty = TypeDeclaration::new(
        "Greeter",
        [
            method("hello", &[], Visibility::Public, 1),
            method("hello", &["int"], Visibility::Public, 2),
        ],
    )
    .unwrap();
    assert!(detect(&[ty]).unwrap().is_empty());
}

#[test]
fn identical_declarations_in_different_types_do_not_conflict() {
    let a = TypeDeclaration::new("A", [hello(Visibility::Public, 1)]).unwrap();
    let b = TypeDeclaration::new("B", [hello(Visibility::Public, 1)]).unwrap();
    let inner = TypeDeclaration::new("A.Inner", [hello(Visibility::Private, 3)]).unwrap();
    assert!(detect(&[a, inner, b]).unwrap().is_empty());
}

#[test]
fn findings_are_ordered_by_type_then_first_member() {
    let first = TypeDeclaration::new(
        "First",
        [
            method("b", &[], Visibility::Public, 1),
            method("a", &[], Visibility::Public, 2),
            method("a", &[], Visibility::Public, 3),
            method("b", &[], Visibility::Private, 4),
        ],
    )
    .unwrap();
    let second = TypeDeclaration::new(
        "Second",
        [
            method("c", &["String"], Visibility::Public, 1),
            method("c", &["java.lang.String"], Visibility::Public, 2),
        ],
    )
    .unwrap();

    let findings = detect(&[first, second]).unwrap();
    let summary: Vec<(String, String, ConflictKind)> = findings
        .iter()
        .map(|f| (f.type_name.clone(), f.signature.to_string(), f.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("First".to_string(), "b()".to_string(), ConflictKind::VisibilityConflict),
            ("First".to_string(), "a()".to_string(), ConflictKind::ExactDuplicate),
            ("Second".to_string(), "c(String)".to_string(), ConflictKind::ExactDuplicate),
        ]
    );
}

#[test]
fn decoration_differences_downgrade_to_warning() {
    let mapped = MemberDeclaration::method("hello")
        .visibility(Visibility::Public)
        .decoration(Decoration::new("GetMapping(\"/hello\")").unwrap())
        .build()
        .unwrap();
    let plain = hello(Visibility::Public, 7);
    let ty = TypeDeclaration::new("ExampleController", [mapped, plain]).unwrap();

    let findings = detect(&[ty]).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, ConflictKind::DecorationConflict);
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[test]
fn ignored_decorations_are_configurable() {
    let overriding = MemberDeclaration::method("toString")
        .visibility(Visibility::Public)
        .decoration(Decoration::new("Override").unwrap())
        .build()
        .unwrap();
    let plain = method("toString", &[], Visibility::Public, 2);
    let ty = TypeDeclaration::new("Value", [overriding, plain]).unwrap();

    let default = DetectionEngine::default().detect(std::slice::from_ref(&ty)).unwrap();
    assert_eq!(default[0].kind, ConflictKind::DecorationConflict);

    let engine = DetectionEngine::new(&DetectOptions {
        ignored_decorations: vec!["Override".into()],
        ..DetectOptions::default()
    });
    let findings = engine.detect(&[ty]).unwrap();
    assert_eq!(findings[0].kind, ConflictKind::ExactDuplicate);
}

#[test]
fn generic_method_policy_changes_identity() {
    let generic = |tp: &str, line| {
        MemberDeclaration::method("first")
            .type_param(tp)
            .param(ParameterType::new(format!("List<{tp}>")))
            .location(SourceLocation::new(line, 1))
            .build()
            .unwrap()
    };
    let ty = TypeDeclaration::new("Lists", [generic("T", 1), generic("E", 2)]).unwrap();

    let syntactic = DetectionEngine::default();
    assert!(syntactic.detect(std::slice::from_ref(&ty)).unwrap().is_empty());

    let positional = DetectionEngine::new(&DetectOptions {
        generic_methods: GenericMethodPolicy::Positional,
        ..DetectOptions::default()
    });
    let findings = positional.detect(&[ty]).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].signature.to_string(), "<#0> first(List<#0>)");
}

#[test]
fn detect_is_idempotent_and_parallel_matches_sequential() {
    let types: Vec<TypeDeclaration> = (0..32)
        .map(|i| {
            TypeDeclaration::new(
                format!("T{i}"),
                [
                    method("run", &["int"], Visibility::Public, 1),
                    method("run", &["long"], Visibility::Public, 2),
                    method("run", &["int"], Visibility::Package, 3),
                    method("stop", &[], Visibility::Public, 4),
                    method("stop", &[], Visibility::Public, 5),
                ],
            )
            .unwrap()
        })
        .collect();

    let engine = DetectionEngine::default();
    let once = engine.detect(&types).unwrap();
    let twice = engine.detect(&types).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 64);
    assert_eq!(engine.detect_parallel(&types).unwrap(), once);
}

#[test]
fn detect_units_keeps_file_order() {
    let dup = TypeDeclaration::new(
        "Dup",
        [hello(Visibility::Public, 1), hello(Visibility::Public, 2)],
    )
    .unwrap();
    let clean = TypeDeclaration::new("Clean", [hello(Visibility::Public, 1)]).unwrap();

    let units = vec![
        SourceUnit {
            path: PathBuf::from("b/Dup.java"),
            types: vec![dup],
        },
        SourceUnit {
            path: PathBuf::from("a/Clean.java"),
            types: vec![clean],
        },
    ];
    let results = DetectionEngine::default().detect_units(&units).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].path, PathBuf::from("b/Dup.java"));
    assert_eq!(results[0].findings.len(), 1);
    assert_eq!(results[1].path, PathBuf::from("a/Clean.java"));
    assert!(results[1].findings.is_empty());
}

#[test]
fn fields_in_a_type_never_reach_the_normalizer() {
    let ty = TypeDeclaration::new(
        "Holder",
        [
            MemberDeclaration::field("value").build().unwrap(),
            MemberDeclaration::field("value").build().unwrap(),
            hello(Visibility::Public, 3),
        ],
    )
    .unwrap();
    assert!(detect(&[ty]).unwrap().is_empty());
}

#[test]
fn lone_members_and_field_only_types_never_reach_the_classifier() {
    let types = vec![
        TypeDeclaration::new("Empty", Vec::<MemberDeclaration>::new()).unwrap(),
        TypeDeclaration::new("Single", [hello(Visibility::Public, 2)]).unwrap(),
        TypeDeclaration::new(
            "Fields",
            [
                MemberDeclaration::field("id").build().unwrap(),
                MemberDeclaration::field("id").build().unwrap(),
            ],
        )
        .unwrap(),
    ];
    let findings = detect(&types).unwrap();
    assert_eq!(findings, Vec::new());
    assert_eq!(
        DetectionEngine::default().detect_parallel(&types).unwrap(),
        findings
    );
}

#[test]
fn finding_serializes_for_reporters() {
    let ty = TypeDeclaration::new(
        "ExampleController",
        [
            hello(Visibility::Public, 4),
            hello(Visibility::Private, 9),
        ],
    )
    .unwrap();
    let findings = detect(&[ty]).unwrap();
    let value = serde_json::to_value(&findings[0]).unwrap();
    assert_eq!(value["signature"], "hello()");
    assert_eq!(value["kind"], "visibility_conflict");
    assert_eq!(value["severity"], "error");
    assert_eq!(value["members"][1]["visibility"], "private");
    assert_eq!(value["members"][1]["location"]["line"], 9);
}
