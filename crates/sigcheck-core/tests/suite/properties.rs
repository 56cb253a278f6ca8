use std::collections::HashMap;

use proptest::prelude::*;
use sigcheck_core::{
    detect, Decoration, DetectError, MemberDeclaration, ParameterType, SignatureNormalizer,
    SourceLocation, TypeDeclaration, Visibility,
};

const NAMES: &[&str] = &["get", "put", "hello"];
const PARAM_TYPES: &[&str] = &[
    "int",
    "int[]",
    "String",
    "java.lang.String",
    "List<String>",
    "List< java.lang.String >",
    "Map<K,V>",
];
const DECORATIONS: &[&str] = &["A", "B", "GetMapping(\"/x\")"];

fn visibility() -> impl Strategy<Value = Visibility> {
    prop_oneof![
        Just(Visibility::Public),
        Just(Visibility::Protected),
        Just(Visibility::Private),
        Just(Visibility::Package),
    ]
}

fn member(line: u32) -> impl Strategy<Value = MemberDeclaration> {
    (
        prop::sample::select(NAMES),
        prop::collection::vec(prop::sample::select(PARAM_TYPES), 0..3),
        visibility(),
        prop::collection::vec(prop::sample::select(DECORATIONS), 0..2),
    )
        .prop_map(move |(name, params, vis, decorations)| {
            decorations
                .into_iter()
                .fold(
                    MemberDeclaration::method(name)
                        .params(params.into_iter().map(ParameterType::new))
                        .visibility(vis)
                        .location(SourceLocation::new(line, 1)),
                    |b, d| b.decoration(Decoration::new(d).unwrap()),
                )
                .build()
                .unwrap()
        })
}

fn type_decl() -> impl Strategy<Value = TypeDeclaration> {
    (0usize..8)
        .prop_flat_map(|n| (0..n as u32).map(member).collect::<Vec<_>>())
        .prop_map(|members| TypeDeclaration::new("Generated", members).unwrap())
}

proptest! {
    #[test]
    fn same_signature_members_share_exactly_one_finding(ty in type_decl()) {
        let normalizer = SignatureNormalizer::default();
        let findings = detect(std::slice::from_ref(&ty)).unwrap();

        // line -> index of the finding it appears in
        let mut finding_of: HashMap<u32, usize> = HashMap::new();
        for (idx, finding) in findings.iter().enumerate() {
            prop_assert!(finding.members.len() >= 2);
            for m in &finding.members {
                prop_assert!(finding_of.insert(m.location().line, idx).is_none());
                prop_assert_eq!(&normalizer.normalize(m).unwrap(), &finding.signature);
            }
        }

        let members = ty.members();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                let same = normalizer.normalize(a).unwrap() == normalizer.normalize(b).unwrap();
                let fa = finding_of.get(&a.location().line);
                let fb = finding_of.get(&b.location().line);
                if same {
                    prop_assert!(fa.is_some());
                    prop_assert_eq!(fa, fb);
                } else if fa.is_some() {
                    prop_assert_ne!(fa, fb);
                }
            }
        }
    }

    #[test]
    fn detect_is_deterministic(ty in type_decl()) {
        let types = vec![ty];
        prop_assert_eq!(detect(&types).unwrap(), detect(&types).unwrap());
    }

    #[test]
    fn groups_reaching_the_classifier_are_always_valid(ty in type_decl()) {
        let types = vec![ty];
        let hit_classify = matches!(detect(&types), Err(DetectError::Classify { .. }));
        prop_assert!(!hit_classify);
    }
}
