//! Property tests: N-Triples codec round trip
//!
//! `parse ∘ serialize` must be the identity on any well-formed quad
//! multiset, including literals with escapes, language tags, datatypes,
//! blank nodes, and named graphs.

use chrysalis_core::model::{parse_quads, serialize_quads, GraphName, Literal, Quad, Subject, Term};
use proptest::prelude::*;

fn arb_iri() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
        .prop_map(|local| format!("https://chrysalis.dev/test/{}", local))
}

fn arb_lexical() -> impl Strategy<Value = String> {
    // Printable ASCII plus the characters the codec escapes
    proptest::collection::vec(
        prop_oneof![
            proptest::char::range(' ', '~'),
            Just('\n'),
            Just('\r'),
            Just('\t'),
            Just('"'),
            Just('\\'),
        ],
        0..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        arb_lexical().prop_map(Literal::string),
        (arb_lexical(), arb_iri()).prop_map(|(lex, dt)| Literal::typed(lex, dt)),
        (arb_lexical(), "[a-z]{2}(-[A-Z]{2})?").prop_map(|(lex, lang)| Literal::lang(lex, lang)),
        any::<i64>().prop_map(Literal::integer),
        any::<bool>().prop_map(Literal::boolean),
    ]
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    prop_oneof![
        arb_iri().prop_map(Subject::named),
        "[a-z0-9]{1,8}".prop_map(Subject::blank),
    ]
}

fn arb_object() -> impl Strategy<Value = Term> {
    prop_oneof![
        arb_iri().prop_map(Term::named),
        "[a-z0-9]{1,8}".prop_map(Term::blank),
        arb_literal().prop_map(Term::Literal),
    ]
}

fn arb_graph() -> impl Strategy<Value = GraphName> {
    prop_oneof![
        Just(GraphName::Default),
        arb_iri().prop_map(GraphName::named),
    ]
}

fn arb_quad() -> impl Strategy<Value = Quad> {
    (arb_subject(), arb_iri(), arb_object(), arb_graph()).prop_map(|(s, p, o, g)| {
        Quad::in_graph(s, p, o, g)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parse_serialize_is_bag_identity(quads in proptest::collection::vec(arb_quad(), 0..12)) {
        let text = serialize_quads(&quads);
        let parsed = parse_quads(&text).unwrap();

        let mut expected = quads.clone();
        let mut actual = parsed;
        expected.sort();
        actual.sort();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn serialized_lines_match_quad_count(quads in proptest::collection::vec(arb_quad(), 0..12)) {
        let text = serialize_quads(&quads);
        prop_assert_eq!(text.lines().count(), quads.len());
    }
}
