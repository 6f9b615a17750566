//! Property-based tests for the keyword expression parser.
//!
//! Tests validate:
//! 1. Rendering a tree and parsing it back yields the same tree
//! 2. Unparenthesised `and` chains bind tighter than `or`
//! 3. Arbitrary input never panics the parser

use logsift::expression::{parse, ExpressionNode};
use proptest::prelude::*;

fn keyword() -> impl Strategy<Value = String> {
    "[a-c ]{0,3}"
}

fn expression_tree() -> impl Strategy<Value = ExpressionNode> {
    let leaf = keyword().prop_map(ExpressionNode::Keyword);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ExpressionNode::and(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| ExpressionNode::or(l, r)),
        ]
    })
}

fn quote(keyword: &str) -> String {
    format!("\"{}\"", keyword)
}

// ===== Property 1: Display round trip =====

proptest! {
    #[test]
    fn display_parses_back_to_same_tree(tree in expression_tree()) {
        let rendered = tree.to_string();
        let reparsed = parse(&rendered);
        prop_assert_eq!(reparsed, Ok(tree));
    }

    #[test]
    fn reparsed_tree_evaluates_identically(tree in expression_tree(), line in "[a-c ]{0,12}") {
        let reparsed = parse(&tree.to_string()).unwrap();
        prop_assert_eq!(reparsed.evaluate(&line), tree.evaluate(&line));
    }
}

// ===== Property 2: Precedence =====

proptest! {
    #[test]
    fn and_binds_tighter_than_or(
        groups in prop::collection::vec(prop::collection::vec(keyword(), 1..4), 1..4),
        line in "[a-c ]{0,12}",
    ) {
        let source = groups
            .iter()
            .map(|group| group.iter().map(|k| quote(k)).collect::<Vec<_>>().join(" AND "))
            .collect::<Vec<_>>()
            .join(" or ");

        let expected = groups
            .iter()
            .any(|group| group.iter().all(|k| line.contains(k.as_str())));

        let tree = parse(&source).unwrap();
        prop_assert_eq!(tree.evaluate(&line), expected);
    }
}

// ===== Property 3: Robustness =====

proptest! {
    #[test]
    fn arbitrary_input_never_panics(input in any::<String>()) {
        let _ = parse(&input);
    }

    #[test]
    fn token_soup_never_panics(input in r#"(\(|\)|"a"|"|and|or| ){0,12}"#) {
        if let Ok(tree) = parse(&input) {
            let rendered = tree.to_string();
            prop_assert_eq!(parse(&rendered), Ok(tree));
        }
    }
}
