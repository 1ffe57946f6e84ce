use cascade_selectors::parse_selector;
use cascade_selectors::unify::{unify_complex, weave};
use cascade_selectors::{ComplexSelector, SelectorList};

fn list(source: &str) -> SelectorList {
    parse_selector(source).expect("selector should parse")
}

#[test]
fn parse_emit_round_trip_canonicalizes() {
    // Whitespace runs collapse around combinators and pseudo casing folds
    // for identity but not for output.
    let cases = [
        (".a   .b", ".a .b"),
        (".a  >  .b", ".a > .b"),
        (".a,.b", ".a, .b"),
        ("a , b", "a, b"),
        (".a\t+\t.b", ".a + .b"),
    ];
    for (source, expected) in cases {
        assert_eq!(list(source).to_string(), expected);
    }
}

#[test]
fn superselector_reflexivity_over_grammar() {
    let sources = [
        "*",
        "div",
        ".a.b",
        "#id",
        "[href]",
        "[href^=\"x\"]",
        ":hover",
        "::before",
        "%ph",
        ".a .b > .c + .d ~ .e",
        ":not(.a, .b)",
        ":matches(.a .b, .c)",
        ":nth-child(2n of .x)",
    ];
    for source in sources {
        let parsed = list(source);
        assert!(
            parsed.is_superselector(&parsed),
            "{} should be a super-selector of itself",
            source
        );
    }
}

#[test]
fn superselector_is_transitive_on_samples() {
    let a = list(".a");
    let b = list(".a.b");
    let c = list(".a.b.c");
    assert!(a.is_superselector(&b));
    assert!(b.is_superselector(&c));
    assert!(a.is_superselector(&c));
}

#[test]
fn weave_keeps_input_order_stable() {
    let lhs = list(".x").members[0].implicit_components();
    let rhs = list(".a .b").members[0].implicit_components();
    let woven: Vec<String> = weave(&[lhs, rhs])
        .into_iter()
        .map(|components| ComplexSelector::from_implicit(components).to_string())
        .collect();
    assert_eq!(woven, vec![".x .a .b", ".a .x .b"]);

    // Weaving is deterministic: running it again yields the same order.
    let lhs = list(".x").members[0].implicit_components();
    let rhs = list(".a .b").members[0].implicit_components();
    let again: Vec<String> = weave(&[lhs, rhs])
        .into_iter()
        .map(|components| ComplexSelector::from_implicit(components).to_string())
        .collect();
    assert_eq!(woven, again);
}

#[test]
fn unify_complex_sibling_combinators() {
    let lhs = list(".a + .x").members[0].implicit_components();
    let rhs = list(".b ~ .x").members[0].implicit_components();
    let unified: Vec<String> = unify_complex(&[lhs, rhs])
        .expect("siblings should unify")
        .into_iter()
        .map(|components| ComplexSelector::from_implicit(components).to_string())
        .collect();
    // `~` relaxes around `+`: either .b precedes the adjacent pair or the
    // two compounds collapse into one.
    assert_eq!(unified, vec![".b ~ .a + .x", ".b.a + .x"]);
}

#[test]
fn selector_list_set_semantics() {
    let wide = list(".a, .b, .c");
    let narrow = list(".b");
    assert!(wide.is_superselector(&narrow));
    assert!(!narrow.is_superselector(&wide));
}

#[test]
fn invisible_only_with_placeholders_everywhere() {
    assert!(list("%a").is_invisible());
    assert!(list("%a .b, .c %d").is_invisible());
    assert!(!list("%a, .b").is_invisible());
    assert!(!list(".a").is_invisible());
}
