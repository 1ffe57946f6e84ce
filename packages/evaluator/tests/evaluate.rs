use cascade_evaluator::{CssSelector, CssStmt, Evaluator, Value};
use cascade_parser::parse;

fn evaluate(source: &str) -> (cascade_evaluator::CssRoot, Evaluator) {
    let sheet = parse(source).expect("should parse");
    let mut evaluator = Evaluator::new();
    let root = evaluator.evaluate(&sheet).expect("should evaluate");
    (root, evaluator)
}

fn rule_selector(evaluator: &Evaluator, stmt: &CssStmt) -> String {
    match stmt {
        CssStmt::Rule(rule) => match &rule.selector {
            CssSelector::Handle(id) => evaluator.store().get(*id).to_string(),
            CssSelector::Raw(text) => text.clone(),
        },
        other => panic!("expected rule, got {:?}", other),
    }
}

#[test]
fn nested_rules_flatten_with_parent_selectors() {
    let (root, evaluator) = evaluate(".a { x: 1; .b { y: 2; } &:hover { z: 3; } }");
    assert_eq!(root.statements.len(), 3);
    assert_eq!(rule_selector(&evaluator, &root.statements[0]), ".a");
    assert_eq!(rule_selector(&evaluator, &root.statements[1]), ".a .b");
    assert_eq!(rule_selector(&evaluator, &root.statements[2]), ".a:hover");
}

#[test]
fn variables_resolve_lexically() {
    let (root, _) = evaluate("$c: red; .a { $c: blue; color: $c; } .b { color: $c; }");
    match (&root.statements[0], &root.statements[1]) {
        (CssStmt::Rule(a), CssStmt::Rule(b)) => {
            assert_eq!(a.declarations[0].value.inspect(5), "blue");
            // The inner assignment updated the outer variable.
            assert_eq!(b.declarations[0].value.inspect(5), "blue");
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn extend_mutates_registered_rules() {
    let (root, evaluator) = evaluate(".a { x: 1; } .b { @extend .a; }");
    assert_eq!(rule_selector(&evaluator, &root.statements[0]), ".a, .b");
}

#[test]
fn unsatisfied_extend_fails_at_finalize() {
    let sheet = parse(".b { @extend .missing; }").unwrap();
    let mut evaluator = Evaluator::new();
    assert!(evaluator.evaluate(&sheet).is_err());
}

#[test]
fn optional_extend_is_silent() {
    let sheet = parse(".b { @extend .missing !optional; }").unwrap();
    let mut evaluator = Evaluator::new();
    assert!(evaluator.evaluate(&sheet).is_ok());
}

#[test]
fn media_bubbles_out_of_rules() {
    let (root, evaluator) = evaluate(".a { x: 1; @media screen { y: 2; } }");
    assert_eq!(root.statements.len(), 2);
    match &root.statements[1] {
        CssStmt::Media(media) => {
            assert_eq!(media.query, "screen");
            assert_eq!(rule_selector(&evaluator, &media.body[0]), ".a");
        }
        other => panic!("expected media, got {:?}", other),
    }
}

#[test]
fn nested_media_queries_merge() {
    let (root, _) = evaluate("@media screen { @media (min-width: 100px) { .a { x: 1; } } }");
    let queries: Vec<String> = root
        .statements
        .iter()
        .filter_map(|stmt| match stmt {
            CssStmt::Media(media) => Some(media.query.clone()),
            _ => None,
        })
        .collect();
    assert!(queries.contains(&"screen and (min-width: 100px)".to_string()));
}

#[test]
fn extend_across_media_is_fatal() {
    let sheet = parse(".a { x: 1; } @media print { .b { @extend .a; } }").unwrap();
    let mut evaluator = Evaluator::new();
    assert!(evaluator.evaluate(&sheet).is_err());
}

#[test]
fn mixins_expand_with_arguments_and_content() {
    let (root, _) = evaluate(
        "@mixin pad($x: 4px) { padding: $x; }\n\
         @mixin frame { .frame { @content; } }\n\
         .a { @include pad(8px); }\n\
         @include frame { color: red; }",
    );
    match &root.statements[0] {
        CssStmt::Rule(rule) => {
            assert_eq!(rule.declarations[0].name, "padding");
            assert_eq!(rule.declarations[0].value.inspect(5), "8px");
        }
        other => panic!("{:?}", other),
    }
    match &root.statements[1] {
        CssStmt::Rule(rule) => assert_eq!(rule.declarations[0].name, "color"),
        other => panic!("{:?}", other),
    }
}

#[test]
fn functions_return_values() {
    let (root, _) = evaluate(
        "@function double($x) { @return $x * 2; }\n.a { width: double(4px); }",
    );
    match &root.statements[0] {
        CssStmt::Rule(rule) => assert_eq!(rule.declarations[0].value.inspect(5), "8px"),
        other => panic!("{:?}", other),
    }
}

#[test]
fn control_flow_loops() {
    let (root, evaluator) = evaluate("@for $i from 1 through 3 { .item-#{$i} { w: $i; } }");
    assert_eq!(root.statements.len(), 3);
    assert_eq!(rule_selector(&evaluator, &root.statements[2]), ".item-3");
}

#[test]
fn each_destructures() {
    let (root, _) = evaluate(
        "@each $name, $size in (small 1px, large 2px) { .#{$name} { width: $size; } }",
    );
    assert_eq!(root.statements.len(), 2);
}

#[test]
fn null_declarations_are_dropped() {
    let (root, _) = evaluate(".a { x: null; y: 1; }");
    match &root.statements[0] {
        CssStmt::Rule(rule) => {
            assert_eq!(rule.declarations.len(), 1);
            assert_eq!(rule.declarations[0].name, "y");
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn unknown_functions_pass_through() {
    let (root, _) = evaluate(".a { width: var(--x); transform: translate(1px, 2px); }");
    match &root.statements[0] {
        CssStmt::Rule(rule) => {
            assert_eq!(rule.declarations[0].value.inspect(5), "var(--x)");
            assert_eq!(
                rule.declarations[1].value.inspect(5),
                "translate(1px, 2px)"
            );
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn selector_builtins_run_the_engine() {
    let (root, _) = evaluate(
        ".a { x: selector-extend(\".a.b\", \".a\", \".c\"); y: is-superselector(\".a\", \".a.b\"); }",
    );
    match &root.statements[0] {
        CssStmt::Rule(rule) => {
            assert_eq!(rule.declarations[0].value.inspect(5), ".a.b, .b.c");
            assert_eq!(rule.declarations[1].value, Value::Bool(true));
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn keyframes_selectors_stay_raw() {
    let (root, evaluator) = evaluate("@keyframes spin { 0% { opacity: 0; } 100% { opacity: 1; } }");
    match &root.statements[0] {
        CssStmt::AtRule(at_rule) => {
            assert_eq!(at_rule.name, "keyframes");
            assert_eq!(at_rule.prelude, "spin");
            let body = at_rule.body.as_ref().unwrap();
            assert_eq!(rule_selector(&evaluator, &body[0]), "0%");
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn host_functions_are_callable() {
    let sheet = parse(".a { x: triple(2px); }").unwrap();
    let mut evaluator = Evaluator::new();
    evaluator.register_function(
        "triple",
        std::rc::Rc::new(|args: &[Value]| match args.first() {
            Some(Value::Number(number)) => {
                let mut tripled = number.clone();
                tripled.value *= 3.0;
                Ok(Value::Number(tripled))
            }
            _ => Err("expected a number".to_string()),
        }),
    );
    let root = evaluator.evaluate(&sheet).unwrap();
    match &root.statements[0] {
        CssStmt::Rule(rule) => assert_eq!(rule.declarations[0].value.inspect(5), "6px"),
        other => panic!("{:?}", other),
    }
}

#[test]
fn importer_callbacks_inline_sass() {
    let sheet = parse("@import \"shared\"; .b { color: $shared-color; }").unwrap();
    let mut evaluator = Evaluator::new();
    evaluator.register_importer(std::rc::Rc::new(|url: &str| {
        if url == "shared" {
            Some(cascade_evaluator::ResolvedImport {
                path: "shared.scss".to_string(),
                source: "$shared-color: teal;".to_string(),
            })
        } else {
            None
        }
    }));
    let root = evaluator.evaluate(&sheet).unwrap();
    match &root.statements[0] {
        CssStmt::Rule(rule) => assert_eq!(rule.declarations[0].value.inspect(5), "teal"),
        other => panic!("{:?}", other),
    }
}
