use cascade_compiler::{compile_string, CompileError, Compiler, Options, OutputStyle};
use cascade_evaluator::Value;
use std::rc::Rc;

fn compact(source: &str) -> String {
    let options = Options {
        output_style: OutputStyle::Compact,
        ..Options::default()
    };
    compile_string(source, &options).expect("should compile").css
}

// The concrete end-to-end scenarios from the engine's contract, rendered
// compact so whitespace stays out of the way.

#[test]
fn scenario_basic_extend() {
    assert_eq!(
        compact(".a { x: 1; } .b { @extend .a; }"),
        ".a, .b { x: 1; }\n"
    );
}

#[test]
fn scenario_transitive_extend() {
    assert_eq!(
        compact(".a { x: 1; } .b { @extend .a; } .c { @extend .b; }"),
        ".a, .b, .c { x: 1; }\n"
    );
}

#[test]
fn scenario_compound_target() {
    assert_eq!(
        compact(".a.b { x: 1; } .c { @extend .a; }"),
        ".a.b, .b.c { x: 1; }\n"
    );
}

#[test]
fn scenario_selector_weaving() {
    assert_eq!(
        compact(".x .y { x: 1; } .a .b { @extend .y; }"),
        ".x .y, .x .a .b, .a .x .b { x: 1; }\n"
    );
}

#[test]
fn scenario_optional_unmatched() {
    assert_eq!(compact(".a { @extend .b !optional; }"), "");
}

#[test]
fn scenario_extend_across_media_fails() {
    let result = compile_string(
        ".a { x: 1; } @media print { .b { @extend .a; } }",
        &Options::default(),
    );
    match result {
        Err(CompileError::Eval(error)) => {
            assert!(error.to_string().contains("media"), "{}", error);
        }
        other => panic!("expected an extend-across-media failure, got {:?}", other.map(|r| r.css)),
    }
}

#[test]
fn mandatory_unmatched_extend_fails() {
    let result = compile_string(".a { @extend .missing; }", &Options::default());
    match result {
        Err(CompileError::Eval(error)) => {
            assert!(error.to_string().contains("not found"), "{}", error);
        }
        other => panic!("expected unsatisfied extend, got {:?}", other.map(|r| r.css)),
    }
}

#[test]
fn placeholders_extend_but_never_emit() {
    assert_eq!(
        compact("%btn { pad: 1px; } .a { @extend %btn; }"),
        ".a { pad: 1px; }\n"
    );
}

#[test]
fn nesting_variables_and_arithmetic() {
    assert_eq!(
        compact("$w: 10px; .a { width: $w * 2; .b { width: $w / 2; } }"),
        ".a { width: 20px; }\n.a .b { width: 5px; }\n"
    );
}

#[test]
fn literal_slash_survives_fonts() {
    assert_eq!(
        compact(".a { font: 12px/30px serif; }"),
        ".a { font: 12px/30px serif; }\n"
    );
}

#[test]
fn incompatible_units_fail() {
    let result = compile_string(".a { x: 1px + 1s; }", &Options::default());
    assert!(matches!(
        result,
        Err(CompileError::Eval(cascade_evaluator::EvalError::IncompatibleUnits { .. }))
    ));
}

#[test]
fn zero_division_fails() {
    let result = compile_string(".a { x: (1 / 0); }", &Options::default());
    assert!(matches!(
        result,
        Err(CompileError::Eval(cascade_evaluator::EvalError::ZeroDivision { .. }))
    ));
}

#[test]
fn unit_products_are_rejected_at_evaluation() {
    let result = compile_string(".a { x: 2px * 3em; }", &Options::default());
    assert!(matches!(
        result,
        Err(CompileError::Eval(cascade_evaluator::EvalError::InvalidValue { .. }))
    ));
}

#[test]
fn mixins_functions_and_control_flow() {
    let css = compact(
        "@mixin cols($n) { @for $i from 1 through $n { .col-#{$i} { width: $i * 10px; } } }\n\
         @include cols(2);",
    );
    assert_eq!(css, ".col-1 { width: 10px; }\n.col-2 { width: 20px; }\n");
}

#[test]
fn warns_are_diagnostics_not_errors() {
    let result = compile_string("@warn \"careful\"; .a { x: 1; }", &Options::default()).unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].message.contains("careful"));
    assert!(result.css.contains(".a"));
}

#[test]
fn user_error_is_fatal() {
    let result = compile_string("@error \"boom\";", &Options::default());
    match result {
        Err(CompileError::Eval(error)) => assert!(error.to_string().contains("boom")),
        other => panic!("expected @error failure, got {:?}", other.map(|r| r.css)),
    }
}

#[test]
fn output_styles_differ() {
    let source = ".a { x: 0.5px; }";
    let nested = compile_string(source, &Options::default()).unwrap().css;
    assert_eq!(nested, ".a {\n  x: 0.5px; }\n");

    let compressed = compile_string(
        source,
        &Options {
            output_style: OutputStyle::Compressed,
            ..Options::default()
        },
    )
    .unwrap()
    .css;
    assert_eq!(compressed, ".a{x:.5px}\n");
}

#[test]
fn precision_is_configurable() {
    let options = Options {
        precision: 2,
        output_style: OutputStyle::Compact,
        ..Options::default()
    };
    let css = compile_string(".a { x: (1 / 3) * 1px; }", &options).unwrap().css;
    assert_eq!(css, ".a { x: 0.33px; }\n");
}

#[test]
fn crlf_linefeed_option() {
    let options = Options {
        linefeed: cascade_compiler::Linefeed::CrLf,
        output_style: OutputStyle::Compact,
        ..Options::default()
    };
    let css = compile_string(".a { x: 1; }", &options).unwrap().css;
    assert_eq!(css, ".a { x: 1; }\r\n");
}

#[test]
fn source_map_is_produced() {
    let options = Options {
        source_map: true,
        source_map_contents: true,
        source_map_file: Some("out.css.map".into()),
        ..Options::default()
    };
    let result = compile_string(".a {\n  x: 1;\n}\n", &options).unwrap();
    let map = result.source_map.expect("map requested");
    assert!(map.contains("\"version\":3"));
    assert!(map.contains("\"mappings\""));
    assert!(result.css.contains("sourceMappingURL=out.css.map"));
}

#[test]
fn source_map_embed_inlines_data_uri() {
    let options = Options {
        source_map: true,
        source_map_embed: true,
        ..Options::default()
    };
    let result = compile_string(".a { x: 1; }", &options).unwrap();
    assert!(result.css.contains("sourceMappingURL=data:application/json;base64,"));
    assert!(result.source_map.is_none());
}

#[test]
fn registered_importers_take_precedence() {
    let mut compiler = Compiler::new();
    compiler.register_importer(Rc::new(|url: &str| {
        (url == "theme").then(|| cascade_compiler::ResolvedImport {
            path: "theme.scss".to_string(),
            source: "$accent: #abc;".to_string(),
        })
    }));
    let options = Options {
        output_style: OutputStyle::Compact,
        ..Options::default()
    };
    let result = compiler
        .compile_string("@import \"theme\"; .a { color: $accent; }", &options)
        .unwrap();
    assert_eq!(result.css, ".a { color: #abc; }\n");
}

#[test]
fn registered_functions_are_visible() {
    let mut compiler = Compiler::new();
    compiler.register_function(
        "halve",
        Rc::new(|args: &[Value]| match args.first() {
            Some(Value::Number(number)) => {
                let mut halved = number.clone();
                halved.value /= 2.0;
                Ok(Value::Number(halved))
            }
            _ => Err("halve() expects a number".to_string()),
        }),
    );
    let options = Options {
        output_style: OutputStyle::Compact,
        ..Options::default()
    };
    let result = compiler
        .compile_string(".a { width: halve(10px); }", &options)
        .unwrap();
    assert_eq!(result.css, ".a { width: 5px; }\n");
}

#[test]
fn css_imports_are_hoisted() {
    let css = compact(".a { x: 1; } @import \"print.css\";");
    assert!(css.starts_with("@import \"print.css\";"), "{}", css);
}

#[test]
fn selector_functions_round_trip() {
    let css = compact(
        ".a { content: quote(selector-replace(\".c .d\", \".d\", \".e\")); }",
    );
    assert_eq!(css, ".a { content: \".c .e\"; }\n");
}

#[test]
fn media_extension_in_same_context_works() {
    let css = compact("@media print { .a { x: 1; } .b { @extend .a; } }");
    assert_eq!(css, "@media print {\n  .a, .b { x: 1; }\n}\n");
}
