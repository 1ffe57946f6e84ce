//! CSS output for the Cascade compiler: serializes the evaluated CSS tree
//! in the four output styles, skipping invisible rules and recording source
//! map positions along the way.

pub mod emitter;
pub mod inspect;

pub use emitter::{emit, InspectOptions, OutputStyle};
pub use inspect::{format_color, write_value};

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_evaluator::Evaluator;
    use cascade_parser::parse;

    fn compile(source: &str, style: OutputStyle) -> String {
        let sheet = parse(source).expect("should parse");
        let mut evaluator = Evaluator::new();
        let root = evaluator.evaluate(&sheet).expect("should evaluate");
        let options = InspectOptions {
            style,
            ..InspectOptions::default()
        };
        emit(&root, &evaluator.store(), &options, Some(source), None, None)
    }

    #[test]
    fn nested_style() {
        let css = compile(".a { x: 1; y: 2; }", OutputStyle::Nested);
        assert_eq!(css, ".a {\n  x: 1;\n  y: 2; }\n");
    }

    #[test]
    fn expanded_style() {
        let css = compile(".a { x: 1; }", OutputStyle::Expanded);
        assert_eq!(css, ".a {\n  x: 1;\n}\n");
    }

    #[test]
    fn compact_style() {
        let css = compile(".a { x: 1; y: 2; }", OutputStyle::Compact);
        assert_eq!(css, ".a { x: 1; y: 2; }\n");
    }

    #[test]
    fn compressed_style() {
        let css = compile(".a { x: 1; y: 2; } .b { z: 0.5; }", OutputStyle::Compressed);
        assert_eq!(css, ".a{x:1;y:2}.b{z:.5}\n");
    }

    #[test]
    fn invisible_rules_are_skipped() {
        let css = compile("%base { x: 1; } .a { y: 2; }", OutputStyle::Expanded);
        assert!(!css.contains('%'));
        assert!(css.contains(".a"));
    }

    #[test]
    fn placeholder_extension_becomes_visible() {
        let css = compile("%base { x: 1; } .a { @extend %base; }", OutputStyle::Compact);
        assert_eq!(css, ".a { x: 1; }\n");
    }

    #[test]
    fn empty_rules_emit_nothing() {
        let css = compile(".a { .b { x: 1; } }", OutputStyle::Compact);
        assert_eq!(css, ".a .b { x: 1; }\n");
    }

    #[test]
    fn media_blocks_nest_their_rules() {
        let css = compile(
            "@media screen { .a { x: 1; } }",
            OutputStyle::Expanded,
        );
        assert_eq!(css, "@media screen {\n  .a {\n    x: 1;\n  }\n}\n");
    }

    #[test]
    fn charset_is_prepended_for_non_ascii() {
        let css = compile(".a { content: \"é\"; }", OutputStyle::Expanded);
        assert!(css.starts_with("@charset \"UTF-8\";\n"));
        let css = compile(".a { content: \"é\"; }", OutputStyle::Compressed);
        assert!(css.starts_with('\u{feff}'));
    }

    #[test]
    fn important_flag_is_kept() {
        let css = compile(".a { x: 1 !important; }", OutputStyle::Compact);
        assert_eq!(css, ".a { x: 1 !important; }\n");
        let css = compile(".a { x: 1 !important; }", OutputStyle::Compressed);
        assert_eq!(css, ".a{x:1!important}\n");
    }

    #[test]
    fn comments_survive_except_compressed() {
        let css = compile("/* note */ .a { x: 1; }", OutputStyle::Expanded);
        assert!(css.contains("/* note */"));
        let css = compile("/* note */ .a { x: 1; }", OutputStyle::Compressed);
        assert!(!css.contains("note"));
        let css = compile("/*! keep */ .a { x: 1; }", OutputStyle::Compressed);
        assert!(css.contains("/*! keep */"));
    }

    #[test]
    fn extend_scenarios_render() {
        // Basic extend all the way to CSS.
        let css = compile(".a { x: 1; } .b { @extend .a; }", OutputStyle::Compact);
        assert_eq!(css, ".a, .b { x: 1; }\n");

        let css = compile(
            ".x .y { x: 1; } .a .b { @extend .y; }",
            OutputStyle::Compact,
        );
        assert_eq!(css, ".x .y, .x .a .b, .a .x .b { x: 1; }\n");
    }

    #[test]
    fn source_comments_annotate_rules() {
        let sheet = parse(".a { x: 1; }").unwrap();
        let mut evaluator = Evaluator::new();
        let root = evaluator.evaluate(&sheet).unwrap();
        let options = InspectOptions {
            source_comments: true,
            style: OutputStyle::Expanded,
            ..InspectOptions::default()
        };
        let css = emit(
            &root,
            &evaluator.store(),
            &options,
            Some(".a { x: 1; }"),
            Some("input.scss"),
            None,
        );
        assert!(css.starts_with("/* line 1, input.scss */\n"));
    }

    #[test]
    fn source_map_positions_advance() {
        let source = ".a {\n  x: 1;\n}\n";
        let sheet = parse(source).unwrap();
        let mut evaluator = Evaluator::new();
        let root = evaluator.evaluate(&sheet).unwrap();
        let mut map = cascade_sourcemap::SourceMapBuilder::new(
            Some("out.css"),
            "in.scss",
            source,
            true,
        );
        let options = InspectOptions::default();
        let css = emit(
            &root,
            &evaluator.store(),
            &options,
            Some(source),
            Some("in.scss"),
            Some(&mut map),
        );
        assert!(css.contains(".a"));
        let json = map.into_json();
        assert!(json.contains("\"version\":3"));
        assert!(json.contains("in.scss"));
        assert!(json.contains("\"mappings\""));
    }
}
