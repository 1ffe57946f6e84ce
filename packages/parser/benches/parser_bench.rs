use cascade_parser::{parse, tokenize};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn parse_simple_rule(c: &mut Criterion) {
    let source = r#"
        .button {
            padding: 8px 16px;
            background: #36f;
            &:hover {
                background: #47a;
            }
        }
    "#;

    c.bench_function("parse_simple_rule", |b| b.iter(|| parse(black_box(source))));
}

fn parse_medium_sheet(c: &mut Criterion) {
    let source = r#"
        $primary: #36f;
        $spacing: 16px;

        %button-base {
            padding: $spacing / 2 $spacing;
            border: none;
            border-radius: 4px;
        }

        .card {
            padding: $spacing;
            background: white;
            box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);

            .title {
                font-size: 24px;
                font-weight: bold;
            }

            .body {
                color: #666;
                line-height: 1.5;
            }

            button {
                @extend %button-base;
                background: $primary;
                color: white;
            }
        }

        @media screen and (min-width: 720px) {
            .card { padding: $spacing * 2; }
        }
    "#;

    c.bench_function("parse_medium_sheet", |b| b.iter(|| parse(black_box(source))));
}

fn parse_large_sheet(c: &mut Criterion) {
    let mut source = String::new();
    for i in 0..10 {
        source.push_str(&format!("$color{}: #ff{:04x};\n", i, i * 1000));
    }
    for i in 0..50 {
        source.push_str(&format!(
            r#"
            .component-{} {{
                padding: 16px;
                background: #f0f0f0;
                .label {{ color: $color{}; }}
                button {{ padding: 8px; }}
            }}
            "#,
            i,
            i % 10
        ));
    }

    c.bench_function("parse_large_sheet", |b| b.iter(|| parse(black_box(&source))));
}

fn tokenize_only(c: &mut Criterion) {
    let source = r#"
        .button {
            padding: 8px 16px;
            background: #36f;
        }
    "#;

    c.bench_function("tokenize_only", |b| b.iter(|| tokenize(black_box(source))));
}

criterion_group!(
    benches,
    parse_simple_rule,
    parse_medium_sheet,
    parse_large_sheet,
    tokenize_only
);
criterion_main!(benches);
