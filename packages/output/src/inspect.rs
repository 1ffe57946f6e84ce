//! Style-aware serialization of values. The canonical forms live on the
//! value types; this module layers the output-style rules on top: short hex
//! colors outside NESTED, dropped leading zeros and tight separators when
//! COMPRESSED, hex escapes for unprintable string content.

use crate::emitter::OutputStyle;
use cascade_evaluator::{format_double, Color, Number, Value};
use cascade_parser::ListSeparator;
use std::fmt::Write;

/// Writes `value` in the given style. Values were validated during
/// evaluation, so this cannot fail; anything unexpected falls back to the
/// inspection form.
pub fn write_value(out: &mut String, value: &Value, precision: usize, style: OutputStyle) {
    let compressed = style == OutputStyle::Compressed;
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => write_number(out, number, precision, compressed),
        Value::Color(color) => out.push_str(&format_color(color, style)),
        Value::Str(string) => {
            if string.quoted {
                write_quoted(out, &string.text);
            } else {
                out.push_str(&string.text);
            }
        }
        Value::List { items, separator } => {
            let mut wrote_any = false;
            for item in items {
                if item.is_null() {
                    continue;
                }
                if let Value::List { items: inner, .. } = item {
                    if inner.is_empty() {
                        continue;
                    }
                }
                if wrote_any {
                    match separator {
                        ListSeparator::Space => out.push(' '),
                        ListSeparator::Comma => {
                            out.push(',');
                            if !compressed {
                                out.push(' ');
                            }
                        }
                    }
                }
                write_value(out, item, precision, style);
                wrote_any = true;
            }
        }
        Value::Map(_) => out.push_str(&value.inspect(precision)),
    }
}

fn write_number(out: &mut String, number: &Number, precision: usize, compressed: bool) {
    let text = match number.to_css_string(precision) {
        Ok(text) => text,
        Err(_) => format!(
            "{}{}",
            format_double(number.value, precision),
            number.unit_string()
        ),
    };
    if compressed {
        // `0.5` loses its leading zero.
        if let Some(stripped) = text.strip_prefix("0.") {
            out.push('.');
            out.push_str(stripped);
            return;
        }
        if let Some(stripped) = text.strip_prefix("-0.") {
            out.push_str("-.");
            out.push_str(stripped);
            return;
        }
    }
    out.push_str(&text);
}

/// Quoted output with `\xx ` hex escapes for characters CSS cannot carry
/// verbatim.
fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn is_doublet(channel: u8) -> bool {
    channel >> 4 == channel & 0x0f
}

/// Reverse name lookup for the handful of names shorter than their hex.
fn color_to_name(r: u8, g: u8, b: u8) -> Option<&'static str> {
    Some(match (r, g, b) {
        (255, 0, 0) => "red",
        (0, 128, 0) => "green",
        (0, 0, 255) => "blue",
        (0, 0, 128) => "navy",
        (128, 128, 128) => "gray",
        (0, 128, 128) => "teal",
        (128, 0, 0) => "maroon",
        (128, 0, 128) => "purple",
        (128, 128, 0) => "olive",
        (255, 255, 0) => "yellow",
        (192, 192, 192) => "silver",
        (245, 245, 220) => "beige",
        (255, 255, 240) => "ivory",
        (255, 165, 0) => "orange",
        _ => return None,
    })
}

/// Color serialization per style: NESTED keeps the author's spelling; the
/// other styles pick the shortest equivalent representation.
pub fn format_color(color: &Color, style: OutputStyle) -> String {
    let (r, g, b) = color.channels();
    let compressed = style == OutputStyle::Compressed;

    if color.a == 0.0 && r == 0 && g == 0 && b == 0 {
        return "transparent".to_string();
    }

    if color.a < 1.0 {
        let alpha = format_double(color.a, 5);
        let alpha = if compressed {
            alpha.strip_prefix("0.").map(|s| format!(".{}", s)).unwrap_or(alpha)
        } else {
            alpha
        };
        return if compressed {
            format!("rgba({},{},{},{})", r, g, b, alpha)
        } else {
            format!("rgba({}, {}, {}, {})", r, g, b, alpha)
        };
    }

    if style == OutputStyle::Nested {
        if let Some(name) = &color.name {
            return name.clone();
        }
        return format!("#{:02x}{:02x}{:02x}", r, g, b);
    }

    // Shortest form: 3-digit hex when each channel is a doublet, otherwise
    // 6-digit hex, or an equivalent shorter color name.
    let hex = if is_doublet(r) && is_doublet(g) && is_doublet(b) {
        format!("#{:x}{:x}{:x}", r >> 4, g >> 4, b >> 4)
    } else {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    };
    if let Some(name) = color_to_name(r, g, b) {
        if name.len() < hex.len() {
            return name.to_string();
        }
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_evaluator::Value;

    fn render(value: &Value, style: OutputStyle) -> String {
        let mut out = String::new();
        write_value(&mut out, value, 5, style);
        out
    }

    #[test]
    fn compressed_drops_leading_zero() {
        let half = Value::number(0.5, Some("em"));
        assert_eq!(render(&half, OutputStyle::Nested), "0.5em");
        assert_eq!(render(&half, OutputStyle::Compressed), ".5em");
    }

    #[test]
    fn compressed_shortens_colors() {
        let color = Value::Color(Color {
            r: 255.0,
            g: 255.0,
            b: 255.0,
            a: 1.0,
            name: Some("#ffffff".to_string()),
        });
        assert_eq!(render(&color, OutputStyle::Nested), "#ffffff");
        assert_eq!(render(&color, OutputStyle::Compressed), "#fff");
    }

    #[test]
    fn shorter_names_win_outside_nested() {
        let red = cascade_evaluator::named_color("red").unwrap();
        assert_eq!(format_color(&red, OutputStyle::Compressed), "red");
        // "beige" (5 chars) beats #f5f5dc (7 chars).
        let beige = cascade_evaluator::named_color("beige").unwrap();
        assert_eq!(format_color(&beige, OutputStyle::Compressed), "beige");
    }

    #[test]
    fn zero_alpha_black_is_transparent() {
        let transparent = Color::rgba(0.0, 0.0, 0.0, 0.0);
        assert_eq!(format_color(&transparent, OutputStyle::Compressed), "transparent");
    }

    #[test]
    fn comma_lists_tighten_when_compressed() {
        let list = Value::List {
            items: vec![Value::number(1.0, Some("px")), Value::number(2.0, Some("px"))],
            separator: ListSeparator::Comma,
        };
        assert_eq!(render(&list, OutputStyle::Expanded), "1px, 2px");
        assert_eq!(render(&list, OutputStyle::Compressed), "1px,2px");
    }

    #[test]
    fn control_characters_escape_to_hex() {
        let value = Value::string("a\u{1}b", true);
        assert_eq!(render(&value, OutputStyle::Nested), "\"a\\1 b\"");
    }
}
