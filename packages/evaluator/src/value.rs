use crate::error::{EvalError, EvalResult};
use cascade_parser::ListSeparator;
use cascade_selectors::Span;
use std::fmt::Write;

/// A SassScript value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Color(Color),
    Str(SassStr),
    List {
        items: Vec<Value>,
        separator: ListSeparator,
    },
    /// Order-preserving key/value pairs.
    Map(Vec<(Value, Value)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SassStr {
    pub text: String,
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    pub value: f64,
    pub numerator_units: Vec<String>,
    pub denominator_units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
    /// The name or hex token as written, kept for output when unchanged.
    pub name: Option<String>,
}

impl Value {
    pub fn string(text: impl Into<String>, quoted: bool) -> Self {
        Value::Str(SassStr {
            text: text.into(),
            quoted,
        })
    }

    pub fn number(value: f64, unit: Option<&str>) -> Self {
        Value::Number(Number {
            value,
            numerator_units: unit.map(|u| vec![u.to_string()]).unwrap_or_default(),
            denominator_units: Vec::new(),
        })
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Color(_) => "color",
            Value::Str(_) => "string",
            Value::List { .. } => "list",
            Value::Map(_) => "map",
        }
    }

    /// Items of a value treated as a list, the way `@each` and the list
    /// built-ins see it: maps iterate as key/value pairs, everything else is
    /// a one-element list.
    pub fn as_items(&self) -> Vec<Value> {
        match self {
            Value::List { items, .. } => items.clone(),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, value)| Value::List {
                    items: vec![key.clone(), value.clone()],
                    separator: ListSeparator::Space,
                })
                .collect(),
            other => vec![other.clone()],
        }
    }

    /// Serializes for CSS output in the canonical (uncompressed) form.
    /// Interpolation and string concatenation unquote via `quotes = false`.
    pub fn to_css_string(&self, precision: usize, quotes: bool) -> EvalResult<String> {
        let mut out = String::new();
        self.write_css(&mut out, precision, quotes)?;
        Ok(out)
    }

    fn write_css(&self, out: &mut String, precision: usize, quotes: bool) -> EvalResult<()> {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => {
                out.push_str(if *value { "true" } else { "false" });
                Ok(())
            }
            Value::Number(number) => {
                out.push_str(&number.to_css_string(precision)?);
                Ok(())
            }
            Value::Color(color) => {
                out.push_str(&color.to_css_string());
                Ok(())
            }
            Value::Str(string) => {
                if string.quoted && quotes {
                    out.push('"');
                    for c in string.text.chars() {
                        if c == '"' || c == '\\' {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push('"');
                } else {
                    out.push_str(&string.text);
                }
                Ok(())
            }
            Value::List { items, separator } => {
                let mut wrote_any = false;
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    if let Value::List {
                        items: inner_items, ..
                    } = item
                    {
                        if inner_items.is_empty() {
                            continue;
                        }
                    }
                    if wrote_any {
                        match separator {
                            ListSeparator::Space => out.push(' '),
                            ListSeparator::Comma => out.push_str(", "),
                        }
                    }
                    item.write_css(out, precision, quotes)?;
                    wrote_any = true;
                }
                Ok(())
            }
            Value::Map(_) => Err(EvalError::InvalidValue {
                value: self.inspect(precision),
                span: Span::phony(),
            }),
        }
    }

    /// Debug-ish rendering used by `inspect()`, `@debug`, and errors; unlike
    /// CSS output it shows nulls, quotes, and map literals.
    pub fn inspect(&self, precision: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Number(number) => number
                .to_css_string(precision)
                .unwrap_or_else(|_| format!("{}{}", number.value, number.unit_string())),
            Value::Color(color) => color.to_css_string(),
            Value::Str(string) => {
                if string.quoted {
                    format!("\"{}\"", string.text)
                } else {
                    string.text.clone()
                }
            }
            Value::List { items, separator } => {
                let sep = match separator {
                    ListSeparator::Space => " ",
                    ListSeparator::Comma => ", ",
                };
                items
                    .iter()
                    .map(|item| item.inspect(precision))
                    .collect::<Vec<_>>()
                    .join(sep)
            }
            Value::Map(entries) => {
                let body = entries
                    .iter()
                    .map(|(key, value)| {
                        format!("{}: {}", key.inspect(precision), value.inspect(precision))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", body)
            }
        }
    }
}

impl Number {
    pub fn unitless(value: f64) -> Self {
        Self {
            value,
            numerator_units: Vec::new(),
            denominator_units: Vec::new(),
        }
    }

    pub fn is_unitless(&self) -> bool {
        self.numerator_units.is_empty() && self.denominator_units.is_empty()
    }

    pub fn unit_string(&self) -> String {
        let mut unit = self.numerator_units.join("*");
        if !self.denominator_units.is_empty() {
            unit.push('/');
            unit.push_str(&self.denominator_units.join("*"));
        }
        unit
    }

    /// A number is only a valid CSS value with at most one numerator unit
    /// and none below the line.
    pub fn to_css_string(&self, precision: usize) -> EvalResult<String> {
        if self.numerator_units.len() > 1
            || !self.denominator_units.is_empty()
            || self
                .numerator_units
                .first()
                .map_or(false, |unit| unit.contains('/') || unit.contains('*'))
        {
            return Err(EvalError::InvalidValue {
                value: format!("{}{}", format_double(self.value, precision), self.unit_string()),
                span: Span::phony(),
            });
        }
        let mut out = format_double(self.value, precision);
        if let Some(unit) = self.numerator_units.first() {
            out.push_str(unit);
        }
        Ok(out)
    }

    /// Converts to the units of `other`, or reports the incompatibility.
    pub fn coerce_to(&self, other: &Number, span: Span) -> EvalResult<Number> {
        if self.is_unitless() || other.is_unitless() || self.unit_string() == other.unit_string() {
            return Ok(Number {
                value: self.value,
                numerator_units: other.numerator_units.clone(),
                denominator_units: other.denominator_units.clone(),
            });
        }
        if let (1, 0, 1, 0) = (
            self.numerator_units.len(),
            self.denominator_units.len(),
            other.numerator_units.len(),
            other.denominator_units.len(),
        ) {
            if let Some(factor) =
                conversion_factor(&self.numerator_units[0], &other.numerator_units[0])
            {
                return Ok(Number {
                    value: self.value * factor,
                    numerator_units: other.numerator_units.clone(),
                    denominator_units: Vec::new(),
                });
            }
        }
        Err(EvalError::IncompatibleUnits {
            lhs: other.unit_string(),
            rhs: self.unit_string(),
            span,
        })
    }
}

/// Multiplier turning one `from` into `to`, when both sit in the same
/// dimension group.
fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    const GROUPS: &[&[(&str, f64)]] = &[
        // Absolute lengths, relative to 1px.
        &[
            ("px", 1.0),
            ("pt", 96.0 / 72.0),
            ("pc", 16.0),
            ("in", 96.0),
            ("cm", 96.0 / 2.54),
            ("mm", 96.0 / 25.4),
            ("q", 96.0 / 101.6),
        ],
        // Angles, relative to 1deg.
        &[
            ("deg", 1.0),
            ("grad", 0.9),
            ("rad", 180.0 / std::f64::consts::PI),
            ("turn", 360.0),
        ],
        // Time, relative to 1s.
        &[("s", 1.0), ("ms", 0.001)],
        // Frequency, relative to 1Hz.
        &[("hz", 1.0), ("khz", 1000.0)],
        // Resolution, relative to 1dpi.
        &[("dpi", 1.0), ("dpcm", 2.54), ("dppx", 96.0)],
    ];
    let from = from.to_ascii_lowercase();
    let to = to.to_ascii_lowercase();
    for group in GROUPS {
        let from_factor = group.iter().find(|(unit, _)| *unit == from);
        let to_factor = group.iter().find(|(unit, _)| *unit == to);
        if let (Some((_, from_factor)), Some((_, to_factor))) = (from_factor, to_factor) {
            return Some(from_factor / to_factor);
        }
    }
    None
}

/// Formats a double at the configured precision: trailing fractional zeros
/// are stripped, and a nonzero value that rounds to zero becomes `0.0`.
pub fn format_double(value: f64, precision: usize) -> String {
    let mut out = format!("{:.*}", precision, value);
    if out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if out == "-0" {
        out = "0".to_string();
    }
    if out == "0" && value != 0.0 {
        out = "0.0".to_string();
    }
    out
}

impl Color {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a,
            name: None,
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let channels: Vec<u32> = match hex.len() {
            3 | 4 => hex
                .chars()
                .filter_map(|c| c.to_digit(16).map(|d| d * 17))
                .collect(),
            6 | 8 => hex
                .as_bytes()
                .chunks(2)
                .filter_map(|pair| u32::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok())
                .collect(),
            _ => return None,
        };
        let a = match channels.len() {
            3 => 255,
            4 => channels[3],
            _ => return None,
        };
        Some(Self {
            r: channels[0] as f64,
            g: channels[1] as f64,
            b: channels[2] as f64,
            a: a as f64 / 255.0,
            name: Some(format!("#{}", hex)),
        })
    }

    pub fn channels(&self) -> (u8, u8, u8) {
        (
            cap_channel(self.r),
            cap_channel(self.g),
            cap_channel(self.b),
        )
    }

    /// Canonical serialization: the original token when unchanged, a hex
    /// code for opaque colors, `rgba(...)` otherwise, and `transparent` for
    /// fully transparent black.
    pub fn to_css_string(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let (r, g, b) = self.channels();
        if self.a == 0.0 && r == 0 && g == 0 && b == 0 {
            return "transparent".to_string();
        }
        if self.a >= 1.0 {
            return format!("#{:02x}{:02x}{:02x}", r, g, b);
        }
        let mut out = String::new();
        let _ = write!(out, "rgba({}, {}, {}, {})", r, g, b, format_double(self.a, 5));
        out
    }
}

fn cap_channel(channel: f64) -> u8 {
    channel.round().clamp(0.0, 255.0) as u8
}

/// Resolves a CSS named color. The table covers the common CSS2 names plus
/// the handful the output stage shortens to.
pub fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "white" => (255, 255, 255),
        "maroon" => (128, 0, 0),
        "red" => (255, 0, 0),
        "purple" => (128, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "olive" => (128, 128, 0),
        "yellow" => (255, 255, 0),
        "navy" => (0, 0, 128),
        "blue" => (0, 0, 255),
        "teal" => (0, 128, 128),
        "aqua" | "cyan" => (0, 255, 255),
        "orange" => (255, 165, 0),
        "beige" => (245, 245, 220),
        "ivory" => (255, 255, 240),
        "transparent" => {
            return Some(Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 0.0,
                name: Some(name.to_string()),
            })
        }
        _ => return None,
    };
    Some(Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
        name: Some(name.to_string()),
    })
}

// ----- arithmetic -----

/// `lhs + rhs` with Sass semantics: unit-coerced addition, string and
/// identifier concatenation, channel-wise color math.
pub fn add(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let coerced = b.coerce_to(a, span)?;
            let mut result = if a.is_unitless() && !b.is_unitless() {
                b.clone()
            } else {
                a.clone()
            };
            result.value = a.value + coerced.value;
            Ok(Value::Number(result))
        }
        (Value::Color(a), Value::Number(b)) if b.is_unitless() => {
            Ok(Value::Color(channel_op(a, b.value, |x, y| x + y)))
        }
        (Value::Color(a), Value::Color(b)) => {
            if a.a != b.a {
                return Err(EvalError::UndefinedOperation {
                    lhs: a.to_css_string(),
                    op: "+".to_string(),
                    rhs: b.to_css_string(),
                    span,
                });
            }
            Ok(Value::Color(Color {
                r: a.r + b.r,
                g: a.g + b.g,
                b: a.b + b.b,
                a: a.a,
                name: None,
            }))
        }
        (Value::Str(a), b) => {
            let rhs_text = b.to_css_string(10, false)?;
            Ok(Value::string(format!("{}{}", a.text, rhs_text), a.quoted))
        }
        (a, Value::Str(b)) => {
            let lhs_text = a.to_css_string(10, false)?;
            Ok(Value::string(format!("{}{}", lhs_text, b.text), b.quoted))
        }
        (a, b) => Err(undefined_op(a, "+", b, span)),
    }
}

pub fn subtract(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let coerced = b.coerce_to(a, span)?;
            let mut result = if a.is_unitless() && !b.is_unitless() {
                b.clone()
            } else {
                a.clone()
            };
            result.value = a.value - coerced.value;
            Ok(Value::Number(result))
        }
        (Value::Color(a), Value::Number(b)) if b.is_unitless() => {
            Ok(Value::Color(channel_op(a, b.value, |x, y| x - y)))
        }
        (a, b) => Err(undefined_op(a, "-", b, span)),
    }
}

pub fn multiply(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let mut numerator = a.numerator_units.clone();
            let mut denominator = a.denominator_units.clone();
            numerator.extend(b.numerator_units.iter().cloned());
            denominator.extend(b.denominator_units.iter().cloned());
            cancel_units(&mut numerator, &mut denominator);
            Ok(Value::Number(Number {
                value: a.value * b.value,
                numerator_units: numerator,
                denominator_units: denominator,
            }))
        }
        (Value::Color(a), Value::Number(b)) if b.is_unitless() => {
            Ok(Value::Color(channel_op(a, b.value, |x, y| x * y)))
        }
        (a, b) => Err(undefined_op(a, "*", b, span)),
    }
}

pub fn divide(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            if b.value == 0.0 {
                return Err(EvalError::ZeroDivision { span });
            }
            let mut numerator = a.numerator_units.clone();
            let mut denominator = a.denominator_units.clone();
            numerator.extend(b.denominator_units.iter().cloned());
            denominator.extend(b.numerator_units.iter().cloned());
            cancel_units(&mut numerator, &mut denominator);
            Ok(Value::Number(Number {
                value: a.value / b.value,
                numerator_units: numerator,
                denominator_units: denominator,
            }))
        }
        (a, b) => Err(undefined_op(a, "/", b, span)),
    }
}

pub fn modulo(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            if b.value == 0.0 {
                return Err(EvalError::ZeroDivision { span });
            }
            let coerced = b.coerce_to(a, span)?;
            let mut result = a.clone();
            result.value = a.value.rem_euclid(coerced.value);
            Ok(Value::Number(result))
        }
        (a, b) => Err(undefined_op(a, "%", b, span)),
    }
}

/// Sass equality: numbers compare across convertible units, everything else
/// structurally.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match b.coerce_to(a, Span::phony()) {
            Ok(coerced) => a.value == coerced.value,
            Err(_) => false,
        },
        (Value::Color(a), Value::Color(b)) => {
            a.channels() == b.channels() && a.a == b.a
        }
        (Value::Str(a), Value::Str(b)) => a.text == b.text,
        (a, b) => a == b,
    }
}

pub fn compare(lhs: &Value, rhs: &Value, span: Span) -> EvalResult<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let coerced = b.coerce_to(a, span)?;
            a.value
                .partial_cmp(&coerced.value)
                .ok_or(EvalError::UndefinedOperation {
                    lhs: lhs.inspect(5),
                    op: "<".to_string(),
                    rhs: rhs.inspect(5),
                    span,
                })
        }
        (a, b) => Err(undefined_op(a, "<", b, span)),
    }
}

fn channel_op(color: &Color, operand: f64, op: impl Fn(f64, f64) -> f64) -> Color {
    Color {
        r: op(color.r, operand),
        g: op(color.g, operand),
        b: op(color.b, operand),
        a: color.a,
        name: None,
    }
}

fn cancel_units(numerator: &mut Vec<String>, denominator: &mut Vec<String>) {
    let mut i = 0;
    while i < numerator.len() {
        if let Some(j) = denominator.iter().position(|unit| *unit == numerator[i]) {
            numerator.remove(i);
            denominator.remove(j);
        } else {
            i += 1;
        }
    }
}

fn undefined_op(lhs: &Value, op: &str, rhs: &Value, span: Span) -> EvalError {
    EvalError::UndefinedOperation {
        lhs: lhs.inspect(5),
        op: op.to_string(),
        rhs: rhs.inspect(5),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: f64) -> Value {
        Value::number(value, Some("px"))
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_double(1.0, 5), "1");
        assert_eq!(format_double(1.5, 5), "1.5");
        assert_eq!(format_double(1.123456789, 5), "1.12346");
        assert_eq!(format_double(0.000001, 5), "0.0");
        assert_eq!(format_double(-0.0000001, 5), "0.0");
    }

    #[test]
    fn unit_addition() {
        let result = add(&px(1.0), &px(2.0), Span::phony()).unwrap();
        assert_eq!(result, px(3.0));

        // Convertible units coerce into the left operand's unit.
        let result = add(
            &Value::number(1.0, Some("in")),
            &px(96.0),
            Span::phony(),
        )
        .unwrap();
        assert_eq!(result, Value::number(2.0, Some("in")));
    }

    #[test]
    fn incompatible_units_error() {
        let result = add(&px(1.0), &Value::number(1.0, Some("s")), Span::phony());
        assert!(matches!(result, Err(EvalError::IncompatibleUnits { .. })));
    }

    #[test]
    fn division_cancels_units() {
        let result = divide(&px(10.0), &px(2.0), Span::phony()).unwrap();
        assert_eq!(result, Value::number(5.0, None));
    }

    #[test]
    fn zero_division() {
        let result = divide(&px(10.0), &Value::number(0.0, None), Span::phony());
        assert!(matches!(result, Err(EvalError::ZeroDivision { .. })));
    }

    #[test]
    fn unit_products_are_invalid_css() {
        let product = multiply(&px(2.0), &Value::number(3.0, Some("em")), Span::phony()).unwrap();
        match product {
            Value::Number(number) => {
                assert_eq!(number.unit_string(), "px*em");
                assert!(number.to_css_string(5).is_err());
            }
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn string_concatenation() {
        let result = add(
            &Value::string("a", true),
            &Value::number(1.0, Some("px")),
            Span::phony(),
        )
        .unwrap();
        assert_eq!(result, Value::string("a1px", true));
    }

    #[test]
    fn color_formatting() {
        let red = Color::rgba(255.0, 0.0, 0.0, 1.0);
        assert_eq!(red.to_css_string(), "#ff0000");
        let translucent = Color::rgba(255.0, 0.0, 0.0, 0.5);
        assert_eq!(translucent.to_css_string(), "rgba(255, 0, 0, 0.5)");
        let transparent = Color::rgba(0.0, 0.0, 0.0, 0.0);
        assert_eq!(transparent.to_css_string(), "transparent");
    }

    #[test]
    fn hex_parsing() {
        let color = Color::from_hex("fff").unwrap();
        assert_eq!(color.channels(), (255, 255, 255));
        let color = Color::from_hex("336699").unwrap();
        assert_eq!(color.channels(), (51, 102, 153));
    }

    #[test]
    fn equality_across_units() {
        let a = Value::number(1.0, Some("in"));
        let b = Value::number(96.0, Some("px"));
        assert!(values_equal(&a, &b));
    }
}
