//! Built-in SassScript functions. Functions needing evaluator state
//! (`variable-exists`, `mixin-exists`, ...) are dispatched directly by the
//! evaluator; everything here is pure over its arguments.

mod colors;
mod lists;
mod maps;
mod meta;
mod selector;
mod strings;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use cascade_selectors::Span;

/// Arguments to a built-in call, after evaluation.
pub struct Args {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
    pub span: Span,
    pub precision: usize,
}

impl Args {
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(named, _)| named == name)
            .map(|(_, value)| value)
            .or_else(|| self.positional.get(index))
    }

    pub fn require(&self, index: usize, name: &str) -> EvalResult<&Value> {
        self.get(index, name).ok_or_else(|| EvalError::InvalidArguments {
            message: format!("Missing argument ${}.", name),
            span: self.span,
        })
    }

    pub fn number(&self, index: usize, name: &str) -> EvalResult<f64> {
        match self.require(index, name)? {
            Value::Number(number) => Ok(number.value),
            other => Err(self.bad_type(name, "number", other)),
        }
    }

    pub fn bad_type(&self, name: &str, expected: &str, value: &Value) -> EvalError {
        EvalError::InvalidArguments {
            message: format!(
                "${}: \"{}\" is not a {}.",
                name,
                value.inspect(self.precision),
                expected
            ),
            span: self.span,
        }
    }
}

/// Runs a built-in by name; `None` means the name is not a built-in and the
/// call should be emitted as plain CSS.
pub fn dispatch(name: &str, args: &Args) -> Option<EvalResult<Value>> {
    let result = match name {
        // selector
        "selector-parse" => selector::parse(args),
        "selector-unify" => selector::unify(args),
        "is-superselector" => selector::is_superselector(args),
        "selector-extend" => selector::extend(args),
        "selector-replace" => selector::replace(args),
        "selector-append" => selector::append(args),
        "simple-selectors" => selector::simple_selectors(args),
        // maps
        "map-get" => maps::get(args),
        "map-merge" => maps::merge(args),
        "map-remove" => maps::remove(args),
        "map-keys" => maps::keys(args),
        "map-values" => maps::values(args),
        "map-has-key" => maps::has_key(args),
        // meta
        "type-of" => meta::type_of(args),
        "unit" => meta::unit(args),
        "unitless" => meta::unitless(args),
        "inspect" => meta::inspect(args),
        "feature-exists" => meta::feature_exists(args),
        "if" => meta::if_fn(args),
        // lists
        "length" => lists::length(args),
        "nth" => lists::nth(args),
        "join" => lists::join(args),
        "append" => lists::append(args),
        "index" => lists::index(args),
        "list-separator" => lists::separator(args),
        // colors
        "rgb" => colors::rgb(args),
        "rgba" => colors::rgba(args),
        "red" => colors::red(args),
        "green" => colors::green(args),
        "blue" => colors::blue(args),
        "alpha" | "opacity" => colors::alpha(args),
        "mix" => colors::mix(args),
        // strings
        "quote" => strings::quote(args),
        "unquote" => strings::unquote(args),
        "str-length" => strings::str_length(args),
        "to-upper-case" => strings::to_upper_case(args),
        "to-lower-case" => strings::to_lower_case(args),
        _ => return None,
    };
    Some(result)
}
