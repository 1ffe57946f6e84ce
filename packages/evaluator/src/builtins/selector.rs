//! Selector built-ins: the script-level surface of the extend engine.
//! `selector-extend` and `selector-replace` run the whole inheritance
//! algorithm on an ephemeral extender without touching durable state.

use super::Args;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use cascade_parser::ListSeparator;
use cascade_selectors::{parse_selector, SelectorList};
use cascade_extend::Extender;

/// Coerces a value to a selector list: strings parse directly, lists join
/// with commas (outer) and spaces (inner), like the original functions do.
fn to_selector(args: &Args, index: usize, name: &str) -> EvalResult<SelectorList> {
    let value = args.require(index, name)?;
    let text = selector_text(value, args.precision)?;
    parse_selector(&text).map_err(|error| EvalError::InvalidArguments {
        message: format!("${}: {}", name, error),
        span: args.span,
    })
}

fn selector_text(value: &Value, precision: usize) -> EvalResult<String> {
    match value {
        Value::List { items, separator } => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| selector_text(item, precision))
                .collect::<EvalResult<_>>()?;
            Ok(parts.join(match separator {
                ListSeparator::Comma => ", ",
                ListSeparator::Space => " ",
            }))
        }
        other => other.to_css_string(precision, false),
    }
}

/// Renders a selector list back to script values: a comma list of space
/// lists of compound-selector strings.
fn to_value(list: &SelectorList) -> Value {
    let members: Vec<Value> = list
        .members
        .iter()
        .map(|complex| {
            let parts: Vec<Value> = complex
                .components
                .iter()
                .map(|component| Value::string(component.to_string(), false))
                .filter(|part| match part {
                    Value::Str(string) => string.text != " ",
                    _ => true,
                })
                .collect();
            Value::List {
                items: parts,
                separator: ListSeparator::Space,
            }
        })
        .collect();
    Value::List {
        items: members,
        separator: ListSeparator::Comma,
    }
}

pub fn parse(args: &Args) -> EvalResult<Value> {
    Ok(to_value(&to_selector(args, 0, "selector")?))
}

pub fn unify(args: &Args) -> EvalResult<Value> {
    let list1 = to_selector(args, 0, "selector1")?;
    let list2 = to_selector(args, 1, "selector2")?;
    Ok(list1
        .unify(&list2)
        .map(|unified| to_value(&unified))
        .unwrap_or(Value::Null))
}

pub fn is_superselector(args: &Args) -> EvalResult<Value> {
    let list1 = to_selector(args, 0, "super")?;
    let list2 = to_selector(args, 1, "sub")?;
    Ok(Value::Bool(list1.is_superselector(&list2)))
}

pub fn extend(args: &Args) -> EvalResult<Value> {
    let selector = to_selector(args, 0, "selector")?;
    let extendee = to_selector(args, 1, "extendee")?;
    let extender = to_selector(args, 2, "extender")?;
    let extended = Extender::one_shot_extend(&selector, &extender, &extendee)?;
    Ok(to_value(&extended))
}

pub fn replace(args: &Args) -> EvalResult<Value> {
    let selector = to_selector(args, 0, "selector")?;
    let original = to_selector(args, 1, "original")?;
    let replacement = to_selector(args, 2, "replacement")?;
    let replaced = Extender::one_shot_replace(&selector, &replacement, &original)?;
    Ok(to_value(&replaced))
}

pub fn append(args: &Args) -> EvalResult<Value> {
    let mut combined: Option<String> = None;
    let mut index = 0;
    while let Some(value) = args.get(index, "selectors") {
        let text = selector_text(value, args.precision)?;
        combined = Some(match combined {
            None => text,
            Some(previous) => {
                // Appended selectors concatenate member-wise without a
                // descendant combinator.
                let previous_list = parse_selector(&previous).map_err(EvalError::from)?;
                let next_list = parse_selector(&text).map_err(EvalError::from)?;
                let mut members = Vec::new();
                for lhs in &previous_list.members {
                    for rhs in &next_list.members {
                        members.push(format!("{}{}", lhs, rhs));
                    }
                }
                members.join(", ")
            }
        });
        index += 1;
    }
    let combined = combined.ok_or_else(|| EvalError::InvalidArguments {
        message: "$selectors: At least one selector must be passed.".to_string(),
        span: args.span,
    })?;
    let parsed = parse_selector(&combined).map_err(EvalError::from)?;
    Ok(to_value(&parsed))
}

pub fn simple_selectors(args: &Args) -> EvalResult<Value> {
    let selector = to_selector(args, 0, "selector")?;
    let compound = selector
        .members
        .first()
        .and_then(|complex| complex.first_compound())
        .ok_or_else(|| EvalError::InvalidArguments {
            message: "$selector: expected a compound selector.".to_string(),
            span: args.span,
        })?;
    Ok(Value::List {
        items: compound
            .parts
            .iter()
            .map(|simple| Value::string(simple.to_string(), false))
            .collect(),
        separator: ListSeparator::Comma,
    })
}
