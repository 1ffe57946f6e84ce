use super::Args;
use crate::error::{EvalError, EvalResult};
use crate::value::{values_equal, Value};
use cascade_parser::ListSeparator;

pub fn length(args: &Args) -> EvalResult<Value> {
    let value = args.require(0, "list")?;
    Ok(Value::number(value.as_items().len() as f64, None))
}

pub fn nth(args: &Args) -> EvalResult<Value> {
    let items = args.require(0, "list")?.as_items();
    let n = args.number(1, "n")?;
    if n == 0.0 {
        return Err(EvalError::InvalidArguments {
            message: "$n: List index may not be 0.".to_string(),
            span: args.span,
        });
    }
    // Negative indices count from the end.
    let index = if n < 0.0 {
        items.len() as f64 + n
    } else {
        n - 1.0
    };
    items
        .get(index as usize)
        .cloned()
        .ok_or_else(|| EvalError::InvalidArguments {
            message: format!(
                "$n: Invalid index {} for a list with {} elements.",
                n,
                items.len()
            ),
            span: args.span,
        })
}

fn separator_of(value: &Value) -> Option<ListSeparator> {
    match value {
        Value::List { separator, items } if !items.is_empty() => Some(*separator),
        _ => None,
    }
}

fn requested_separator(args: &Args, index: usize) -> EvalResult<Option<ListSeparator>> {
    match args.get(index, "separator") {
        None => Ok(None),
        Some(Value::Str(string)) => match string.text.as_str() {
            "comma" => Ok(Some(ListSeparator::Comma)),
            "space" => Ok(Some(ListSeparator::Space)),
            "auto" => Ok(None),
            other => Err(EvalError::InvalidArguments {
                message: format!("$separator: Must be \"space\", \"comma\", or \"auto\"; was \"{}\".", other),
                span: args.span,
            }),
        },
        Some(other) => Err(args.bad_type("separator", "string", other)),
    }
}

pub fn join(args: &Args) -> EvalResult<Value> {
    let list1 = args.require(0, "list1")?;
    let list2 = args.require(1, "list2")?;
    let separator = requested_separator(args, 2)?
        .or_else(|| separator_of(list1))
        .or_else(|| separator_of(list2))
        .unwrap_or(ListSeparator::Space);
    let mut items = list1.as_items();
    items.extend(list2.as_items());
    Ok(Value::List { items, separator })
}

pub fn append(args: &Args) -> EvalResult<Value> {
    let list = args.require(0, "list")?;
    let value = args.require(1, "val")?.clone();
    let separator = requested_separator(args, 2)?
        .or_else(|| separator_of(list))
        .unwrap_or(ListSeparator::Space);
    let mut items = list.as_items();
    items.push(value);
    Ok(Value::List { items, separator })
}

pub fn index(args: &Args) -> EvalResult<Value> {
    let items = args.require(0, "list")?.as_items();
    let needle = args.require(1, "value")?;
    Ok(items
        .iter()
        .position(|item| values_equal(item, needle))
        .map(|position| Value::number(position as f64 + 1.0, None))
        .unwrap_or(Value::Null))
}

pub fn separator(args: &Args) -> EvalResult<Value> {
    let separator = separator_of(args.require(0, "list")?).unwrap_or(ListSeparator::Space);
    Ok(Value::string(
        match separator {
            ListSeparator::Comma => "comma",
            ListSeparator::Space => "space",
        },
        false,
    ))
}
