use super::Args;
use crate::error::{EvalError, EvalResult};
use crate::value::{values_equal, Value};
use cascade_parser::ListSeparator;

fn as_map(args: &Args, index: usize, name: &str) -> EvalResult<Vec<(Value, Value)>> {
    match args.require(index, name)? {
        Value::Map(entries) => Ok(entries.clone()),
        // An empty list doubles as an empty map.
        Value::List { items, .. } if items.is_empty() => Ok(Vec::new()),
        other => Err(args.bad_type(name, "map", other)),
    }
}

pub fn get(args: &Args) -> EvalResult<Value> {
    let map = as_map(args, 0, "map")?;
    let key = args.require(1, "key")?;
    Ok(map
        .iter()
        .find(|(candidate, _)| values_equal(candidate, key))
        .map(|(_, value)| value.clone())
        .unwrap_or(Value::Null))
}

pub fn merge(args: &Args) -> EvalResult<Value> {
    let mut merged = as_map(args, 0, "map1")?;
    let other = as_map(args, 1, "map2")?;
    for (key, value) in other {
        if let Some(existing) = merged
            .iter_mut()
            .find(|(candidate, _)| values_equal(candidate, &key))
        {
            existing.1 = value;
        } else {
            merged.push((key, value));
        }
    }
    Ok(Value::Map(merged))
}

pub fn remove(args: &Args) -> EvalResult<Value> {
    let map = as_map(args, 0, "map")?;
    let mut keys: Vec<&Value> = Vec::new();
    let mut index = 1;
    while let Some(key) = args.get(index, "key") {
        keys.push(key);
        index += 1;
    }
    if keys.is_empty() {
        return Err(EvalError::InvalidArguments {
            message: "Missing argument $key.".to_string(),
            span: args.span,
        });
    }
    Ok(Value::Map(
        map.into_iter()
            .filter(|(candidate, _)| !keys.iter().any(|key| values_equal(candidate, key)))
            .collect(),
    ))
}

pub fn keys(args: &Args) -> EvalResult<Value> {
    let map = as_map(args, 0, "map")?;
    Ok(Value::List {
        items: map.into_iter().map(|(key, _)| key).collect(),
        separator: ListSeparator::Comma,
    })
}

pub fn values(args: &Args) -> EvalResult<Value> {
    let map = as_map(args, 0, "map")?;
    Ok(Value::List {
        items: map.into_iter().map(|(_, value)| value).collect(),
        separator: ListSeparator::Comma,
    })
}

pub fn has_key(args: &Args) -> EvalResult<Value> {
    let map = as_map(args, 0, "map")?;
    let key = args.require(1, "key")?;
    Ok(Value::Bool(
        map.iter().any(|(candidate, _)| values_equal(candidate, key)),
    ))
}
