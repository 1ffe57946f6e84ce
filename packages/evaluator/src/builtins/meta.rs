use super::Args;
use crate::error::EvalResult;
use crate::value::Value;

pub fn type_of(args: &Args) -> EvalResult<Value> {
    let value = args.require(0, "value")?;
    Ok(Value::string(value.type_name(), false))
}

pub fn unit(args: &Args) -> EvalResult<Value> {
    match args.require(0, "number")? {
        Value::Number(number) => Ok(Value::string(number.unit_string(), true)),
        other => Err(args.bad_type("number", "number", other)),
    }
}

pub fn unitless(args: &Args) -> EvalResult<Value> {
    match args.require(0, "number")? {
        Value::Number(number) => Ok(Value::Bool(number.is_unitless())),
        other => Err(args.bad_type("number", "number", other)),
    }
}

pub fn inspect(args: &Args) -> EvalResult<Value> {
    let value = args.require(0, "value")?;
    Ok(Value::string(value.inspect(args.precision), false))
}

pub fn feature_exists(args: &Args) -> EvalResult<Value> {
    let feature = match args.require(0, "feature")? {
        Value::Str(string) => string.text.clone(),
        other => return Err(args.bad_type("feature", "string", other)),
    };
    Ok(Value::Bool(matches!(
        feature.as_str(),
        "global-variable-shadowing" | "extend-selector-pseudoclass" | "at-error" | "units-level-3"
    )))
}

pub fn if_fn(args: &Args) -> EvalResult<Value> {
    let condition = args.require(0, "condition")?;
    if condition.is_truthy() {
        args.require(1, "if-true").cloned()
    } else {
        args.require(2, "if-false").cloned()
    }
}
