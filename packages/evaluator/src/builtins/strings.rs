use super::Args;
use crate::error::EvalResult;
use crate::value::Value;

pub fn quote(args: &Args) -> EvalResult<Value> {
    match args.require(0, "string")? {
        Value::Str(string) => Ok(Value::string(string.text.clone(), true)),
        other => Ok(Value::string(other.to_css_string(args.precision, false)?, true)),
    }
}

pub fn unquote(args: &Args) -> EvalResult<Value> {
    match args.require(0, "string")? {
        Value::Str(string) => Ok(Value::string(string.text.clone(), false)),
        other => Ok(other.clone()),
    }
}

pub fn str_length(args: &Args) -> EvalResult<Value> {
    match args.require(0, "string")? {
        Value::Str(string) => Ok(Value::number(string.text.chars().count() as f64, None)),
        other => Err(args.bad_type("string", "string", other)),
    }
}

pub fn to_upper_case(args: &Args) -> EvalResult<Value> {
    match args.require(0, "string")? {
        Value::Str(string) => Ok(Value::Str(crate::value::SassStr {
            text: string.text.to_uppercase(),
            quoted: string.quoted,
        })),
        other => Err(args.bad_type("string", "string", other)),
    }
}

pub fn to_lower_case(args: &Args) -> EvalResult<Value> {
    match args.require(0, "string")? {
        Value::Str(string) => Ok(Value::Str(crate::value::SassStr {
            text: string.text.to_lowercase(),
            quoted: string.quoted,
        })),
        other => Err(args.bad_type("string", "string", other)),
    }
}
