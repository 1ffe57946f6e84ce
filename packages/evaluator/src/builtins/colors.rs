use super::Args;
use crate::error::{EvalError, EvalResult};
use crate::value::{Color, Value};

fn as_color(args: &Args, index: usize, name: &str) -> EvalResult<Color> {
    match args.require(index, name)? {
        Value::Color(color) => Ok(color.clone()),
        other => Err(args.bad_type(name, "color", other)),
    }
}

fn channel(args: &Args, index: usize, name: &str) -> EvalResult<f64> {
    match args.require(index, name)? {
        Value::Number(number) => {
            // Percentages scale onto the 0..255 channel range.
            if number.numerator_units.first().map(String::as_str) == Some("%") {
                Ok(number.value * 255.0 / 100.0)
            } else {
                Ok(number.value)
            }
        }
        other => Err(args.bad_type(name, "number", other)),
    }
}

pub fn rgb(args: &Args) -> EvalResult<Value> {
    Ok(Value::Color(Color::rgba(
        channel(args, 0, "red")?,
        channel(args, 1, "green")?,
        channel(args, 2, "blue")?,
        1.0,
    )))
}

pub fn rgba(args: &Args) -> EvalResult<Value> {
    // rgba($color, $alpha) or rgba($red, $green, $blue, $alpha)
    if let Some(Value::Color(color)) = args.get(0, "color") {
        let mut color = color.clone();
        color.a = args.number(1, "alpha")?;
        color.name = None;
        return Ok(Value::Color(color));
    }
    Ok(Value::Color(Color::rgba(
        channel(args, 0, "red")?,
        channel(args, 1, "green")?,
        channel(args, 2, "blue")?,
        args.number(3, "alpha")?,
    )))
}

pub fn red(args: &Args) -> EvalResult<Value> {
    Ok(Value::number(as_color(args, 0, "color")?.channels().0 as f64, None))
}

pub fn green(args: &Args) -> EvalResult<Value> {
    Ok(Value::number(as_color(args, 0, "color")?.channels().1 as f64, None))
}

pub fn blue(args: &Args) -> EvalResult<Value> {
    Ok(Value::number(as_color(args, 0, "color")?.channels().2 as f64, None))
}

pub fn alpha(args: &Args) -> EvalResult<Value> {
    Ok(Value::number(as_color(args, 0, "color")?.a, None))
}

pub fn mix(args: &Args) -> EvalResult<Value> {
    let color1 = as_color(args, 0, "color1")?;
    let color2 = as_color(args, 1, "color2")?;
    let weight = match args.get(2, "weight") {
        Some(Value::Number(number)) => number.value / 100.0,
        Some(other) => return Err(args.bad_type("weight", "number", other)),
        None => 0.5,
    };
    if !(0.0..=1.0).contains(&weight) {
        return Err(EvalError::InvalidArguments {
            message: "$weight: Must be between 0% and 100%.".to_string(),
            span: args.span,
        });
    }

    // Weight the normalized scale by each color's relative opacity.
    let normalized = weight * 2.0 - 1.0;
    let alpha_distance = color1.a - color2.a;
    let combined = if normalized * alpha_distance == -1.0 {
        normalized
    } else {
        (normalized + alpha_distance) / (1.0 + normalized * alpha_distance)
    };
    let weight1 = (combined + 1.0) / 2.0;
    let weight2 = 1.0 - weight1;

    Ok(Value::Color(Color::rgba(
        color1.r * weight1 + color2.r * weight2,
        color1.g * weight1 + color2.g * weight2,
        color1.b * weight1 + color2.b * weight2,
        color1.a * weight + color2.a * (1.0 - weight),
    )))
}
