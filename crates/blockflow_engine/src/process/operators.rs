//! Operator, text and list primitives.
//!
//! These never touch the context chain: each maps evaluated inputs to a value.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;

use blockflow_foundation::{Error, ListVec, Result, Type, Value};
use blockflow_language::Primitive;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

static NOTHING: Value = Value::Nil;

/// Input `index`, or nothing if the block has fewer inputs.
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NOTHING)
}

/// Applies a primitive that only computes a value.
pub(crate) fn apply(primitive: Primitive, args: &[Value]) -> Result<Value> {
    use Primitive as P;
    let (a, b) = (arg(args, 0), arg(args, 1));
    match primitive {
        P::ReportSum => sum(a, b),
        P::ReportDifference => difference(a, b),
        P::ReportProduct => product(a, b),
        P::ReportQuotient => quotient(a, b),
        P::ReportModulus => modulus(a, b),
        P::ReportRound => round(a),
        P::ReportMonadic => monadic(&a.to_string(), b),
        P::ReportLessThan => Ok(Value::Bool(compare(a, b) == Ordering::Less)),
        P::ReportGreaterThan => Ok(Value::Bool(compare(a, b) == Ordering::Greater)),
        P::ReportEquals => Ok(Value::Bool(snap_equals(a, b))),
        P::ReportNot => Ok(Value::Bool(!a.is_truthy())),
        P::ReportTrue => Ok(Value::Bool(true)),
        P::ReportFalse => Ok(Value::Bool(false)),
        P::ReportJoinWords => Ok(join(a)),
        P::ReportLetter => letter(a, b),
        P::ReportStringSize => Ok(Value::Int(a.to_string().chars().count() as i64)),
        P::ReportNewList => Ok(match a {
            Value::List(_) => a.clone(),
            Value::Nil => Value::List(ListVec::new()),
            other => Value::List(std::iter::once(other.clone()).collect()),
        }),
        P::ReportListItem => list_item(a, b),
        P::ReportListLength => Ok(Value::Int(list(a)?.len() as i64)),
        P::ReportCONS => Ok(Value::List(list(b)?.push_front(a.clone()))),
        P::ReportCDR => Ok(Value::List(list(a)?.rest())),
        P::ReportListContainsItem => Ok(Value::Bool(list(a)?.iter().any(|x| snap_equals(x, b)))),
        other => Err(Error::internal(format!("{other} needs the scheduler"))),
    }
}

fn numeric_op(
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a.to_number()?, b.to_number()?) {
        (Value::Int(x), Value::Int(y)) => Ok(int_op(x, y)
            .map_or_else(|| Value::Float(float_op(x as f64, y as f64)), Value::Int)),
        (x, y) => Ok(Value::Float(float_op(x.to_f64()?, y.to_f64()?))),
    }
}

/// `a + b`, staying integral while it fits.
pub(crate) fn sum(a: &Value, b: &Value) -> Result<Value> {
    numeric_op(a, b, i64::checked_add, |x, y| x + y)
}

pub(crate) fn difference(a: &Value, b: &Value) -> Result<Value> {
    numeric_op(a, b, i64::checked_sub, |x, y| x - y)
}

pub(crate) fn product(a: &Value, b: &Value) -> Result<Value> {
    numeric_op(a, b, i64::checked_mul, |x, y| x * y)
}

/// `a / b`; integral only when exact. Dividing by zero gives an infinity.
pub(crate) fn quotient(a: &Value, b: &Value) -> Result<Value> {
    numeric_op(
        a,
        b,
        |x, y| (y != 0 && x.checked_rem(y) == Some(0)).then(|| x / y),
        |x, y| x / y,
    )
}

/// Modulus with the sign of the divisor. Modulo zero is NaN.
pub(crate) fn modulus(a: &Value, b: &Value) -> Result<Value> {
    numeric_op(
        a,
        b,
        |x, y| x.checked_rem(y).map(|r| if r != 0 && (r < 0) != (y < 0) { r + y } else { r }),
        |x, y| ((x % y) + y) % y,
    )
}

fn round(a: &Value) -> Result<Value> {
    let rounded = a.to_f64()?.round();
    if rounded.is_finite() && rounded.abs() < 9.0e15 {
        Ok(Value::Int(rounded as i64))
    } else {
        Ok(Value::Float(rounded))
    }
}

/// `(fn) of (n)`; trigonometry works in degrees.
fn monadic(function: &str, n: &Value) -> Result<Value> {
    let x = n.to_f64()?;
    let result = match function {
        "abs" => x.abs(),
        "neg" => -x,
        "floor" => x.floor(),
        "ceiling" => x.ceil(),
        "sqrt" => x.sqrt(),
        "sin" => x.to_radians().sin(),
        "cos" => x.to_radians().cos(),
        "tan" => x.to_radians().tan(),
        "asin" => x.asin().to_degrees(),
        "acos" => x.acos().to_degrees(),
        "atan" => x.atan().to_degrees(),
        "ln" => x.ln(),
        "log" => x.log10(),
        "e^" => x.exp(),
        "10^" => 10_f64.powf(x),
        other => return Err(Error::primitive("reportMonadic", format!("unknown function {other}"))),
    };
    if matches!(function, "abs" | "neg" | "floor" | "ceiling") {
        if let Value::Int(_) = n.to_number()? {
            return Ok(Value::Int(result as i64));
        }
    }
    Ok(Value::Float(result))
}

/// `pick random a to b`: whole numbers if both bounds are whole, otherwise a
/// fraction in between.
pub(crate) fn random(rng: &mut ChaCha8Rng, a: &Value, b: &Value) -> Result<Value> {
    match (a.to_number()?, b.to_number()?) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(rng.gen_range(x.min(y)..=x.max(y)))),
        (x, y) => {
            let (x, y) = (x.to_f64()?, y.to_f64()?);
            if !(x - y).is_finite() {
                return Err(Error::primitive("reportRandom", "bounds must be finite numbers"));
            }
            let (low, high) = if x <= y { (x, y) } else { (y, x) };
            if low == high {
                return Ok(Value::Float(low));
            }
            Ok(Value::Float(rng.gen_range(low..high)))
        }
    }
}

/// Equality as users expect it: numerically when both sides read as
/// numbers, element-wise for lists, otherwise case-insensitive text.
pub(crate) fn snap_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| snap_equals(p, q))
        }
        (Value::Closure(x), Value::Closure(y)) => x == y,
        _ => match (a.numeric(), b.numeric()) {
            (Some(x), Some(y)) => x == y,
            _ => a.to_string().to_lowercase() == b.to_string().to_lowercase(),
        },
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.numeric(), b.numeric()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
    }
}

fn join(words: &Value) -> Value {
    let text: String = match words {
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        other => other.to_string(),
    };
    Value::from(text)
}

/// 1-based position from a user index; `None` if out of range.
fn position(index: &Value, length: usize) -> Result<Option<usize>> {
    if index.as_str().is_some_and(|s| s.eq_ignore_ascii_case("last")) {
        return Ok(length.checked_sub(1));
    }
    let i = index.to_f64()?.floor();
    if i < 1.0 || i > length as f64 {
        return Ok(None);
    }
    Ok(Some(i as usize - 1))
}

fn letter(index: &Value, text: &Value) -> Result<Value> {
    let text = text.to_string();
    let count = text.chars().count();
    Ok(match position(index, count)? {
        Some(i) => text.chars().nth(i).map(String::from).map_or(Value::Nil, Value::from),
        None => Value::from(""),
    })
}

fn list_item(index: &Value, items: &Value) -> Result<Value> {
    let items = list(items)?;
    Ok(position(index, items.len())?
        .and_then(|i| items.get(i).cloned())
        .unwrap_or_default())
}

fn list(value: &Value) -> Result<ListVec<Value>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Nil => Ok(ListVec::new()),
        other => Err(Error::type_mismatch(Type::List, other.value_type())),
    }
}
