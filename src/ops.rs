//! Unary and binary operators over numbers and datasets.
//!
//! Operators never modify their operands: every dataset result is a new
//! series, so the collection a dataset came from stays usable.

use lang::{BinOp, UnaryOp};

use crate::{
    error::{Error, Result},
    series::Series,
    value::Value,
};

pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    log::trace!("dispatching {}{}", op.symbol(), operand.kind());
    match (op, operand) {
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Negate, Value::Series(series)) => Ok(Value::Series(series.map_values(|v| -v))),
        (UnaryOp::Identity, Value::Number(n)) => Ok(Value::Number(*n)),
        (UnaryOp::Identity, Value::Series(series)) => Ok(Value::Series(series.clone())),
        (op, operand) => Err(Error::Operation {
            op: op.symbol(),
            operands: operand.kind().to_string(),
        }),
    }
}

pub fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value> {
    log::trace!("dispatching {} {} {}", left.kind(), op.symbol(), right.kind());
    if matches!(op, BinOp::Divide | BinOp::Modulo) {
        check_divisor(right)?;
    }

    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(compute(op, *l, *r))),
        (Value::Number(l), Value::Series(r)) => {
            Ok(Value::Series(r.map_values(|v| compute(op, *l, v))))
        }
        (Value::Series(l), Value::Number(r)) => {
            Ok(Value::Series(l.map_values(|v| compute(op, v, *r))))
        }
        (Value::Series(l), Value::Series(r)) => {
            Ok(Value::Series(l.zip_values(r, |a, b| compute(op, a, b))))
        }
        (left, right) => Err(Error::Operation {
            op: op.symbol(),
            operands: format!("{} and {}", left.kind(), right.kind()),
        }),
    }
}

fn compute(op: BinOp, left: f64, right: f64) -> f64 {
    match op {
        BinOp::Add => left + right,
        BinOp::Subtract => left - right,
        BinOp::Multiply => left * right,
        BinOp::Divide => left / right,
        BinOp::Modulo => left % right,
    }
}

/// A dataset divisor is refused as soon as it holds a zero on any day,
/// not only on the days it is combined with.
fn check_divisor(divisor: &Value) -> Result<()> {
    let has_zero = match divisor {
        Value::Number(n) => *n == 0.0,
        Value::Series(series) => contains_zero(series),
        Value::Date(_) => false,
    };
    if has_zero {
        Err(Error::DivisionByZero)
    } else {
        Ok(())
    }
}

fn contains_zero(series: &Series) -> bool {
    series.values().iter().flatten().any(|v| *v == 0.0)
}
