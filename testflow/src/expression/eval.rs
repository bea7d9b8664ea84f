//! Evaluation of parsed expressions over bound variable values.

use super::parser::{BinaryOp, CompareOp, Expr, LogicalOp, UnaryOp};
use super::ExpressionError;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Variable path to value, bound before evaluation starts.
pub(crate) type Bindings = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Number(n) = value else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            Some(Self::Int(i))
        } else {
            n.as_f64().map(Self::Float)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self) -> Result<Value, ExpressionError> {
        match self {
            Self::Int(i) => Ok(Value::from(i)),
            Self::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| type_error("arithmetic produced a non-finite number")),
        }
    }
}

fn type_error(message: impl Into<String>) -> ExpressionError {
    ExpressionError::Type(message.into())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Python-like truthiness.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Equality that treats `1` and `1.0` as equal.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (Num::from_value(left), Num::from_value(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => match (left, right) {
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
            }
            _ => left == right,
        },
    }
}

pub(crate) fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(path) => bindings
            .get(path)
            .cloned()
            .ok_or_else(|| ExpressionError::UndefinedVariable(path.clone())),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, bindings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, bindings)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Unary { op, operand } => unary(*op, &evaluate(operand, bindings)?),
        Expr::Binary { left, op, right } => {
            binary(*op, &evaluate(left, bindings)?, &evaluate(right, bindings)?)
        }
        Expr::Logical { left, op, right } => {
            let left = evaluate(left, bindings)?;
            match (op, truthy(&left)) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => evaluate(right, bindings),
            }
        }
        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, bindings)?;
            for (op, right) in rest {
                let right = evaluate(right, bindings)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Index { target, index } => {
            subscript(&evaluate(target, bindings)?, &evaluate(index, bindings)?)
        }
        Expr::Member { target, name } => match evaluate(target, bindings)? {
            Value::Object(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| type_error(format!("object has no member '{name}'"))),
            other => Err(type_error(format!(
                "cannot access member '{name}' of {}",
                type_name(&other)
            ))),
        },
        Expr::Len(argument) => match evaluate(argument, bindings)? {
            Value::String(s) => Ok(Value::from(s.chars().count())),
            Value::Array(items) => Ok(Value::from(items.len())),
            Value::Object(map) => Ok(Value::from(map.len())),
            other => Err(type_error(format!("len() of {}", type_name(&other)))),
        },
    }
}

fn unary(op: UnaryOp, operand: &Value) -> Result<Value, ExpressionError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!truthy(operand))),
        UnaryOp::Negate => match Num::from_value(operand) {
            Some(Num::Int(i)) => i
                .checked_neg()
                .map(Value::from)
                .ok_or_else(|| type_error("integer overflow")),
            Some(Num::Float(f)) => Num::Float(-f).into_value(),
            None => Err(type_error(format!("cannot negate {}", type_name(operand)))),
        },
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExpressionError> {
    if op == BinaryOp::Add {
        match (left, right) {
            (Value::String(a), Value::String(b)) => return Ok(Value::String(format!("{a}{b}"))),
            (Value::Array(a), Value::Array(b)) => {
                return Ok(Value::Array(a.iter().chain(b).cloned().collect()));
            }
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (Num::from_value(left), Num::from_value(right)) else {
        return Err(type_error(format!(
            "unsupported operand types for {op:?}: {} and {}",
            type_name(left),
            type_name(right)
        )));
    };

    arithmetic(op, a, b)?.into_value()
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> Result<Num, ExpressionError> {
    let overflow = || type_error("integer overflow");

    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        return match op {
            BinaryOp::Add => x.checked_add(y).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Subtract => x.checked_sub(y).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Multiply => x.checked_mul(y).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Divide => divide(a.as_f64(), b.as_f64()).map(Num::Float),
            BinaryOp::FloorDivide | BinaryOp::Modulo if y == 0 => {
                Err(type_error("division by zero"))
            }
            BinaryOp::FloorDivide => {
                let quotient = x.checked_div(y).ok_or_else(overflow)?;
                let adjust = x % y != 0 && ((x < 0) != (y < 0));
                Ok(Num::Int(if adjust { quotient - 1 } else { quotient }))
            }
            BinaryOp::Modulo => {
                let remainder = x.checked_rem(y).ok_or_else(overflow)?;
                let adjust = remainder != 0 && ((remainder < 0) != (y < 0));
                Ok(Num::Int(if adjust { remainder + y } else { remainder }))
            }
        };
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    match op {
        BinaryOp::Add => Ok(Num::Float(x + y)),
        BinaryOp::Subtract => Ok(Num::Float(x - y)),
        BinaryOp::Multiply => Ok(Num::Float(x * y)),
        BinaryOp::Divide => divide(x, y).map(Num::Float),
        BinaryOp::FloorDivide => divide(x, y).map(|q| Num::Float(q.floor())),
        BinaryOp::Modulo => {
            if y == 0.0 {
                return Err(type_error("division by zero"));
            }
            Ok(Num::Float(x - y * (x / y).floor()))
        }
    }
}

fn divide(x: f64, y: f64) -> Result<f64, ExpressionError> {
    if y == 0.0 {
        Err(type_error("division by zero"))
    } else {
        Ok(x / y)
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, ExpressionError> {
    match op {
        CompareOp::Equal => Ok(values_equal(left, right)),
        CompareOp::NotEqual => Ok(!values_equal(left, right)),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Less => order(left, right).map(Ordering::is_lt),
        CompareOp::LessEqual => order(left, right).map(Ordering::is_le),
        CompareOp::Greater => order(left, right).map(Ordering::is_gt),
        CompareOp::GreaterEqual => order(left, right).map(Ordering::is_ge),
    }
}

fn order(left: &Value, right: &Value) -> Result<Ordering, ExpressionError> {
    match (Num::from_value(left), Num::from_value(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => return Ok(a.cmp(&b)),
        (Some(a), Some(b)) => {
            return a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .ok_or_else(|| type_error("numbers are not comparable"));
        }
        _ => {}
    }

    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(type_error(format!(
            "cannot order {} and {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

fn contains(haystack: &Value, needle: &Value) -> Result<bool, ExpressionError> {
    match (haystack, needle) {
        (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
        (Value::Array(items), _) => Ok(items.iter().any(|item| values_equal(item, needle))),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        _ => Err(type_error(format!(
            "'in' is not supported between {} and {}",
            type_name(needle),
            type_name(haystack)
        ))),
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, ExpressionError> {
    match (target, index) {
        (Value::Object(map), Value::String(key)) => map
            .get(key)
            .cloned()
            .ok_or_else(|| type_error(format!("key '{key}' not found"))),
        (Value::Array(items), _) => {
            let position = sequence_index(index, items.len())?;
            Ok(items[position].clone())
        }
        (Value::String(s), _) => {
            let chars: Vec<char> = s.chars().collect();
            let position = sequence_index(index, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        _ => Err(type_error(format!(
            "cannot index {} with {}",
            type_name(target),
            type_name(index)
        ))),
    }
}

/// Resolves a possibly negative index against `len`.
fn sequence_index(index: &Value, len: usize) -> Result<usize, ExpressionError> {
    let Some(Num::Int(i)) = Num::from_value(index) else {
        return Err(type_error(format!("index must be an integer, got {}", type_name(index))));
    };
    let len = i64::try_from(len).map_err(|_| type_error("sequence too long"))?;
    let resolved = if i < 0 { len + i } else { i };

    if (0..len).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| type_error("index out of range"))
    } else {
        Err(type_error(format!("index {i} out of range")))
    }
}
