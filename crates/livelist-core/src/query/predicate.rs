//! Filter predicates over JSON object data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator used by [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Left side equals one of the elements of the right-hand array.
    In,
    /// Left string contains right string, or left array contains right value.
    Contains,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
            ComparisonOp::In => "IN",
            ComparisonOp::Contains => "CONTAINS",
        }
    }
}

/// A boolean condition evaluated against an object's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    True,
    False,
    Compare {
        key_path: String,
        op: ComparisonOp,
        value: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(key_path: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            key_path: key_path.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate against an object's JSON data.
    pub fn evaluate(&self, data: &Value) -> bool {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Compare {
                key_path,
                op,
                value,
            } => {
                let lhs = resolve_key_path(data, key_path).unwrap_or(&Value::Null);
                compare(lhs, *op, value)
            }
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(data)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(data)),
            Predicate::Not(inner) => !inner.evaluate(data),
        }
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::And(mut lhs), Predicate::And(rhs)) => {
                lhs.extend(rhs);
                Predicate::And(lhs)
            }
            (Predicate::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Predicate::And(lhs)
            }
            (lhs, rhs) => Predicate::And(vec![lhs, rhs]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Or(mut lhs), Predicate::Or(rhs)) => {
                lhs.extend(rhs);
                Predicate::Or(lhs)
            }
            (Predicate::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Predicate::Or(lhs)
            }
            (lhs, rhs) => Predicate::Or(vec![lhs, rhs]),
        }
    }

    pub fn negate(self) -> Predicate {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::True => write!(f, "TRUEPREDICATE"),
            Predicate::False => write!(f, "FALSEPREDICATE"),
            Predicate::Compare {
                key_path,
                op,
                value,
            } => write!(f, "{} {} {}", key_path, op.as_str(), value),
            Predicate::And(parts) => write_joined(f, parts, " AND "),
            Predicate::Or(parts) => write_joined(f, parts, " OR "),
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}

/// Look up a dot-separated key path such as `"address.city"`.
pub fn resolve_key_path<'a>(data: &'a Value, key_path: &str) -> Option<&'a Value> {
    key_path
        .split('.')
        .try_fold(data, |current, key| current.as_object()?.get(key))
}

fn compare(lhs: &Value, op: ComparisonOp, rhs: &Value) -> bool {
    match op {
        ComparisonOp::Equal => values_equal(lhs, rhs),
        ComparisonOp::NotEqual => !values_equal(lhs, rhs),
        ComparisonOp::LessThan => partial_order(lhs, rhs) == Some(Ordering::Less),
        ComparisonOp::LessThanOrEqual => matches!(
            partial_order(lhs, rhs),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOp::GreaterThan => partial_order(lhs, rhs) == Some(Ordering::Greater),
        ComparisonOp::GreaterThanOrEqual => matches!(
            partial_order(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOp::In => rhs
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(lhs, item))),
        ComparisonOp::Contains => match (lhs, rhs) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
            _ => false,
        },
    }
}

// Numbers compare by value so that 1 == 1.0.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

/// Ordering between two values of the same kind; `None` across kinds.
fn partial_order(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values for sorting.
///
/// null < bool < number < string < array < object. Arrays compare
/// element-wise; objects compare by their serialized form.
pub fn total_order(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| total_order(x, y))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(_), Value::Object(_)) => lhs.to_string().cmp(&rhs.to_string()),
        _ => partial_order(lhs, rhs)
            .unwrap_or_else(|| kind_rank(lhs).cmp(&kind_rank(rhs))),
    }
}
