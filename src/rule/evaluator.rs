//! Rule evaluator

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::BuildHasher;

use serde_json::{Map, Number, Value};

use crate::error::EvaluationError;
use crate::rule::ast::{Comparator, LogicalOp, Node};

/// Field lookup for the data a rule is evaluated against
pub trait Record {
    fn field(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Literal side of a comparison after quote stripping and coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal<'a> {
    Integer(i64),
    Text(&'a str),
}

impl<'a> Literal<'a> {
    /// Strip one matching pair of quotes, then coerce all-digit text to an integer.
    ///
    /// Negative numbers and decimals stay text.
    pub fn from_raw(raw: &'a str) -> Self {
        let text = strip_quotes(raw);
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = text.parse::<i64>() {
                return Literal::Integer(n);
            }
        }
        Literal::Text(text)
    }

    fn kind(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Text(_) => "string",
        }
    }
}

/// Evaluate an AST against a record.
///
/// Both sides of an operator are evaluated, so a missing field is reported
/// even when the other side already decides the result.
pub fn evaluate<R: Record + ?Sized>(node: &Node, record: &R) -> Result<bool, EvaluationError> {
    match node {
        Node::Operand { condition } => evaluate_condition(condition, record),
        Node::Operator { op, left, right } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            Ok(match op {
                LogicalOp::And => left && right,
                LogicalOp::Or => left || right,
            })
        }
    }
}

/// Evaluate a single `"<field> <comparator> <value>"` condition
pub fn evaluate_condition<R: Record + ?Sized>(
    condition: &str,
    record: &R,
) -> Result<bool, EvaluationError> {
    let (field, symbol, raw) = split_condition(condition)
        .ok_or_else(|| EvaluationError::MalformedCondition(condition.to_string()))?;

    let actual = record
        .field(field)
        .ok_or_else(|| EvaluationError::FieldNotFound(field.to_string()))?;

    let comparator = Comparator::from_symbol(symbol)
        .ok_or_else(|| EvaluationError::UnsupportedComparator(symbol.to_string()))?;

    compare(field, comparator, actual, Literal::from_raw(raw))
}

/// Split on the first two whitespace runs; the literal keeps any inner spaces.
fn split_condition(condition: &str) -> Option<(&str, &str, &str)> {
    let (field, rest) = condition.trim().split_once(char::is_whitespace)?;
    let (comparator, literal) = rest.trim_start().split_once(char::is_whitespace)?;
    let literal = literal.trim();
    if literal.is_empty() {
        return None;
    }
    Some((field, comparator, literal))
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn compare(
    field: &str,
    comparator: Comparator,
    actual: &Value,
    expected: Literal<'_>,
) -> Result<bool, EvaluationError> {
    let ordering = match (actual, expected) {
        (Value::Number(n), Literal::Integer(i)) => Some(compare_number(n, i)),
        (Value::String(s), Literal::Text(t)) => Some(s.as_str().cmp(t)),
        _ => None,
    };

    match (comparator, ordering) {
        (Comparator::Equal, ord) => Ok(ord == Some(Ordering::Equal)),
        (Comparator::NotEqual, ord) => Ok(ord != Some(Ordering::Equal)),
        (Comparator::Greater, Some(ord)) => Ok(ord.is_gt()),
        (Comparator::Less, Some(ord)) => Ok(ord.is_lt()),
        (Comparator::GreaterEqual, Some(ord)) => Ok(ord.is_ge()),
        (Comparator::LessEqual, Some(ord)) => Ok(ord.is_le()),
        (_, None) => Err(EvaluationError::IncompatibleTypes {
            field: field.to_string(),
            comparator: comparator.to_string(),
            actual: value_kind(actual),
            expected: expected.kind(),
        }),
    }
}

fn compare_number(n: &Number, expected: i64) -> Ordering {
    if let Some(i) = n.as_i64() {
        i.cmp(&expected)
    } else if n.is_u64() {
        // only u64 values above i64::MAX reach here
        Ordering::Greater
    } else {
        n.as_f64()
            .and_then(|f| f.partial_cmp(&(expected as f64)))
            .unwrap_or(Ordering::Less)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
