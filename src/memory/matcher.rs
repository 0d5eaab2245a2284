//! Condition evaluation and sorting over JSON rows
//!
//! No type coercion: a string never equals a number. Missing and null
//! members match nothing except `IsNull`.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::store::Row;
use crate::criteria::{Condition, Operator, Sorting};

/// Member value; dotted paths walk nested objects
pub fn lookup<'r>(row: &'r Row, path: &str) -> Option<&'r Value> {
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Checks a row against a condition; no condition matches everything
pub fn matches(row: &Row, condition: Option<&Condition>) -> bool {
    match condition {
        None => true,
        Some(condition) => evaluate(row, condition),
    }
}

fn evaluate(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Compare {
            field,
            operator,
            value,
        } => compare(lookup(row, field), *operator, value),
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(row, c)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(row, c)),
        Condition::Not { condition } => !evaluate(row, condition),
    }
}

fn compare(actual: Option<&Value>, operator: Operator, expected: &Value) -> bool {
    let actual = match actual {
        Some(value) if !value.is_null() => value,
        _ => return operator == Operator::IsNull,
    };

    match operator {
        Operator::IsNull => false,
        Operator::Equal => same(actual, expected),
        Operator::NotEqual => !same(actual, expected),
        Operator::GreaterThan => ordered(actual, expected) == Some(Ordering::Greater),
        Operator::GreaterThanEqual => matches!(
            ordered(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::LessThan => ordered(actual, expected) == Some(Ordering::Less),
        Operator::LessThanEqual => matches!(
            ordered(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Like => like(actual, expected),
        Operator::In => contains(expected, actual),
        Operator::NotIn => !contains(expected, actual),
        Operator::Between => match expected.as_array().map(Vec::as_slice) {
            Some([low, high]) => {
                matches!(ordered(actual, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(ordered(actual, high), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
    }
}

/// Equality; numbers compare by value so `1` equals `1.0`
fn same(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_)) => ordered(actual, expected) == Some(Ordering::Equal),
        _ => actual == expected,
    }
}

/// Ordering of comparable values of the same type
fn ordered(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return Some(ai.cmp(&bi));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(list: &Value, actual: &Value) -> bool {
    list.as_array()
        .map_or(false, |items| items.iter().any(|item| same(actual, item)))
}

/// SQL LIKE, case-insensitive: `%` any run, `_` one character
fn like(actual: &Value, pattern: &Value) -> bool {
    let (Value::String(text), Value::String(pattern)) = (actual, pattern) else {
        return false;
    };

    let mut expression = String::from("(?is)^");
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            other => expression.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expression.push('$');

    match Regex::new(&expression) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Stable multi-member sort
pub fn sort(rows: &mut [Row], sortings: &[Sorting]) {
    if sortings.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for sorting in sortings {
            let ordering = compare_values(lookup(a, &sorting.field), lookup(b, &sorting.field));
            let ordering = if sorting.is_descending() {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Total order for sorting and min/max: missing < null < bool < number < string
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let type_order = |v: &Value| -> u8 {
                match v {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Number(_) => 2,
                    Value::String(_) => 3,
                    Value::Array(_) => 4,
                    Value::Object(_) => 5,
                }
            };
            type_order(a)
                .cmp(&type_order(b))
                .then_with(|| ordered(a, b).unwrap_or(Ordering::Equal))
        }
    }
}
