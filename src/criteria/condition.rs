//! Conditions
//!
//! Backend-neutral filter expressions carried by criteria-based operations.
//! Drivers translate them; the memory driver evaluates them directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    /// SQL-style pattern: `%` any run, `_` one character
    Like,
    /// Value must be an array
    In,
    NotIn,
    /// Value must be a two element array `[low, high]`, inclusive
    Between,
    /// Value is ignored
    IsNull,
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        field: String,
        operator: Operator,
        value: Value,
    },
    And {
        conditions: Vec<Condition>,
    },
    Or {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Build a comparison
    pub fn compare(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::Equal, value)
    }

    pub fn not_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::NotEqual, value)
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::GreaterThan, value)
    }

    pub fn greater_than_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::GreaterThanEqual, value)
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::LessThan, value)
    }

    pub fn less_than_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::LessThanEqual, value)
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(field, Operator::Like, Value::String(pattern.into()))
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::compare(field, Operator::In, Value::Array(values))
    }

    pub fn not_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::compare(field, Operator::NotIn, Value::Array(values))
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::compare(
            field,
            Operator::Between,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::compare(field, Operator::IsNull, Value::Null)
    }

    /// Conjunction; nested `And`s are flattened
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::And { mut conditions } => {
                conditions.push(other);
                Self::And { conditions }
            }
            first => Self::And {
                conditions: vec![first, other],
            },
        }
    }

    /// Disjunction; nested `Or`s are flattened
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Or { mut conditions } => {
                conditions.push(other);
                Self::Or { conditions }
            }
            first => Self::Or {
                conditions: vec![first, other],
            },
        }
    }

    /// Negation
    pub fn negate(self) -> Self {
        Self::Not {
            condition: Box::new(self),
        }
    }

    /// AND `extra` onto optional existing criteria
    pub fn combine(criteria: Option<Condition>, extra: Condition) -> Condition {
        match criteria {
            Some(existing) => existing.and(extra),
            None => extra,
        }
    }

    /// Every member name referenced by this condition, in visit order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { field, .. } => out.push(field),
            Self::And { conditions } | Self::Or { conditions } => {
                for condition in conditions {
                    condition.collect_fields(out);
                }
            }
            Self::Not { condition } => condition.collect_fields(out),
        }
    }
}
