//! Aggregates and grouping over JSON rows

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::matcher::{compare_values, lookup, matches};
use super::store::Row;
use crate::criteria::{AggregateFunction, DataAggregate, Grouping};
use crate::errors::{DataAccessError, DataResult};

/// Compute one aggregate
///
/// Null and missing values are skipped. Over no values `Count` is 0 and
/// every other function is null.
pub fn compute(rows: &[&Row], aggregate: &DataAggregate) -> DataResult<Value> {
    let mut values: Vec<&Value> = match &aggregate.member {
        Some(member) => rows
            .iter()
            .filter_map(|row| lookup(row, member))
            .filter(|value| !value.is_null())
            .collect(),
        None if aggregate.function == AggregateFunction::Count => {
            return Ok(Value::from(rows.len()));
        }
        None => {
            return Err(DataAccessError::invalid_argument(format!(
                "{} requires a member",
                aggregate.function
            )))
        }
    };

    if aggregate.distinct {
        let mut unique: Vec<&Value> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        values = unique;
    }

    match aggregate.function {
        AggregateFunction::Count => Ok(Value::from(values.len())),
        _ if values.is_empty() => Ok(Value::Null),
        AggregateFunction::Sum => sum(&values, aggregate),
        AggregateFunction::Average => {
            let total = numbers(&values, aggregate)?.iter().sum::<f64>();
            Ok(float(total / values.len() as f64))
        }
        AggregateFunction::Maximum => Ok(extreme(&values, Ordering::Greater)),
        AggregateFunction::Minimum => Ok(extreme(&values, Ordering::Less)),
    }
}

fn sum(values: &[&Value], aggregate: &DataAggregate) -> DataResult<Value> {
    let integers: Option<Vec<i64>> = values.iter().map(|v| v.as_i64()).collect();
    if let Some(integers) = integers {
        let total = integers.iter().try_fold(0i64, |acc, v| acc.checked_add(*v));
        if let Some(total) = total {
            return Ok(Value::from(total));
        }
    }
    Ok(float(numbers(values, aggregate)?.iter().sum()))
}

fn numbers(values: &[&Value], aggregate: &DataAggregate) -> DataResult<Vec<f64>> {
    values
        .iter()
        .map(|value| {
            value.as_f64().ok_or_else(|| {
                DataAccessError::backend(
                    "memory",
                    format!("{} over non-numeric value {}", aggregate.output_name(), value),
                )
            })
        })
        .collect()
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn extreme(values: &[&Value], wanted: Ordering) -> Value {
    let mut best = values[0];
    for value in &values[1..] {
        if compare_values(Some(*value), Some(best)) == wanted {
            best = value;
        }
    }
    best.clone()
}

/// Group rows, compute each group's aggregates, then apply the HAVING filter
///
/// Groups keep the order their first row appeared in. Each output row holds
/// the key members plus one member per aggregate named by `output_name`.
pub fn group(rows: &[&Row], grouping: &Grouping) -> DataResult<Vec<Row>> {
    let mut groups: Vec<(Vec<Value>, Vec<&Row>)> = Vec::new();
    for &row in rows {
        let key: Vec<Value> = grouping
            .keys
            .iter()
            .map(|k| lookup(row, k).cloned().unwrap_or(Value::Null))
            .collect();
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    let mut output = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut group_row = Row::new();
        for (name, value) in grouping.keys.iter().zip(key) {
            group_row.insert(name.clone(), value);
        }
        for aggregate in &grouping.aggregates {
            group_row.insert(aggregate.output_name(), compute(&members, aggregate)?);
        }
        if matches(&group_row, grouping.filter.as_ref()) {
            output.push(group_row);
        }
    }
    Ok(output)
}
