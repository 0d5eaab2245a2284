//! Schema projection over JSON rows

use serde_json::Value;

use super::store::Row;
use crate::schema::MemberSet;

/// Keep the members a schema selects; nested selections apply to
/// objects and to arrays of objects
pub fn project(row: &Row, members: &MemberSet) -> Row {
    let mut projected = Row::new();
    for (name, value) in row {
        if !members.includes(name) {
            continue;
        }
        let value = match members.get(name).and_then(|m| m.children.as_ref()) {
            Some(children) => project_value(value, children),
            None => value.clone(),
        };
        projected.insert(name.clone(), value);
    }
    projected
}

fn project_value(value: &Value, members: &MemberSet) -> Value {
    match value {
        Value::Object(object) => Value::Object(project(object, members)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| project_value(item, members))
                .collect(),
        ),
        other => other.clone(),
    }
}
