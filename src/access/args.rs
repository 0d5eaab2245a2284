//! Operation arguments
//!
//! One canonical argument struct per operation family. Builders cover the
//! common shapes; every field is public for the rest.

use std::collections::BTreeMap;

use serde_json::Value;

use super::options::{
    AggregateOptions, DeleteOptions, ExecuteOptions, ExistsOptions, ImportOptions,
    IncrementOptions, InsertOptions, SelectOptions, UpdateOptions, UpsertOptions,
};
use crate::criteria::{Condition, DataAggregate, Grouping, Paging, Sorting};
use crate::schema::Schema;

/// Schema requested by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SchemaSpec {
    /// No member projection
    #[default]
    None,
    /// Parsed by the data access instance's schema parser
    Expression(String),
    /// Already parsed
    Parsed(Schema),
}

impl SchemaSpec {
    pub fn is_none(&self) -> bool {
        matches!(self, SchemaSpec::None)
    }
}

impl From<&str> for SchemaSpec {
    fn from(expression: &str) -> Self {
        SchemaSpec::Expression(expression.to_string())
    }
}

impl From<String> for SchemaSpec {
    fn from(expression: String) -> Self {
        SchemaSpec::Expression(expression)
    }
}

impl From<Schema> for SchemaSpec {
    fn from(schema: Schema) -> Self {
        SchemaSpec::Parsed(schema)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecuteArgs {
    /// Name of the stored operation
    pub name: String,
    pub parameters: BTreeMap<String, Value>,
    pub options: ExecuteOptions,
}

impl ExecuteArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExistsArgs {
    pub name: String,
    pub criteria: Option<Condition>,
    pub options: ExistsOptions,
}

impl ExistsArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn options(mut self, options: ExistsOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AggregateArgs {
    pub name: String,
    pub aggregate: DataAggregate,
    pub criteria: Option<Condition>,
    pub options: AggregateOptions,
}

impl AggregateArgs {
    pub fn new(name: impl Into<String>, aggregate: DataAggregate) -> Self {
        Self {
            name: name.into(),
            aggregate,
            criteria: None,
            options: AggregateOptions::default(),
        }
    }

    /// Count every row
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, DataAggregate::count())
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn options(mut self, options: AggregateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct IncrementArgs {
    pub name: String,
    pub member: String,
    pub criteria: Option<Condition>,
    /// Defaults to 1
    pub interval: i64,
    pub options: IncrementOptions,
}

impl IncrementArgs {
    pub fn new(name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            member: member.into(),
            criteria: None,
            interval: 1,
            options: IncrementOptions::default(),
        }
    }

    pub fn interval(mut self, interval: i64) -> Self {
        self.interval = interval;
        self
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn options(mut self, options: IncrementOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    pub name: String,
    pub data: Vec<Value>,
    /// Empty imports every member
    pub members: Vec<String>,
    pub options: ImportOptions,
}

impl ImportArgs {
    pub fn new(name: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data,
            ..Self::default()
        }
    }

    pub fn members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteArgs {
    pub name: String,
    pub criteria: Option<Condition>,
    pub schema: SchemaSpec,
    pub options: DeleteOptions,
}

impl DeleteArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn schema(mut self, schema: impl Into<SchemaSpec>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn options(mut self, options: DeleteOptions) -> Self {
        self.options = options;
        self
    }
}

/// Arguments of insert and upsert
#[derive(Debug, Clone, Default)]
pub struct WriteArgs<O> {
    pub name: String,
    /// One item for single writes; empty skips the operation
    pub data: Vec<Value>,
    pub is_multiple: bool,
    pub schema: SchemaSpec,
    /// Payload type name the schema is parsed against
    pub target: Option<String>,
    pub options: O,
}

pub type InsertArgs = WriteArgs<InsertOptions>;
pub type UpsertArgs = WriteArgs<UpsertOptions>;

fn single(data: Value) -> Vec<Value> {
    if data.is_null() {
        Vec::new()
    } else {
        vec![data]
    }
}

impl<O: Default> WriteArgs<O> {
    /// Write one item; `null` is an empty payload
    pub fn one(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data: single(data),
            is_multiple: false,
            schema: SchemaSpec::None,
            target: None,
            options: O::default(),
        }
    }

    pub fn many(name: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data: items,
            is_multiple: true,
            schema: SchemaSpec::None,
            target: None,
            options: O::default(),
        }
    }

    pub fn schema(mut self, schema: impl Into<SchemaSpec>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn options(mut self, options: O) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub name: String,
    pub data: Vec<Value>,
    pub is_multiple: bool,
    pub criteria: Option<Condition>,
    pub schema: SchemaSpec,
    pub target: Option<String>,
    pub options: UpdateOptions,
}

impl UpdateArgs {
    /// Update with one item; `null` is an empty payload
    pub fn one(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data: single(data),
            ..Self::default()
        }
    }

    /// Update each item by its key
    pub fn many(name: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data: items,
            is_multiple: true,
            ..Self::default()
        }
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn schema(mut self, schema: impl Into<SchemaSpec>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectArgs {
    pub name: String,
    /// Type the rows are materialized as
    pub entity: Option<String>,
    pub criteria: Option<Condition>,
    pub grouping: Option<Grouping>,
    pub schema: SchemaSpec,
    pub paging: Option<Paging>,
    pub sortings: Vec<Sorting>,
    pub options: SelectOptions,
}

impl SelectArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn criteria(mut self, criteria: Condition) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn schema(mut self, schema: impl Into<SchemaSpec>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn paging(mut self, paging: Paging) -> Self {
        self.paging = Some(paging);
        self
    }

    pub fn sort(mut self, sorting: Sorting) -> Self {
        self.sortings.push(sorting);
        self
    }

    pub fn options(mut self, options: SelectOptions) -> Self {
        self.options = options;
        self
    }
}
