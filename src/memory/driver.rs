//! In-memory driver
//!
//! Tables are named by the data access name of the operation. A table
//! with a key member rejects duplicate keys; on insert a missing key is
//! drawn from the driver's sequence, if one is attached.
//!
//! Every write is all-or-nothing: rows are validated and built first,
//! then applied under one table lock.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::aggregate::{compute, group};
use super::matcher::{matches, sort};
use super::projection::project;
use super::store::{MemoryStore, Row, Table};
use crate::access::{
    AggregateContext, Cancellation, DataDriver, DeleteContext, ExecuteContext, ExistContext,
    ImportContext, IncrementContext, InsertContext, SelectContext, UpdateContext, UpsertContext,
};
use crate::errors::{DataAccessError, DataResult};
use crate::schema::{ExpressionParser, MetadataContainer, Schema, SchemaParser};
use crate::sequence::Sequence;

/// Stored procedure: reads parameters, may write output parameters
pub type Procedure = Arc<
    dyn Fn(&MemoryStore, &BTreeMap<String, Value>, &mut BTreeMap<String, Value>) -> DataResult<Value>
        + Send
        + Sync,
>;

pub struct MemoryDriver {
    name: String,
    store: MemoryStore,
    procedures: RwLock<HashMap<String, Procedure>>,
    sequence: Option<Arc<dyn Sequence>>,
    metadata: Option<Arc<MetadataContainer>>,
    latency: Duration,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            store: MemoryStore::new(),
            procedures: RwLock::new(HashMap::new()),
            sequence: None,
            metadata: None,
            latency: Duration::ZERO,
        }
    }

    /// Declare `member` as the key of `table`
    pub fn with_key(self, table: &str, member: &str) -> DataResult<Self> {
        self.store.set_key(table, member)?;
        Ok(self)
    }

    /// Sequence used to fill missing keys on insert
    pub fn with_sequence(mut self, sequence: Arc<dyn Sequence>) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Metadata makes the schema parser strict
    pub fn with_metadata(mut self, metadata: Arc<MetadataContainer>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Simulated I/O delay for async operations; cancellation interrupts it
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn register_procedure<F>(&self, name: &str, procedure: F) -> DataResult<()>
    where
        F: Fn(&MemoryStore, &BTreeMap<String, Value>, &mut BTreeMap<String, Value>) -> DataResult<Value>
            + Send
            + Sync
            + 'static,
    {
        self.procedures
            .write()
            .map_err(|e| self.error(e.to_string()))?
            .insert(name.to_string(), Arc::new(procedure));
        Ok(())
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Snapshot of a table's rows as JSON values
    pub fn rows(&self, table: &str) -> DataResult<Vec<Value>> {
        Ok(self
            .store
            .rows(table)?
            .into_iter()
            .map(Value::Object)
            .collect())
    }

    fn error(&self, message: impl Into<String>) -> DataAccessError {
        DataAccessError::backend(&self.name, message)
    }

    /// Wait out the simulated latency unless the signal fires first
    async fn pause(&self, cancel: &Cancellation) -> DataResult<()> {
        cancel.check()?;
        if self.latency.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(DataAccessError::Cancelled),
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }

    /// Next key from the sequence, when the table needs one
    fn assign_key(&self, table: &Table, name: &str, row: &mut Row) -> DataResult<()> {
        let (Some(key), Some(sequence)) = (&table.key, &self.sequence) else {
            return Ok(());
        };
        if table.key_of(row).is_none() {
            row.insert(key.clone(), Value::from(sequence.increase(name, 1, 0)?));
        }
        Ok(())
    }

    /// Required key value of a row bound for a keyed operation
    fn required_key(&self, table: &Table, row: &Row) -> DataResult<Value> {
        let key = table
            .key
            .as_deref()
            .ok_or_else(|| self.error("table has no key member"))?;
        table
            .key_of(row)
            .cloned()
            .ok_or_else(|| DataAccessError::invalid_argument(format!("row is missing key member '{}'", key)))
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("name", &self.name)
            .field("strict", &self.metadata.is_some())
            .field("latency", &self.latency)
            .finish()
    }
}

fn to_row(value: &Value) -> DataResult<Row> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| DataAccessError::invalid_argument(format!("expected an object, got {}", value)))
}

fn shape(row: Row, schema: Option<&Schema>) -> Row {
    match schema {
        Some(schema) => project(&row, &schema.members),
        None => row,
    }
}

/// Projection that never drops the key member
fn shape_keyed(row: Row, schema: Option<&Schema>, key: Option<&str>) -> Row {
    let key_value = key.and_then(|k| row.get(k).cloned().map(|v| (k.to_string(), v)));
    let mut shaped = shape(row, schema);
    if let Some((key, value)) = key_value {
        shaped.insert(key, value);
    }
    shaped
}

fn merge(target: &mut Row, changes: Row) {
    for (member, value) in changes {
        target.insert(member, value);
    }
}

macro_rules! paced {
    ($method:ident, $sync:ident, $context:ty) => {
        fn $method<'a>(
            &'a self,
            context: &'a mut $context,
            cancel: &'a Cancellation,
        ) -> BoxFuture<'a, DataResult<()>> {
            Box::pin(async move {
                self.pause(cancel).await?;
                self.$sync(context)
            })
        }
    };
}

impl DataDriver for MemoryDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_schema(&self) -> DataResult<Arc<dyn SchemaParser>> {
        match &self.metadata {
            Some(metadata) => Ok(Arc::new(ExpressionParser::strict(Arc::clone(metadata))?)),
            None => Ok(Arc::new(ExpressionParser::new()?)),
        }
    }

    fn on_execute(&self, context: &mut ExecuteContext) -> DataResult<()> {
        let procedure = self
            .procedures
            .read()
            .map_err(|e| self.error(e.to_string()))?
            .get(context.base.name())
            .cloned()
            .ok_or_else(|| self.error(format!("unknown procedure '{}'", context.base.name())))?;

        let mut parameters = context.parameters.clone();
        for (key, value) in &context.options.parameters {
            parameters.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let value = procedure(&self.store, &parameters, &mut context.output_parameters)?;
        context.result = Some(if context.is_scalar {
            match value {
                Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
                other => other,
            }
        } else {
            value
        });
        Ok(())
    }

    fn on_exists(&self, context: &mut ExistContext) -> DataResult<()> {
        let criteria = context.criteria.as_ref();
        context.result = self
            .store
            .read(context.base.name(), |table| {
                table.rows.iter().any(|row| matches(row, criteria))
            })?;
        Ok(())
    }

    fn on_aggregate(&self, context: &mut AggregateContext) -> DataResult<()> {
        let criteria = context.criteria.as_ref();
        let aggregate = &context.aggregate;
        let value = self.store.read(context.base.name(), |table| {
            let rows: Vec<&Row> = table.rows.iter().filter(|row| matches(row, criteria)).collect();
            compute(&rows, aggregate)
        })??;
        context.result = Some(value);
        Ok(())
    }

    fn on_increment(&self, context: &mut IncrementContext) -> DataResult<()> {
        let member = context.member.clone();
        let interval = context.interval;
        let criteria = context.criteria.as_ref();
        let driver = &self.name;

        context.result = self.store.write(context.base.name(), |table| {
            let mut updates = Vec::new();
            for (index, row) in table.rows.iter().enumerate() {
                if !matches(row, criteria) {
                    continue;
                }
                let current = match row.get(&member) {
                    None | Some(Value::Null) => 0,
                    Some(value) => value.as_i64().ok_or_else(|| {
                        DataAccessError::backend(
                            driver,
                            format!("member '{}' is not an integer: {}", member, value),
                        )
                    })?,
                };
                let next = current.checked_add(interval).ok_or_else(|| {
                    DataAccessError::backend(driver, format!("member '{}' overflowed", member))
                })?;
                updates.push((index, next));
            }

            let mut last = 0;
            for (index, next) in updates {
                table.rows[index].insert(member.clone(), Value::from(next));
                last = next;
            }
            Ok(last)
        })?;
        Ok(())
    }

    fn on_import(&self, context: &mut ImportContext) -> DataResult<()> {
        let rows = context.data.iter().map(to_row).collect::<DataResult<Vec<Row>>>()?;

        let skip_conflicts = context.options.skip_conflicts;
        context.count = self.store.write(context.base.name(), |table| {
            let mut accepted: Vec<Row> = Vec::with_capacity(rows.len());
            for row in rows {
                if let Some(key) = table.key_of(&row) {
                    let taken = table.position(key).is_some()
                        || accepted.iter().any(|r| table.key_of(r) == Some(key));
                    if taken {
                        if skip_conflicts {
                            continue;
                        }
                        return Err(self.error(format!("duplicate key {}", key)));
                    }
                }
                accepted.push(row);
            }
            let count = accepted.len();
            table.rows.extend(accepted);
            Ok(count)
        })?;
        Ok(())
    }

    fn on_delete(&self, context: &mut DeleteContext) -> DataResult<()> {
        let criteria = context.criteria.as_ref();
        context.count = self.store.write(context.base.name(), |table| {
            let before = table.rows.len();
            table.rows.retain(|row| !matches(row, criteria));
            Ok(before - table.rows.len())
        })?;
        Ok(())
    }

    fn on_insert(&self, context: &mut InsertContext) -> DataResult<()> {
        let name = context.base.name().to_string();
        let schema = context.schema.as_ref();
        let suppress_sequence = context.options.suppress_sequence;
        let data = &mut context.data;

        context.count = self.store.write(&name, |table| {
            let mut rows: Vec<Row> = Vec::with_capacity(data.len());
            for item in data.iter() {
                let mut row = shape_keyed(to_row(item)?, schema, table.key.as_deref());
                if !suppress_sequence {
                    self.assign_key(table, &name, &mut row)?;
                }
                if let Some(key) = table.key_of(&row) {
                    let taken = table.position(key).is_some()
                        || rows.iter().any(|r| table.key_of(r) == Some(key));
                    if taken {
                        return Err(self.error(format!("duplicate key {}", key)));
                    }
                }
                rows.push(row);
            }

            // Hand generated keys back to the caller's payload
            for (item, row) in data.iter_mut().zip(&rows) {
                if let (Some(key), Value::Object(object)) = (&table.key, item) {
                    if let Some(value) = row.get(key) {
                        object.insert(key.clone(), value.clone());
                    }
                }
            }

            let count = rows.len();
            table.rows.extend(rows);
            Ok(count)
        })?;
        Ok(())
    }

    fn on_upsert(&self, context: &mut UpsertContext) -> DataResult<()> {
        let schema = context.schema.as_ref();
        let scope = context.scope.as_ref();
        let data = &context.data;

        context.count = self.store.write(context.base.name(), |table| {
            let mut changes: Vec<(Value, Row)> = Vec::with_capacity(data.len());
            for item in data {
                let row = to_row(item)?;
                let key = self.required_key(table, &row)?;
                if let Some(index) = table.position(&key) {
                    if !matches(&table.rows[index], scope) {
                        return Err(self.error(format!(
                            "key {} is held outside the operation scope",
                            key
                        )));
                    }
                }
                changes.push((key, shape_keyed(row, schema, table.key.as_deref())));
            }

            let count = changes.len();
            for (key, row) in changes {
                match table.position(&key) {
                    Some(index) => merge(&mut table.rows[index], row),
                    None => table.rows.push(row),
                }
            }
            Ok(count)
        })?;
        Ok(())
    }

    fn on_update(&self, context: &mut UpdateContext) -> DataResult<()> {
        let schema = context.schema.as_ref();
        let criteria = context.criteria.as_ref();
        let scope = context.scope.as_ref();
        let data = &context.data;

        context.count = self.store.write(context.base.name(), |table| {
            if criteria.is_some() {
                if data.len() != 1 {
                    return Err(DataAccessError::invalid_argument(
                        "update by criteria takes exactly one change set",
                    ));
                }
                let mut changes = shape(to_row(&data[0])?, schema);
                // Keys never change by criteria
                if let Some(key) = &table.key {
                    changes.remove(key);
                }
                let mut count = 0;
                for row in table.rows.iter_mut().filter(|row| matches(row, criteria)) {
                    merge(row, changes.clone());
                    count += 1;
                }
                return Ok(count);
            }

            let mut changes: Vec<(usize, Row)> = Vec::with_capacity(data.len());
            for item in data {
                let row = to_row(item)?;
                let key = self.required_key(table, &row)?;
                let Some(index) = table.position(&key) else {
                    continue;
                };
                if matches(&table.rows[index], scope) {
                    changes.push((index, shape_keyed(row, schema, table.key.as_deref())));
                }
            }

            let count = changes.len();
            for (index, row) in changes {
                merge(&mut table.rows[index], row);
            }
            Ok(count)
        })?;
        Ok(())
    }

    fn on_select(&self, context: &mut SelectContext) -> DataResult<()> {
        let criteria = context.criteria.as_ref();
        let mut rows: Vec<Row> = match &context.grouping {
            Some(grouping) => self.store.read(context.base.name(), |table| {
                let matched: Vec<&Row> = table.rows.iter().filter(|row| matches(row, criteria)).collect();
                group(&matched, grouping)
            })??,
            None => self.store.read(context.base.name(), |table| {
                table
                    .rows
                    .iter()
                    .filter(|row| matches(row, criteria))
                    .cloned()
                    .collect()
            })?,
        };

        sort(&mut rows, &context.sortings);

        if !context.is_grouped() {
            if let Some(schema) = &context.schema {
                rows = rows.iter().map(|row| project(row, &schema.members)).collect();
            }
            if context.options.distinct {
                let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
                for row in rows {
                    if !unique.contains(&row) {
                        unique.push(row);
                    }
                }
                rows = unique;
            }
        }

        if let Some(paging) = context.paging.as_mut() {
            paging.total = Some(rows.len() as u64);
            if paging.is_enabled() {
                rows = rows
                    .into_iter()
                    .skip(paging.offset())
                    .take(paging.size as usize)
                    .collect();
            }
        }

        context.result = rows.into_iter().map(Value::Object).collect();
        Ok(())
    }

    paced!(on_execute_async, on_execute, ExecuteContext);
    paced!(on_exists_async, on_exists, ExistContext);
    paced!(on_aggregate_async, on_aggregate, AggregateContext);
    paced!(on_increment_async, on_increment, IncrementContext);
    paced!(on_import_async, on_import, ImportContext);
    paced!(on_delete_async, on_delete, DeleteContext);
    paced!(on_insert_async, on_insert, InsertContext);
    paced!(on_upsert_async, on_upsert, UpsertContext);
    paced!(on_update_async, on_update, UpdateContext);
    paced!(on_select_async, on_select, SelectContext);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{
        AggregateArgs, DeleteArgs, ExecuteArgs, IncrementArgs, InsertArgs, SelectArgs,
        UpdateArgs, UpsertArgs,
    };
    use crate::criteria::{Condition, DataAggregate, Paging, Sorting};
    use crate::sequence::MemorySequence;
    use serde_json::json;

    fn driver() -> MemoryDriver {
        MemoryDriver::new()
            .with_key("users", "Id")
            .unwrap()
            .with_sequence(Arc::new(MemorySequence::new()))
    }

    fn insert(driver: &MemoryDriver, rows: Vec<Value>) -> usize {
        let mut context = InsertContext::new(InsertArgs::many("users", rows), None);
        driver.on_insert(&mut context).unwrap();
        context.count
    }

    fn seed(driver: &MemoryDriver) {
        insert(
            driver,
            vec![
                json!({"Name": "alice", "Age": 30, "Region": "east"}),
                json!({"Name": "bob", "Age": 20, "Region": "west"}),
                json!({"Name": "carol", "Age": 25, "Region": "east"}),
            ],
        );
    }

    // ==================== Writes ====================

    #[test]
    fn test_insert_assigns_sequence_keys() {
        let driver = driver();
        let mut context = InsertContext::new(InsertArgs::one("users", json!({"Name": "a"})), None);
        driver.on_insert(&mut context).unwrap();

        assert_eq!(context.count, 1);
        assert_eq!(context.data[0]["Id"], json!(1));
        assert_eq!(driver.rows("users").unwrap()[0]["Id"], json!(1));
    }

    #[test]
    fn test_insert_duplicate_key_is_atomic() {
        let driver = driver();
        insert(&driver, vec![json!({"Id": 7, "Name": "a"})]);

        let mut context = InsertContext::new(
            InsertArgs::many("users", vec![json!({"Id": 8}), json!({"Id": 7})]),
            None,
        );
        let err = driver.on_insert(&mut context).unwrap_err();
        assert_eq!(err.code(), "DATA_BACKEND");
        assert_eq!(driver.rows("users").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_rejects_non_object() {
        let driver = driver();
        let mut context = InsertContext::new(InsertArgs::one("users", json!(5)), None);
        assert_eq!(
            driver.on_insert(&mut context).unwrap_err().code(),
            "DATA_INVALID_ARGUMENT"
        );
    }

    #[test]
    fn test_upsert_merges_existing() {
        let driver = driver();
        insert(&driver, vec![json!({"Id": 1, "Name": "a", "Age": 3})]);

        let mut context = UpsertContext::new(
            UpsertArgs::many("users", vec![json!({"Id": 1, "Name": "b"}), json!({"Id": 2})]),
            None,
        );
        driver.on_upsert(&mut context).unwrap();

        let rows = driver.rows("users").unwrap();
        assert_eq!(context.count, 2);
        assert_eq!(rows[0], json!({"Id": 1, "Name": "b", "Age": 3}));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_update_by_criteria() {
        let driver = driver();
        seed(&driver);

        let mut context = UpdateContext::new(
            UpdateArgs::one("users", json!({"Region": "north"}))
                .criteria(Condition::equal("Region", "east")),
            None,
        );
        driver.on_update(&mut context).unwrap();

        assert_eq!(context.count, 2);
        let rows = driver.rows("users").unwrap();
        assert_eq!(rows.iter().filter(|r| r["Region"] == "north").count(), 2);
    }

    #[test]
    fn test_update_by_criteria_keeps_keys() {
        let driver = driver();
        seed(&driver);

        let mut context = UpdateContext::new(
            UpdateArgs::one("users", json!({"Id": 1, "Region": "north"}))
                .criteria(Condition::equal("Region", "east")),
            None,
        );
        driver.on_update(&mut context).unwrap();

        let ids: Vec<Value> = driver.rows("users").unwrap().iter().map(|r| r["Id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_update_by_key_outside_scope_is_untouched() {
        let driver = driver();
        insert(
            &driver,
            vec![json!({"Id": 1, "Owner": 7}), json!({"Id": 2, "Owner": 8})],
        );

        let mut context = UpdateContext::new(
            UpdateArgs::many(
                "users",
                vec![json!({"Id": 1, "Name": "x"}), json!({"Id": 2, "Name": "y"})],
            ),
            None,
        );
        context.scope = Some(Condition::equal("Owner", 7));
        driver.on_update(&mut context).unwrap();

        let rows = driver.rows("users").unwrap();
        assert_eq!(context.count, 1);
        assert_eq!(rows[0], json!({"Id": 1, "Owner": 7, "Name": "x"}));
        assert_eq!(rows[1], json!({"Id": 2, "Owner": 8}));
    }

    #[test]
    fn test_upsert_outside_scope_fails_whole_batch() {
        let driver = driver();
        insert(&driver, vec![json!({"Id": 2, "Owner": 8})]);

        let mut context = UpsertContext::new(
            UpsertArgs::many(
                "users",
                vec![json!({"Id": 1, "Owner": 7}), json!({"Id": 2, "Owner": 7})],
            ),
            None,
        );
        context.scope = Some(Condition::equal("Owner", 7));

        assert_eq!(driver.on_upsert(&mut context).unwrap_err().code(), "DATA_BACKEND");
        assert_eq!(driver.rows("users").unwrap(), vec![json!({"Id": 2, "Owner": 8})]);
    }

    #[test]
    fn test_update_by_key_respects_schema() {
        let driver = driver();
        seed(&driver);

        let schema = ExpressionParser::new()
            .unwrap()
            .parse("users", "Name", None)
            .unwrap();
        let mut context = UpdateContext::new(
            UpdateArgs::one("users", json!({"Id": 2, "Name": "robert", "Age": 99})),
            Some(schema),
        );
        driver.on_update(&mut context).unwrap();

        let rows = driver.rows("users").unwrap();
        assert_eq!(rows[1]["Name"], json!("robert"));
        assert_eq!(rows[1]["Age"], json!(20));
    }

    #[test]
    fn test_delete_and_increment() {
        let driver = driver();
        seed(&driver);

        let mut context = IncrementContext::new(
            IncrementArgs::new("users", "Age")
                .interval(-5)
                .criteria(Condition::equal("Name", "bob")),
        );
        driver.on_increment(&mut context).unwrap();
        assert_eq!(context.result, 15);

        let mut context =
            DeleteContext::new(DeleteArgs::new("users").criteria(Condition::less_than("Age", 26)), None);
        driver.on_delete(&mut context).unwrap();
        assert_eq!(context.count, 2);
    }

    #[test]
    fn test_increment_non_integer_fails() {
        let driver = driver();
        seed(&driver);
        let mut context = IncrementContext::new(IncrementArgs::new("users", "Name"));
        assert!(driver.on_increment(&mut context).is_err());
        assert_eq!(driver.rows("users").unwrap()[0]["Name"], json!("alice"));
    }

    // ==================== Reads ====================

    #[test]
    fn test_select_sort_and_page() {
        let driver = driver();
        seed(&driver);

        let mut context = SelectContext::new(
            SelectArgs::new("users")
                .sort(Sorting::descending("Age"))
                .paging(Paging::page(2, 2)),
            None,
        );
        driver.on_select(&mut context).unwrap();

        assert_eq!(context.result.len(), 1);
        assert_eq!(context.result[0]["Name"], json!("bob"));
        assert_eq!(context.paging.unwrap().total, Some(3));
    }

    #[test]
    fn test_select_grouped() {
        let driver = driver();
        seed(&driver);

        let grouping = crate::criteria::Grouping::by(["Region"]).aggregate(DataAggregate::count());
        let mut context = SelectContext::new(
            SelectArgs::new("users")
                .grouping(grouping)
                .sort(Sorting::ascending("Region")),
            None,
        );
        driver.on_select(&mut context).unwrap();

        assert_eq!(
            context.result,
            vec![
                json!({"Region": "east", "Count(*)": 2}),
                json!({"Region": "west", "Count(*)": 1}),
            ]
        );
    }

    #[test]
    fn test_aggregate_on_missing_table() {
        let driver = driver();
        let mut context = AggregateContext::new(AggregateArgs::count("nothing"));
        driver.on_aggregate(&mut context).unwrap();
        assert_eq!(context.result, Some(json!(0)));
    }

    #[test]
    fn test_execute_procedure() {
        let driver = driver();
        seed(&driver);
        driver
            .register_procedure("CountRegion", |store, params, outputs| {
                let region = params.get("region").cloned().unwrap_or(Value::Null);
                let rows = store.rows("users")?;
                let count = rows.iter().filter(|r| r.get("Region") == Some(&region)).count();
                outputs.insert("checked".to_string(), json!(rows.len()));
                Ok(json!([count]))
            })
            .unwrap();

        let mut context = ExecuteContext::new(
            ExecuteArgs::new("CountRegion").parameter("region", "east"),
            true,
        );
        driver.on_execute(&mut context).unwrap();
        assert_eq!(context.result, Some(json!(2)));
        assert_eq!(context.output_parameters["checked"], json!(3));

        let mut context = ExecuteContext::new(ExecuteArgs::new("Missing"), false);
        assert_eq!(driver.on_execute(&mut context).unwrap_err().code(), "DATA_BACKEND");
    }

    // ==================== Async ====================

    #[tokio::test]
    async fn test_latency_interrupted_by_cancel() {
        let driver = driver().with_latency(Duration::from_secs(30));
        let source = crate::access::CancellationSource::new();
        let token = source.token();
        let mut context = ExistContext::new(crate::access::ExistsArgs::new("users"));

        let task = driver.on_exists_async(&mut context, &token);
        source.cancel();
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
