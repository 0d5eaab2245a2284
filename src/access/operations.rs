//! Operation families
//!
//! Each family has one canonical sync method and one async method taking
//! its argument struct and optional hooks. Convenience and model-typed
//! helpers build the argument struct and call the canonical method.

use std::collections::BTreeMap;
use std::mem;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::args::{
    AggregateArgs, DeleteArgs, ExecuteArgs, ExistsArgs, ImportArgs, IncrementArgs, InsertArgs,
    SelectArgs, UpdateArgs, UpsertArgs,
};
use super::cancel::Cancellation;
use super::context::{
    AggregateContext, DeleteContext, ExecuteContext, ExistContext, ImportContext,
    IncrementContext, InsertContext, OperationKind, SelectContext, UpdateContext, UpsertContext,
};
use super::data_access::DataAccess;
use super::hooks::Hooks;
use crate::criteria::{Condition, Paging};
use crate::errors::{DataAccessError, DataResult};
use crate::naming::Model;

/// Output parameters written by a stored operation
pub type OutputParameters = BTreeMap<String, Value>;

fn to_models<T: DeserializeOwned>(rows: Vec<Value>) -> DataResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DataAccessError::from))
        .collect()
}

fn to_value<T: Serialize>(item: &T) -> DataResult<Value> {
    Ok(serde_json::to_value(item)?)
}

impl DataAccess {
    // ==================
    // Execute
    // ==================

    fn prepare_execute(&self, args: ExecuteArgs, is_scalar: bool) -> DataResult<ExecuteContext> {
        Self::validate_name(&args.name)?;
        self.driver().create_execute_context(args, is_scalar)
    }

    /// Run a stored operation returning rows
    pub fn execute(&self, args: ExecuteArgs, hooks: Hooks<'_, ExecuteContext>) -> DataResult<Vec<Value>> {
        Ok(self.execute_with_parameters(args, hooks)?.0)
    }

    /// Rows plus the output parameters
    pub fn execute_with_parameters(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
    ) -> DataResult<(Vec<Value>, OutputParameters)> {
        let context = self.prepare_execute(args, false)?;
        self.run(context, hooks, |context| {
            (context.rows(), mem::take(&mut context.output_parameters))
        })
    }

    /// Run a stored operation returning one value
    pub fn execute_scalar(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
    ) -> DataResult<Option<Value>> {
        Ok(self.execute_scalar_with_parameters(args, hooks)?.0)
    }

    pub fn execute_scalar_with_parameters(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
    ) -> DataResult<(Option<Value>, OutputParameters)> {
        let context = self.prepare_execute(args, true)?;
        self.run(context, hooks, |context| {
            (context.result.take(), mem::take(&mut context.output_parameters))
        })
    }

    pub async fn execute_async(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
        cancel: &Cancellation,
    ) -> DataResult<Vec<Value>> {
        Ok(self.execute_with_parameters_async(args, hooks, cancel).await?.0)
    }

    pub async fn execute_with_parameters_async(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
        cancel: &Cancellation,
    ) -> DataResult<(Vec<Value>, OutputParameters)> {
        let context = self.prepare_execute(args, false)?;
        self.run_async(context, hooks, cancel, |context| {
            (context.rows(), mem::take(&mut context.output_parameters))
        })
        .await
    }

    pub async fn execute_scalar_async(
        &self,
        args: ExecuteArgs,
        hooks: Hooks<'_, ExecuteContext>,
        cancel: &Cancellation,
    ) -> DataResult<Option<Value>> {
        let context = self.prepare_execute(args, true)?;
        self.run_async(context, hooks, cancel, |context| context.result.take())
            .await
    }

    // ==================
    // Exists
    // ==================

    fn prepare_exists(&self, args: ExistsArgs) -> DataResult<ExistContext> {
        Self::validate_name(&args.name)?;
        self.driver().create_exist_context(args)
    }

    pub fn exists(&self, args: ExistsArgs, hooks: Hooks<'_, ExistContext>) -> DataResult<bool> {
        let context = self.prepare_exists(args)?;
        self.run(context, hooks, |context| context.result)
    }

    pub async fn exists_async(
        &self,
        args: ExistsArgs,
        hooks: Hooks<'_, ExistContext>,
        cancel: &Cancellation,
    ) -> DataResult<bool> {
        let context = self.prepare_exists(args)?;
        self.run_async(context, hooks, cancel, |context| context.result)
            .await
    }

    // ==================
    // Aggregate
    // ==================

    fn prepare_aggregate(&self, args: AggregateArgs) -> DataResult<AggregateContext> {
        Self::validate_name(&args.name)?;
        self.driver().create_aggregate_context(args)
    }

    /// Raw aggregate value; `None` when no row contributed
    pub fn aggregate(
        &self,
        args: AggregateArgs,
        hooks: Hooks<'_, AggregateContext>,
    ) -> DataResult<Option<Value>> {
        let context = self.prepare_aggregate(args)?;
        self.run(context, hooks, |context| context.result.take())
    }

    /// Aggregate converted to the caller's numeric type
    pub fn aggregate_as<T: DeserializeOwned>(
        &self,
        args: AggregateArgs,
        hooks: Hooks<'_, AggregateContext>,
    ) -> DataResult<Option<T>> {
        match self.aggregate(args, hooks)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    pub async fn aggregate_async(
        &self,
        args: AggregateArgs,
        hooks: Hooks<'_, AggregateContext>,
        cancel: &Cancellation,
    ) -> DataResult<Option<Value>> {
        let context = self.prepare_aggregate(args)?;
        self.run_async(context, hooks, cancel, |context| context.result.take())
            .await
    }

    /// Number of matching rows, zero rather than null
    pub fn count(&self, name: &str, criteria: Option<Condition>) -> DataResult<u64> {
        let mut args = AggregateArgs::count(name);
        args.criteria = criteria;
        Ok(self.aggregate_as::<u64>(args, Hooks::none())?.unwrap_or(0))
    }

    pub async fn count_async(
        &self,
        name: &str,
        criteria: Option<Condition>,
        cancel: &Cancellation,
    ) -> DataResult<u64> {
        let mut args = AggregateArgs::count(name);
        args.criteria = criteria;
        match self.aggregate_async(args, Hooks::none(), cancel).await? {
            None | Some(Value::Null) => Ok(0),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    // ==================
    // Increment
    // ==================

    fn prepare_increment(&self, args: IncrementArgs) -> DataResult<IncrementContext> {
        Self::validate_name(&args.name)?;
        if args.member.trim().is_empty() {
            return Err(DataAccessError::invalid_argument("member must not be empty"));
        }
        self.driver().create_increment_context(args)
    }

    /// Add `interval` to one member; returns the new value
    pub fn increment(&self, args: IncrementArgs, hooks: Hooks<'_, IncrementContext>) -> DataResult<i64> {
        let context = self.prepare_increment(args)?;
        self.run(context, hooks, |context| context.result)
    }

    /// Increment with the interval negated
    pub fn decrement(&self, args: IncrementArgs, hooks: Hooks<'_, IncrementContext>) -> DataResult<i64> {
        self.increment(negate(args)?, hooks)
    }

    pub async fn increment_async(
        &self,
        args: IncrementArgs,
        hooks: Hooks<'_, IncrementContext>,
        cancel: &Cancellation,
    ) -> DataResult<i64> {
        let context = self.prepare_increment(args)?;
        self.run_async(context, hooks, cancel, |context| context.result)
            .await
    }

    pub async fn decrement_async(
        &self,
        args: IncrementArgs,
        hooks: Hooks<'_, IncrementContext>,
        cancel: &Cancellation,
    ) -> DataResult<i64> {
        self.increment_async(negate(args)?, hooks, cancel).await
    }

    // ==================
    // Import
    // ==================

    fn prepare_import(&self, args: ImportArgs) -> DataResult<Option<ImportContext>> {
        Self::validate_name(&args.name)?;
        if args.data.is_empty() {
            self.skip(OperationKind::Import, &args.name);
            return Ok(None);
        }
        self.driver().create_import_context(args).map(Some)
    }

    /// Bulk load; returns the number of rows loaded
    pub fn import(&self, args: ImportArgs, hooks: Hooks<'_, ImportContext>) -> DataResult<usize> {
        match self.prepare_import(args)? {
            Some(context) => self.run(context, hooks, |context| context.count),
            None => Ok(0),
        }
    }

    pub async fn import_async(
        &self,
        args: ImportArgs,
        hooks: Hooks<'_, ImportContext>,
        cancel: &Cancellation,
    ) -> DataResult<usize> {
        match self.prepare_import(args)? {
            Some(context) => {
                self.run_async(context, hooks, cancel, |context| context.count)
                    .await
            }
            None => Ok(0),
        }
    }

    // ==================
    // Delete
    // ==================

    fn prepare_delete(&self, mut args: DeleteArgs) -> DataResult<DeleteContext> {
        Self::validate_name(&args.name)?;
        let schema = self.resolve_schema(&args.name, mem::take(&mut args.schema), None)?;
        self.driver().create_delete_context(args, schema)
    }

    /// Returns the number of rows deleted
    pub fn delete(&self, args: DeleteArgs, hooks: Hooks<'_, DeleteContext>) -> DataResult<usize> {
        let context = self.prepare_delete(args)?;
        self.run(context, hooks, |context| context.count)
    }

    pub async fn delete_async(
        &self,
        args: DeleteArgs,
        hooks: Hooks<'_, DeleteContext>,
        cancel: &Cancellation,
    ) -> DataResult<usize> {
        let context = self.prepare_delete(args)?;
        self.run_async(context, hooks, cancel, |context| context.count)
            .await
    }

    // ==================
    // Insert
    // ==================

    fn prepare_insert(&self, mut args: InsertArgs) -> DataResult<Option<InsertContext>> {
        Self::validate_name(&args.name)?;
        if args.data.is_empty() {
            self.skip(OperationKind::Insert, &args.name);
            return Ok(None);
        }
        let schema = self.resolve_schema(&args.name, mem::take(&mut args.schema), args.target.as_deref())?;
        self.driver().create_insert_context(args, schema).map(Some)
    }

    /// Returns the number of rows inserted; an empty payload returns 0
    pub fn insert(&self, args: InsertArgs, hooks: Hooks<'_, InsertContext>) -> DataResult<usize> {
        match self.prepare_insert(args)? {
            Some(context) => self.run(context, hooks, |context| context.count),
            None => Ok(0),
        }
    }

    pub async fn insert_async(
        &self,
        args: InsertArgs,
        hooks: Hooks<'_, InsertContext>,
        cancel: &Cancellation,
    ) -> DataResult<usize> {
        match self.prepare_insert(args)? {
            Some(context) => {
                self.run_async(context, hooks, cancel, |context| context.count)
                    .await
            }
            None => Ok(0),
        }
    }

    pub fn insert_one(&self, name: &str, data: Value) -> DataResult<usize> {
        self.insert(InsertArgs::one(name, data), Hooks::none())
    }

    pub fn insert_many(&self, name: &str, items: Vec<Value>) -> DataResult<usize> {
        self.insert(InsertArgs::many(name, items), Hooks::none())
    }

    // ==================
    // Upsert
    // ==================

    fn prepare_upsert(&self, mut args: UpsertArgs) -> DataResult<Option<UpsertContext>> {
        Self::validate_name(&args.name)?;
        if args.data.is_empty() {
            self.skip(OperationKind::Upsert, &args.name);
            return Ok(None);
        }
        let schema = self.resolve_schema(&args.name, mem::take(&mut args.schema), args.target.as_deref())?;
        self.driver().create_upsert_context(args, schema).map(Some)
    }

    /// Insert or update; returns the number of rows written
    pub fn upsert(&self, args: UpsertArgs, hooks: Hooks<'_, UpsertContext>) -> DataResult<usize> {
        match self.prepare_upsert(args)? {
            Some(context) => self.run(context, hooks, |context| context.count),
            None => Ok(0),
        }
    }

    pub async fn upsert_async(
        &self,
        args: UpsertArgs,
        hooks: Hooks<'_, UpsertContext>,
        cancel: &Cancellation,
    ) -> DataResult<usize> {
        match self.prepare_upsert(args)? {
            Some(context) => {
                self.run_async(context, hooks, cancel, |context| context.count)
                    .await
            }
            None => Ok(0),
        }
    }

    pub fn upsert_one(&self, name: &str, data: Value) -> DataResult<usize> {
        self.upsert(UpsertArgs::one(name, data), Hooks::none())
    }

    pub fn upsert_many(&self, name: &str, items: Vec<Value>) -> DataResult<usize> {
        self.upsert(UpsertArgs::many(name, items), Hooks::none())
    }

    // ==================
    // Update
    // ==================

    fn prepare_update(&self, mut args: UpdateArgs) -> DataResult<Option<UpdateContext>> {
        Self::validate_name(&args.name)?;
        if args.data.is_empty() {
            self.skip(OperationKind::Update, &args.name);
            return Ok(None);
        }
        let schema = self.resolve_schema(&args.name, mem::take(&mut args.schema), args.target.as_deref())?;
        self.driver().create_update_context(args, schema).map(Some)
    }

    /// Returns the number of rows updated; an empty payload returns 0
    pub fn update(&self, args: UpdateArgs, hooks: Hooks<'_, UpdateContext>) -> DataResult<usize> {
        match self.prepare_update(args)? {
            Some(context) => self.run(context, hooks, |context| context.count),
            None => Ok(0),
        }
    }

    pub async fn update_async(
        &self,
        args: UpdateArgs,
        hooks: Hooks<'_, UpdateContext>,
        cancel: &Cancellation,
    ) -> DataResult<usize> {
        match self.prepare_update(args)? {
            Some(context) => {
                self.run_async(context, hooks, cancel, |context| context.count)
                    .await
            }
            None => Ok(0),
        }
    }

    // ==================
    // Select
    // ==================

    fn prepare_select(&self, mut args: SelectArgs) -> DataResult<SelectContext> {
        Self::validate_name(&args.name)?;
        let target = args.entity.clone();
        let schema = self.resolve_schema(&args.name, mem::take(&mut args.schema), target.as_deref())?;
        self.driver().create_select_context(args, schema)
    }

    /// Plain or grouped query
    pub fn select(&self, args: SelectArgs, hooks: Hooks<'_, SelectContext>) -> DataResult<Vec<Value>> {
        let context = self.prepare_select(args)?;
        self.run(context, hooks, |context| mem::take(&mut context.result))
    }

    /// Rows plus the paging with its total filled in by the driver
    pub fn select_paged(
        &self,
        args: SelectArgs,
        hooks: Hooks<'_, SelectContext>,
    ) -> DataResult<(Vec<Value>, Option<Paging>)> {
        let context = self.prepare_select(args)?;
        self.run(context, hooks, |context| {
            (mem::take(&mut context.result), context.paging)
        })
    }

    pub async fn select_async(
        &self,
        args: SelectArgs,
        hooks: Hooks<'_, SelectContext>,
        cancel: &Cancellation,
    ) -> DataResult<Vec<Value>> {
        let context = self.prepare_select(args)?;
        self.run_async(context, hooks, cancel, |context| mem::take(&mut context.result))
            .await
    }

    // ==================
    // Models
    // ==================

    pub fn insert_model<T: Model + Serialize>(&self, item: &T) -> DataResult<usize> {
        let args = InsertArgs::one(self.name_of::<T>()?, to_value(item)?).target(T::NAME);
        self.insert(args, Hooks::none())
    }

    pub fn insert_models<T: Model + Serialize>(&self, items: &[T]) -> DataResult<usize> {
        let rows = items.iter().map(to_value).collect::<DataResult<Vec<_>>>()?;
        let args = InsertArgs::many(self.name_of::<T>()?, rows).target(T::NAME);
        self.insert(args, Hooks::none())
    }

    pub fn upsert_model<T: Model + Serialize>(&self, item: &T) -> DataResult<usize> {
        let args = UpsertArgs::one(self.name_of::<T>()?, to_value(item)?).target(T::NAME);
        self.upsert(args, Hooks::none())
    }

    pub fn update_model<T: Model + Serialize>(
        &self,
        item: &T,
        criteria: Option<Condition>,
    ) -> DataResult<usize> {
        let mut args = UpdateArgs::one(self.name_of::<T>()?, to_value(item)?).target(T::NAME);
        args.criteria = criteria;
        self.update(args, Hooks::none())
    }

    pub fn delete_model<T: Model>(&self, criteria: Option<Condition>) -> DataResult<usize> {
        let mut args = DeleteArgs::new(self.name_of::<T>()?);
        args.criteria = criteria;
        self.delete(args, Hooks::none())
    }

    pub fn exists_model<T: Model>(&self, criteria: Option<Condition>) -> DataResult<bool> {
        let mut args = ExistsArgs::new(self.name_of::<T>()?);
        args.criteria = criteria;
        self.exists(args, Hooks::none())
    }

    pub fn count_model<T: Model>(&self, criteria: Option<Condition>) -> DataResult<u64> {
        self.count(&self.name_of::<T>()?, criteria)
    }

    /// Select rows of `T`; `args.name` and `args.entity` are set from the model
    pub fn select_model<T: Model + DeserializeOwned>(&self, mut args: SelectArgs) -> DataResult<Vec<T>> {
        args.name = self.name_of::<T>()?;
        args.entity = Some(T::NAME.to_string());
        to_models(self.select(args, Hooks::none())?)
    }

    pub async fn select_model_async<T: Model + DeserializeOwned>(
        &self,
        mut args: SelectArgs,
        cancel: &Cancellation,
    ) -> DataResult<Vec<T>> {
        args.name = self.name_of::<T>()?;
        args.entity = Some(T::NAME.to_string());
        to_models(self.select_async(args, Hooks::none(), cancel).await?)
    }
}

fn negate(args: IncrementArgs) -> DataResult<IncrementArgs> {
    let interval = args.interval.checked_neg().ok_or_else(|| {
        DataAccessError::invalid_argument(format!("interval {} cannot be negated", args.interval))
    })?;
    Ok(IncrementArgs { interval, ..args })
}
