//! Driver contract
//!
//! A driver plugs one storage backend into the pipeline. It builds the
//! contexts, supplies the schema parser and performs the actual I/O.
//! Drivers fill the context's result slot and never raise pipeline events.
//!
//! Every `create_*_context` has a default that builds the plain context.
//! Every `on_*_async` defaults to checking the cancellation signal once and
//! running the sync method.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::args::{
    AggregateArgs, DeleteArgs, ExecuteArgs, ExistsArgs, ImportArgs, IncrementArgs, InsertArgs,
    SelectArgs, UpdateArgs, UpsertArgs,
};
use super::cancel::Cancellation;
use super::context::{
    AggregateContext, DeleteContext, ExecuteContext, ExistContext, ImportContext,
    IncrementContext, InsertContext, SelectContext, UpdateContext, UpsertContext,
};
use crate::errors::DataResult;
use crate::schema::{ExpressionParser, Schema, SchemaParser};

pub trait DataDriver: Send + Sync {
    /// Driver name, used in logs and backend errors
    fn name(&self) -> &str;

    /// Build the schema parser; called once per data access instance
    fn create_schema(&self) -> DataResult<Arc<dyn SchemaParser>> {
        Ok(Arc::new(ExpressionParser::new()?))
    }

    // Context factories

    fn create_execute_context(&self, args: ExecuteArgs, is_scalar: bool) -> DataResult<ExecuteContext> {
        Ok(ExecuteContext::new(args, is_scalar))
    }

    fn create_exist_context(&self, args: ExistsArgs) -> DataResult<ExistContext> {
        Ok(ExistContext::new(args))
    }

    fn create_aggregate_context(&self, args: AggregateArgs) -> DataResult<AggregateContext> {
        Ok(AggregateContext::new(args))
    }

    fn create_increment_context(&self, args: IncrementArgs) -> DataResult<IncrementContext> {
        Ok(IncrementContext::new(args))
    }

    fn create_import_context(&self, args: ImportArgs) -> DataResult<ImportContext> {
        Ok(ImportContext::new(args))
    }

    fn create_delete_context(&self, args: DeleteArgs, schema: Option<Schema>) -> DataResult<DeleteContext> {
        Ok(DeleteContext::new(args, schema))
    }

    fn create_insert_context(&self, args: InsertArgs, schema: Option<Schema>) -> DataResult<InsertContext> {
        Ok(InsertContext::new(args, schema))
    }

    fn create_upsert_context(&self, args: UpsertArgs, schema: Option<Schema>) -> DataResult<UpsertContext> {
        Ok(UpsertContext::new(args, schema))
    }

    fn create_update_context(&self, args: UpdateArgs, schema: Option<Schema>) -> DataResult<UpdateContext> {
        Ok(UpdateContext::new(args, schema))
    }

    fn create_select_context(&self, args: SelectArgs, schema: Option<Schema>) -> DataResult<SelectContext> {
        Ok(SelectContext::new(args, schema))
    }

    // Operations

    fn on_execute(&self, context: &mut ExecuteContext) -> DataResult<()>;

    fn on_exists(&self, context: &mut ExistContext) -> DataResult<()>;

    fn on_aggregate(&self, context: &mut AggregateContext) -> DataResult<()>;

    fn on_increment(&self, context: &mut IncrementContext) -> DataResult<()>;

    fn on_import(&self, context: &mut ImportContext) -> DataResult<()>;

    fn on_delete(&self, context: &mut DeleteContext) -> DataResult<()>;

    fn on_insert(&self, context: &mut InsertContext) -> DataResult<()>;

    fn on_upsert(&self, context: &mut UpsertContext) -> DataResult<()>;

    fn on_update(&self, context: &mut UpdateContext) -> DataResult<()>;

    fn on_select(&self, context: &mut SelectContext) -> DataResult<()>;

    // Async operations

    fn on_execute_async<'a>(
        &'a self,
        context: &'a mut ExecuteContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_execute(context)
        })
    }

    fn on_exists_async<'a>(
        &'a self,
        context: &'a mut ExistContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_exists(context)
        })
    }

    fn on_aggregate_async<'a>(
        &'a self,
        context: &'a mut AggregateContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_aggregate(context)
        })
    }

    fn on_increment_async<'a>(
        &'a self,
        context: &'a mut IncrementContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_increment(context)
        })
    }

    fn on_import_async<'a>(
        &'a self,
        context: &'a mut ImportContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_import(context)
        })
    }

    fn on_delete_async<'a>(
        &'a self,
        context: &'a mut DeleteContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_delete(context)
        })
    }

    fn on_insert_async<'a>(
        &'a self,
        context: &'a mut InsertContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_insert(context)
        })
    }

    fn on_upsert_async<'a>(
        &'a self,
        context: &'a mut UpsertContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_upsert(context)
        })
    }

    fn on_update_async<'a>(
        &'a self,
        context: &'a mut UpdateContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_update(context)
        })
    }

    fn on_select_async<'a>(
        &'a self,
        context: &'a mut SelectContext,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.on_select(context)
        })
    }
}
