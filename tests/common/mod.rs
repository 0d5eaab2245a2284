//! Shared fixtures for pipeline tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dataaccess::access::{
    AggregateArgs, AggregateContext, ContextMut, DataAccessFilter, DeleteArgs, DeleteContext,
    ExecuteArgs, ExecuteContext, ExistContext, ExistsArgs, ImportArgs, ImportContext,
    IncrementArgs, IncrementContext, InsertArgs, InsertContext, SelectArgs, SelectContext,
    UpdateArgs, UpdateContext, UpsertArgs, UpsertContext,
};
use dataaccess::errors::{DataAccessError, DataResult};
use dataaccess::schema::Schema;
use dataaccess::DataDriver;
use serde_json::{json, Value};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

pub fn push(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

/// Driver that records each call and returns canned results
pub struct SpyDriver {
    pub journal: Journal,
    pub fail: AtomicBool,
}

impl SpyDriver {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing(journal: Journal) -> Self {
        let driver = Self::new(journal);
        driver.fail.store(true, Ordering::SeqCst);
        driver
    }

    fn call(&self, operation: &str) -> DataResult<()> {
        push(&self.journal, format!("driver:{}", operation));
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataAccessError::backend("spy", "boom"));
        }
        Ok(())
    }

    fn track_dispose(&self) -> impl FnOnce() + Send + 'static {
        let journal = Arc::clone(&self.journal);
        move || push(&journal, "dispose")
    }
}

impl DataDriver for SpyDriver {
    fn name(&self) -> &str {
        "spy"
    }

    fn create_execute_context(&self, args: ExecuteArgs, is_scalar: bool) -> DataResult<ExecuteContext> {
        let mut context = ExecuteContext::new(args, is_scalar);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_exist_context(&self, args: ExistsArgs) -> DataResult<ExistContext> {
        let mut context = ExistContext::new(args);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_aggregate_context(&self, args: AggregateArgs) -> DataResult<AggregateContext> {
        let mut context = AggregateContext::new(args);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_increment_context(&self, args: IncrementArgs) -> DataResult<IncrementContext> {
        let mut context = IncrementContext::new(args);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_import_context(&self, args: ImportArgs) -> DataResult<ImportContext> {
        let mut context = ImportContext::new(args);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_delete_context(&self, args: DeleteArgs, schema: Option<Schema>) -> DataResult<DeleteContext> {
        let mut context = DeleteContext::new(args, schema);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_insert_context(&self, args: InsertArgs, schema: Option<Schema>) -> DataResult<InsertContext> {
        push(&self.journal, "factory:insert");
        let mut context = InsertContext::new(args, schema);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_upsert_context(&self, args: UpsertArgs, schema: Option<Schema>) -> DataResult<UpsertContext> {
        let mut context = UpsertContext::new(args, schema);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_update_context(&self, args: UpdateArgs, schema: Option<Schema>) -> DataResult<UpdateContext> {
        let mut context = UpdateContext::new(args, schema);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn create_select_context(&self, args: SelectArgs, schema: Option<Schema>) -> DataResult<SelectContext> {
        let mut context = SelectContext::new(args, schema);
        context.base.on_dispose(self.track_dispose());
        Ok(context)
    }

    fn on_execute(&self, context: &mut ExecuteContext) -> DataResult<()> {
        self.call("execute")?;
        context.result = Some(json!([{"ok": true}]));
        Ok(())
    }

    fn on_exists(&self, context: &mut ExistContext) -> DataResult<()> {
        self.call("exists")?;
        context.result = true;
        Ok(())
    }

    fn on_aggregate(&self, context: &mut AggregateContext) -> DataResult<()> {
        self.call("aggregate")?;
        context.result = Some(Value::Null);
        Ok(())
    }

    fn on_increment(&self, context: &mut IncrementContext) -> DataResult<()> {
        self.call("increment")?;
        context.result = 100 + context.interval;
        Ok(())
    }

    fn on_import(&self, context: &mut ImportContext) -> DataResult<()> {
        self.call("import")?;
        context.count = context.data.len();
        Ok(())
    }

    fn on_delete(&self, context: &mut DeleteContext) -> DataResult<()> {
        self.call("delete")?;
        context.count = 1;
        Ok(())
    }

    fn on_insert(&self, context: &mut InsertContext) -> DataResult<()> {
        self.call("insert")?;
        context.count = context.data.len();
        Ok(())
    }

    fn on_upsert(&self, context: &mut UpsertContext) -> DataResult<()> {
        self.call("upsert")?;
        context.count = context.data.len();
        Ok(())
    }

    fn on_update(&self, context: &mut UpdateContext) -> DataResult<()> {
        self.call("update")?;
        context.count = context.data.len();
        Ok(())
    }

    fn on_select(&self, context: &mut SelectContext) -> DataResult<()> {
        self.call("select")?;
        context.result = vec![json!({"Id": 1})];
        Ok(())
    }
}

/// Filter that records both passes under its name
pub struct SpyFilter {
    pub name: String,
    pub journal: Journal,
}

impl SpyFilter {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
        }
    }
}

impl DataAccessFilter for SpyFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_filtering(&self, context: &mut ContextMut<'_>) {
        push(&self.journal, format!("{}:filtering:{}", self.name, context.kind()));
    }

    fn on_filtered(&self, context: &mut ContextMut<'_>) {
        push(&self.journal, format!("{}:filtered:{}", self.name, context.kind()));
    }
}
