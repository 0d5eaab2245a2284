//! Operation Contexts
//!
//! One context per call. It carries the operation inputs, the resolved
//! schema, the options and a result slot that the driver fills in.
//! A context lives for exactly one pipeline pass and is disposed once.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Instant;

use futures_util::future::BoxFuture;
use serde_json::Value;
use uuid::Uuid;

use super::args::{
    AggregateArgs, DeleteArgs, ExecuteArgs, ExistsArgs, ImportArgs, IncrementArgs, InsertArgs,
    SelectArgs, UpdateArgs, UpsertArgs,
};
use super::cancel::Cancellation;
use super::driver::DataDriver;
use super::events::{EventHandlers, Events};
use super::filter::ContextMut;
use super::options::{
    AggregateOptions, DeleteOptions, ExecuteOptions, ExistsOptions, ImportOptions,
    IncrementOptions, InsertOptions, SelectOptions, UpdateOptions, UpsertOptions,
};
use crate::criteria::{Condition, DataAggregate, Grouping, Paging, Sorting};
use crate::errors::DataResult;
use crate::schema::Schema;

/// Operation families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Execute,
    Exists,
    Aggregate,
    Increment,
    Import,
    Delete,
    Insert,
    Upsert,
    Update,
    Select,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Execute => "execute",
            OperationKind::Exists => "exists",
            OperationKind::Aggregate => "aggregate",
            OperationKind::Increment => "increment",
            OperationKind::Import => "import",
            OperationKind::Delete => "delete",
            OperationKind::Insert => "insert",
            OperationKind::Upsert => "upsert",
            OperationKind::Update => "update",
            OperationKind::Select => "select",
        }
    }

    /// Operations that write a payload
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            OperationKind::Import
                | OperationKind::Insert
                | OperationKind::Upsert
                | OperationKind::Update
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Disposer = Box<dyn FnOnce() + Send>;

/// Fields shared by every context
pub struct ContextBase {
    id: Uuid,
    kind: OperationKind,
    name: String,
    started_at: Instant,
    /// Free-form values shared between hooks, filters and the driver
    pub states: HashMap<String, Value>,
    disposers: Vec<Disposer>,
    disposed: bool,
}

impl ContextBase {
    pub fn new(kind: OperationKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            started_at: Instant::now(),
            states: HashMap::new(),
            disposers: Vec::new(),
            disposed: false,
        }
    }

    /// Unique id of this pass, used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Storage name the operation targets
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    pub fn state(&self, key: &str) -> Option<&Value> {
        self.states.get(key)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.states.insert(key.into(), value);
    }

    /// Register cleanup to run when the context is disposed
    pub fn on_dispose(&mut self, disposer: impl FnOnce() + Send + 'static) {
        self.disposers.push(Box::new(disposer));
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run the registered disposers in registration order; later calls are no-ops
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for disposer in self.disposers.drain(..) {
            disposer();
        }
    }
}

impl fmt::Debug for ContextBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("states", &self.states)
            .field("disposers", &self.disposers.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// A context the pipeline can drive
pub trait DataContext: Send + Sized + 'static {
    const KIND: OperationKind;

    fn base(&self) -> &ContextBase;

    fn base_mut(&mut self) -> &mut ContextBase;

    /// View handed to filters
    fn target(&mut self) -> ContextMut<'_>;

    /// Event subscribers for this operation family
    fn handlers(events: &Events) -> &EventHandlers<Self>;

    /// Run the driver's sync operation
    fn invoke(&mut self, driver: &dyn DataDriver) -> DataResult<()>;

    /// Run the driver's async operation
    fn invoke_async<'a>(
        &'a mut self,
        driver: &'a dyn DataDriver,
        cancel: &'a Cancellation,
    ) -> BoxFuture<'a, DataResult<()>>;
}

macro_rules! data_context {
    ($context:ident, $kind:ident, $variant:ident, $events:ident, $on:ident, $on_async:ident) => {
        impl DataContext for $context {
            const KIND: OperationKind = OperationKind::$kind;

            fn base(&self) -> &ContextBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut ContextBase {
                &mut self.base
            }

            fn target(&mut self) -> ContextMut<'_> {
                ContextMut::$variant(self)
            }

            fn handlers(events: &Events) -> &EventHandlers<Self> {
                &events.$events
            }

            fn invoke(&mut self, driver: &dyn DataDriver) -> DataResult<()> {
                driver.$on(self)
            }

            fn invoke_async<'a>(
                &'a mut self,
                driver: &'a dyn DataDriver,
                cancel: &'a Cancellation,
            ) -> BoxFuture<'a, DataResult<()>> {
                driver.$on_async(self, cancel)
            }
        }
    };
}

/// Named stored operation
#[derive(Debug)]
pub struct ExecuteContext {
    pub base: ContextBase,
    /// Single value expected rather than rows
    pub is_scalar: bool,
    pub parameters: BTreeMap<String, Value>,
    /// Written by the driver
    pub output_parameters: BTreeMap<String, Value>,
    pub result: Option<Value>,
    pub options: ExecuteOptions,
}

impl ExecuteContext {
    pub fn new(args: ExecuteArgs, is_scalar: bool) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Execute, args.name),
            is_scalar,
            parameters: args.parameters,
            output_parameters: BTreeMap::new(),
            result: None,
            options: args.options,
        }
    }

    /// Rows of the result; a scalar becomes one row, null none
    pub fn rows(&self) -> Vec<Value> {
        match &self.result {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows.clone(),
            Some(other) => vec![other.clone()],
        }
    }
}

data_context!(ExecuteContext, Execute, Execute, execute, on_execute, on_execute_async);

/// Existence probe
#[derive(Debug)]
pub struct ExistContext {
    pub base: ContextBase,
    pub criteria: Option<Condition>,
    pub result: bool,
    pub options: ExistsOptions,
}

impl ExistContext {
    pub fn new(args: ExistsArgs) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Exists, args.name),
            criteria: args.criteria,
            result: false,
            options: args.options,
        }
    }
}

data_context!(ExistContext, Exists, Exists, exists, on_exists, on_exists_async);

/// Count, sum, average, maximum or minimum
#[derive(Debug)]
pub struct AggregateContext {
    pub base: ContextBase,
    pub aggregate: DataAggregate,
    pub criteria: Option<Condition>,
    /// Null when no row contributed
    pub result: Option<Value>,
    pub options: AggregateOptions,
}

impl AggregateContext {
    pub fn new(args: AggregateArgs) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Aggregate, args.name),
            aggregate: args.aggregate,
            criteria: args.criteria,
            result: None,
            options: args.options,
        }
    }
}

data_context!(AggregateContext, Aggregate, Aggregate, aggregate, on_aggregate, on_aggregate_async);

/// Atomic increment of one numeric member
#[derive(Debug)]
pub struct IncrementContext {
    pub base: ContextBase,
    pub member: String,
    pub criteria: Option<Condition>,
    /// Negative for decrements
    pub interval: i64,
    /// Member value after the increment
    pub result: i64,
    pub options: IncrementOptions,
}

impl IncrementContext {
    pub fn new(args: IncrementArgs) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Increment, args.name),
            member: args.member,
            criteria: args.criteria,
            interval: args.interval,
            result: 0,
            options: args.options,
        }
    }
}

data_context!(IncrementContext, Increment, Increment, increment, on_increment, on_increment_async);

/// Bulk load
#[derive(Debug)]
pub struct ImportContext {
    pub base: ContextBase,
    /// Rows already trimmed to `members`; filters may add members after
    pub data: Vec<Value>,
    /// Members to load; empty loads every member
    pub members: Vec<String>,
    pub count: usize,
    pub options: ImportOptions,
}

impl ImportContext {
    pub fn new(args: ImportArgs) -> Self {
        let mut data = args.data;
        if !args.members.is_empty() {
            for object in data.iter_mut().filter_map(Value::as_object_mut) {
                object.retain(|member, _| args.members.contains(member));
            }
        }
        Self {
            base: ContextBase::new(OperationKind::Import, args.name),
            data,
            members: args.members,
            count: 0,
            options: args.options,
        }
    }
}

data_context!(ImportContext, Import, Import, import, on_import, on_import_async);

#[derive(Debug)]
pub struct DeleteContext {
    pub base: ContextBase,
    pub criteria: Option<Condition>,
    pub schema: Option<Schema>,
    pub count: usize,
    pub options: DeleteOptions,
}

impl DeleteContext {
    pub fn new(args: DeleteArgs, schema: Option<Schema>) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Delete, args.name),
            criteria: args.criteria,
            schema,
            count: 0,
            options: args.options,
        }
    }
}

data_context!(DeleteContext, Delete, Delete, delete, on_delete, on_delete_async);

#[derive(Debug)]
pub struct InsertContext {
    pub base: ContextBase,
    pub data: Vec<Value>,
    pub is_multiple: bool,
    pub schema: Option<Schema>,
    pub count: usize,
    pub options: InsertOptions,
}

impl InsertContext {
    pub fn new(args: InsertArgs, schema: Option<Schema>) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Insert, args.name),
            data: args.data,
            is_multiple: args.is_multiple,
            schema,
            count: 0,
            options: args.options,
        }
    }
}

data_context!(InsertContext, Insert, Insert, insert, on_insert, on_insert_async);

#[derive(Debug)]
pub struct UpsertContext {
    pub base: ContextBase,
    pub data: Vec<Value>,
    pub is_multiple: bool,
    /// An existing row with the same key must satisfy this to be replaced
    pub scope: Option<Condition>,
    pub schema: Option<Schema>,
    pub count: usize,
    pub options: UpsertOptions,
}

impl UpsertContext {
    pub fn new(args: UpsertArgs, schema: Option<Schema>) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Upsert, args.name),
            data: args.data,
            is_multiple: args.is_multiple,
            scope: None,
            schema,
            count: 0,
            options: args.options,
        }
    }
}

data_context!(UpsertContext, Upsert, Upsert, upsert, on_upsert, on_upsert_async);

#[derive(Debug)]
pub struct UpdateContext {
    pub base: ContextBase,
    pub data: Vec<Value>,
    pub is_multiple: bool,
    /// Update every matching row with one change set; `None` updates by key
    pub criteria: Option<Condition>,
    /// Rows updated by key must also satisfy this
    pub scope: Option<Condition>,
    pub schema: Option<Schema>,
    pub count: usize,
    pub options: UpdateOptions,
}

impl UpdateContext {
    pub fn new(args: UpdateArgs, schema: Option<Schema>) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Update, args.name),
            data: args.data,
            is_multiple: args.is_multiple,
            criteria: args.criteria,
            scope: None,
            schema,
            count: 0,
            options: args.options,
        }
    }
}

data_context!(UpdateContext, Update, Update, update, on_update, on_update_async);

/// Plain or grouped query
#[derive(Debug)]
pub struct SelectContext {
    pub base: ContextBase,
    /// Type name rows are materialized as, when it differs from the storage name
    pub entity: Option<String>,
    pub criteria: Option<Condition>,
    pub grouping: Option<Grouping>,
    pub schema: Option<Schema>,
    /// The driver fills `total`
    pub paging: Option<Paging>,
    pub sortings: Vec<Sorting>,
    pub result: Vec<Value>,
    pub options: SelectOptions,
}

impl SelectContext {
    pub fn new(args: SelectArgs, schema: Option<Schema>) -> Self {
        Self {
            base: ContextBase::new(OperationKind::Select, args.name),
            entity: args.entity,
            criteria: args.criteria,
            grouping: args.grouping,
            schema,
            paging: args.paging,
            sortings: args.sortings,
            result: Vec::new(),
            options: args.options,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.grouping.is_some()
    }
}

data_context!(SelectContext, Select, Select, select, on_select, on_select_async);
