//! Data access pipeline
//!
//! [`DataAccess`] runs every operation through one fixed sequence of
//! caller hooks, events and filters around a [`DataDriver`] call.

mod args;
mod cancel;
mod context;
mod data_access;
mod driver;
mod events;
mod filter;
mod guard;
mod hooks;
mod operations;
mod options;

pub use args::{
    AggregateArgs, DeleteArgs, ExecuteArgs, ExistsArgs, ImportArgs, IncrementArgs, InsertArgs,
    SchemaSpec, SelectArgs, UpdateArgs, UpsertArgs, WriteArgs,
};
pub use cancel::{Cancellation, CancellationSource};
pub use context::{
    AggregateContext, ContextBase, DataContext, DeleteContext, ExecuteContext, ExistContext,
    ImportContext, IncrementContext, InsertContext, OperationKind, SelectContext, UpdateContext,
    UpsertContext,
};
pub use data_access::DataAccess;
pub use driver::DataDriver;
pub use events::{Cancelable, ErrorEvent, EventHandlers, Events};
pub use filter::{ContextMut, DataAccessFilter, FilterChain};
pub use hooks::Hooks;
pub use operations::OutputParameters;
pub use options::{
    AggregateOptions, DeleteOptions, ExecuteOptions, ExistsOptions, ImportOptions,
    IncrementOptions, InsertOptions, SelectOptions, UpdateOptions, UpsertOptions,
};
