//! Operation events
//!
//! Each family has a cancelable "ing" event raised before the driver and a
//! plain "ed" event raised after it. The error event fires when the driver
//! fails. Handlers are invoked in subscription order.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::context::{
    AggregateContext, DeleteContext, ExecuteContext, ExistContext, ImportContext,
    IncrementContext, InsertContext, OperationKind, SelectContext, UpdateContext, UpsertContext,
};
use crate::errors::DataAccessError;

/// Argument of an "ing" handler
pub struct Cancelable<'a, C> {
    pub context: &'a mut C,
    cancel: bool,
}

impl<'a, C> Cancelable<'a, C> {
    /// Stop the operation; the caller gets the context's current result
    pub fn cancel(&mut self) {
        self.cancel = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
    }
}

type Executing<C> = Arc<dyn Fn(&mut Cancelable<'_, C>) + Send + Sync>;
type Executed<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// Subscribers of one operation family
pub struct EventHandlers<C> {
    executing: Vec<Executing<C>>,
    executed: Vec<Executed<C>>,
}

impl<C> Default for EventHandlers<C> {
    fn default() -> Self {
        Self {
            executing: Vec::new(),
            executed: Vec::new(),
        }
    }
}

impl<C> fmt::Debug for EventHandlers<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("executing", &self.executing.len())
            .field("executed", &self.executed.len())
            .finish()
    }
}

impl<C> EventHandlers<C> {
    /// Subscribe to the "ing" event
    pub fn on_executing(&mut self, handler: impl Fn(&mut Cancelable<'_, C>) + Send + Sync + 'static) {
        self.executing.push(Arc::new(handler));
    }

    /// Subscribe to the "ed" event
    pub fn on_executed(&mut self, handler: impl Fn(&C) + Send + Sync + 'static) {
        self.executed.push(Arc::new(handler));
    }

    pub fn is_empty(&self) -> bool {
        self.executing.is_empty() && self.executed.is_empty()
    }

    /// Raise the "ing" event; true when a handler cancelled.
    /// Every handler runs even after one cancels.
    pub(crate) fn raise_executing(&self, context: &mut C) -> bool {
        if self.executing.is_empty() {
            return false;
        }
        let mut args = Cancelable {
            context,
            cancel: false,
        };
        for handler in &self.executing {
            handler(&mut args);
        }
        args.cancel
    }

    pub(crate) fn raise_executed(&self, context: &C) {
        for handler in &self.executed {
            handler(context);
        }
    }
}

/// Argument of the error event
#[derive(Debug)]
pub struct ErrorEvent<'a> {
    pub kind: OperationKind,
    pub name: &'a str,
    pub context_id: Uuid,
    pub error: &'a DataAccessError,
}

type ErrorHandler = Arc<dyn Fn(&ErrorEvent<'_>) + Send + Sync>;

/// Subscribers of every operation family
#[derive(Default)]
pub struct Events {
    pub execute: EventHandlers<ExecuteContext>,
    pub exists: EventHandlers<ExistContext>,
    pub aggregate: EventHandlers<AggregateContext>,
    pub increment: EventHandlers<IncrementContext>,
    pub import: EventHandlers<ImportContext>,
    pub delete: EventHandlers<DeleteContext>,
    pub insert: EventHandlers<InsertContext>,
    pub upsert: EventHandlers<UpsertContext>,
    pub update: EventHandlers<UpdateContext>,
    pub select: EventHandlers<SelectContext>,
    error: Vec<ErrorHandler>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to driver failures
    pub fn on_error(&mut self, handler: impl Fn(&ErrorEvent<'_>) + Send + Sync + 'static) {
        self.error.push(Arc::new(handler));
    }

    pub(crate) fn raise_error(&self, event: &ErrorEvent<'_>) {
        for handler in &self.error {
            handler(event);
        }
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("execute", &self.execute)
            .field("select", &self.select)
            .field("error", &self.error.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_no_handlers_never_cancels() {
        let handlers: EventHandlers<i32> = EventHandlers::default();
        let mut value = 0;
        assert!(!handlers.raise_executing(&mut value));
        assert!(handlers.is_empty());
    }

    #[test]
    fn test_all_handlers_run_after_cancel() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut handlers: EventHandlers<i32> = EventHandlers::default();

        let first = Arc::clone(&calls);
        handlers.on_executing(move |args| {
            first.lock().unwrap().push("first");
            args.cancel();
        });
        let second = Arc::clone(&calls);
        handlers.on_executing(move |args| {
            assert!(args.is_cancelled());
            *args.context += 1;
            second.lock().unwrap().push("second");
        });

        let mut value = 0;
        assert!(handlers.raise_executing(&mut value));
        assert_eq!(value, 1);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_error_event() {
        let seen = Arc::new(Mutex::new(None));
        let mut events = Events::new();
        let sink = Arc::clone(&seen);
        events.on_error(move |event| {
            *sink.lock().unwrap() = Some((event.kind, event.error.code()));
        });

        let error = DataAccessError::backend("memory", "disk full");
        events.raise_error(&ErrorEvent {
            kind: OperationKind::Insert,
            name: "orders",
            context_id: Uuid::new_v4(),
            error: &error,
        });

        assert_eq!(
            *seen.lock().unwrap(),
            Some((OperationKind::Insert, "DATA_BACKEND"))
        );
    }
}
