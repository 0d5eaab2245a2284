//! Short-Circuit and Failure Tests
//!
//! - Empty write payloads build nothing and fire nothing
//! - A pre-callback returning true replaces the driver
//! - An "ing" handler cancelling stops before filters and driver
//! - Driver failures raise the error event and still dispose
//! - The gates and disposal hold for every operation family

mod common;

use std::sync::{Arc, Mutex};

use common::{entries, journal, push, SpyDriver, SpyFilter};
use dataaccess::access::{
    AggregateArgs, DeleteArgs, ExecuteArgs, ExistsArgs, ImportArgs, IncrementArgs, InsertArgs,
    InsertContext, OperationKind, SelectArgs, UpdateArgs, UpsertArgs,
};
use dataaccess::criteria::DataAggregate;
use dataaccess::{DataAccess, DataAccessError, Hooks};
use serde_json::{json, Value};

fn access(journal: &common::Journal) -> DataAccess {
    let mut access = DataAccess::new("app", Arc::new(SpyDriver::new(Arc::clone(journal))));
    access.filters_mut().add(SpyFilter::new("spy", journal));
    access
}

// =============================================================================
// Empty Payloads
// =============================================================================

/// No context, no hooks, no filters, no driver.
#[test]
fn test_empty_insert_returns_zero_silently() {
    let journal = journal();
    let access = access(&journal);

    let before = Arc::clone(&journal);
    let hooks = Hooks::none().before(move |_: &mut InsertContext| {
        push(&before, "before");
        false
    });

    assert_eq!(access.insert(InsertArgs::many("users", vec![]), hooks).unwrap(), 0);
    assert_eq!(access.insert(InsertArgs::one("users", Value::Null), Hooks::none()).unwrap(), 0);
    assert!(entries(&journal).is_empty());
    assert_eq!(access.metrics().snapshot().skipped, 2);
}

#[test]
fn test_empty_payload_for_every_write_family() {
    let journal = journal();
    let access = access(&journal);

    assert_eq!(access.upsert(UpsertArgs::many("users", vec![]), Hooks::none()).unwrap(), 0);
    assert_eq!(access.update(UpdateArgs::many("users", vec![]), Hooks::none()).unwrap(), 0);
    assert_eq!(access.import(ImportArgs::new("users", vec![]), Hooks::none()).unwrap(), 0);
    assert!(entries(&journal).is_empty());
}

// =============================================================================
// Argument Validation
// =============================================================================

#[test]
fn test_blank_name_is_invalid_argument() {
    let journal = journal();
    let access = access(&journal);

    let err = access
        .insert(InsertArgs::one("  ", json!({"a": 1})), Hooks::none())
        .unwrap_err();
    assert!(matches!(err, DataAccessError::InvalidArgument(_)));

    let err = access.select(SelectArgs::new(""), Hooks::none()).unwrap_err();
    assert!(matches!(err, DataAccessError::InvalidArgument(_)));
    assert!(entries(&journal).is_empty());
}

#[test]
fn test_blank_increment_member_is_invalid_argument() {
    let journal = journal();
    let access = access(&journal);
    let err = access
        .increment(IncrementArgs::new("users", ""), Hooks::none())
        .unwrap_err();
    assert_eq!(err.code(), "DATA_INVALID_ARGUMENT");
}

// =============================================================================
// Pre-Callback Interception
// =============================================================================

/// Returning true skips filters and driver; the context result is returned.
#[test]
fn test_before_hook_takes_over() {
    let journal = journal();
    let access = access(&journal);

    let after_called = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&after_called);
    let hooks = Hooks::none()
        .before(|context: &mut InsertContext| {
            context.count = 42;
            true
        })
        .after(move |_| *flag.lock().unwrap() = true);

    let count = access
        .insert(InsertArgs::one("users", json!({"a": 1})), hooks)
        .unwrap();

    assert_eq!(count, 42);
    assert!(!*after_called.lock().unwrap());
    assert_eq!(entries(&journal), vec!["factory:insert", "dispose"]);
    assert_eq!(access.metrics().snapshot().intercepted, 1);
}

// =============================================================================
// Cancelled "ing" Event
// =============================================================================

/// The pre-callback ran; the driver and filters did not.
#[test]
fn test_executing_cancel_skips_driver() {
    let journal = journal();
    let mut access = access(&journal);
    let j = Arc::clone(&journal);
    access.events_mut().insert.on_executing(move |event| {
        push(&j, "executing");
        event.cancel();
    });
    let j = Arc::clone(&journal);
    access
        .events_mut()
        .insert
        .on_executed(move |_| push(&j, "executed"));

    let before = Arc::clone(&journal);
    let hooks = Hooks::none().before(move |_: &mut InsertContext| {
        push(&before, "before");
        false
    });

    let count = access
        .insert(InsertArgs::one("users", json!({"a": 1})), hooks)
        .unwrap();

    assert_eq!(count, 0);
    assert_eq!(
        entries(&journal),
        vec!["factory:insert", "before", "executing", "dispose"]
    );
    assert_eq!(access.metrics().snapshot().cancelled, 1);
}

/// Every "ing" handler runs even after one cancelled.
#[test]
fn test_all_executing_handlers_run() {
    let journal = journal();
    let mut access = access(&journal);
    let j = Arc::clone(&journal);
    access.events_mut().insert.on_executing(move |event| {
        push(&j, "first");
        event.cancel();
    });
    let j = Arc::clone(&journal);
    access.events_mut().insert.on_executing(move |event| {
        push(&j, format!("second:{}", event.is_cancelled()));
    });

    access
        .insert(InsertArgs::one("users", json!({"a": 1})), Hooks::none())
        .unwrap();

    let log = entries(&journal);
    assert!(log.contains(&"first".to_string()));
    assert!(log.contains(&"second:true".to_string()));
    assert!(!log.contains(&"driver:insert".to_string()));
}

// =============================================================================
// Driver Failure
// =============================================================================

#[test]
fn test_driver_failure_raises_error_event_and_disposes() {
    let journal = journal();
    let mut access = DataAccess::new("app", Arc::new(SpyDriver::failing(Arc::clone(&journal))));
    access.filters_mut().add(SpyFilter::new("spy", &journal));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    access.events_mut().on_error(move |event| {
        sink.lock()
            .unwrap()
            .push((event.kind, event.name.to_string(), event.error.code()));
    });

    let err = access
        .insert(InsertArgs::one("users", json!({"a": 1})), Hooks::none())
        .unwrap_err();

    assert_eq!(err.code(), "DATA_BACKEND");
    assert_eq!(
        entries(&journal),
        vec!["factory:insert", "spy:filtering:insert", "driver:insert", "dispose"]
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(OperationKind::Insert, "users".to_string(), "DATA_BACKEND")]
    );
    assert_eq!(access.metrics().failed(), 1);
}

// =============================================================================
// Derived Operations
// =============================================================================

/// Decrement is increment with the interval negated.
#[test]
fn test_decrement_equals_negative_increment() {
    let journal = journal();
    let access = access(&journal);

    let down = access
        .decrement(IncrementArgs::new("users", "Stock").interval(5), Hooks::none())
        .unwrap();
    let up = access
        .increment(IncrementArgs::new("users", "Stock").interval(-5), Hooks::none())
        .unwrap();

    assert_eq!(down, 95);
    assert_eq!(down, up);
}

/// An interval that cannot be negated is rejected before any context.
#[test]
fn test_decrement_by_min_interval_is_invalid_argument() {
    let journal = journal();
    let access = access(&journal);

    let err = access
        .decrement(IncrementArgs::new("users", "Stock").interval(i64::MIN), Hooks::none())
        .unwrap_err();

    assert_eq!(err.code(), "DATA_INVALID_ARGUMENT");
    assert!(entries(&journal).is_empty());
}

/// A null count comes back as zero.
#[test]
fn test_count_is_never_null() {
    let journal = journal();
    let access = access(&journal);

    assert_eq!(access.count("users", None).unwrap(), 0);

    let raw = access
        .aggregate(AggregateArgs::new("users", DataAggregate::count()), Hooks::none())
        .unwrap();
    assert_eq!(raw, Some(Value::Null));
}

/// Dispose runs once per pass whatever the outcome.
#[test]
fn test_dispose_once_per_pass() {
    let journal = journal();
    let access = access(&journal);

    access.select(SelectArgs::new("users"), Hooks::none()).unwrap();
    access
        .select(SelectArgs::new("users"), Hooks::none().before(|_| true))
        .unwrap();

    let disposals = entries(&journal).iter().filter(|e| *e == "dispose").count();
    assert_eq!(disposals, 2);
}

// =============================================================================
// Every Operation Family
// =============================================================================

const FAMILIES: [&str; 10] = [
    "execute", "exists", "aggregate", "increment", "import", "delete", "insert", "upsert",
    "update", "select",
];

/// One pass of each family, in `FAMILIES` order, each with its own hooks.
macro_rules! run_every_family {
    ($access:expr, $hooks:expr) => {{
        let access = &$access;
        vec![
            access.execute(ExecuteArgs::new("report"), $hooks).map(|_| ()),
            access.exists(ExistsArgs::new("users"), $hooks).map(|_| ()),
            access
                .aggregate(AggregateArgs::new("users", DataAggregate::count()), $hooks)
                .map(|_| ()),
            access.increment(IncrementArgs::new("users", "Stock"), $hooks).map(|_| ()),
            access
                .import(ImportArgs::new("users", vec![json!({"Id": 1})]), $hooks)
                .map(|_| ()),
            access.delete(DeleteArgs::new("users"), $hooks).map(|_| ()),
            access.insert(InsertArgs::one("users", json!({"Id": 1})), $hooks).map(|_| ()),
            access.upsert(UpsertArgs::one("users", json!({"Id": 1})), $hooks).map(|_| ()),
            access.update(UpdateArgs::one("users", json!({"Id": 1})), $hooks).map(|_| ()),
            access.select(SelectArgs::new("users"), $hooks).map(|_| ()),
        ]
    }};
}

fn driver_calls(journal: &common::Journal) -> Vec<String> {
    entries(journal)
        .into_iter()
        .filter(|e| e.starts_with("driver:"))
        .collect()
}

fn disposals(journal: &common::Journal) -> usize {
    entries(journal).iter().filter(|e| *e == "dispose").count()
}

#[test]
fn test_every_family_runs_driver_and_disposes_once() {
    let journal = journal();
    let access = access(&journal);

    let outcomes = run_every_family!(access, Hooks::none());

    assert!(outcomes.iter().all(Result::is_ok));
    let expected: Vec<String> = FAMILIES.iter().map(|f| format!("driver:{}", f)).collect();
    assert_eq!(driver_calls(&journal), expected);
    assert_eq!(disposals(&journal), FAMILIES.len());
}

#[test]
fn test_every_family_before_hook_skips_driver() {
    let journal = journal();
    let access = access(&journal);

    let outcomes = run_every_family!(access, Hooks::none().before(|_| true));

    assert!(outcomes.iter().all(Result::is_ok));
    assert!(driver_calls(&journal).is_empty());
    assert!(!entries(&journal).iter().any(|e| e.starts_with("spy:")));
    assert_eq!(disposals(&journal), FAMILIES.len());
    assert_eq!(access.metrics().snapshot().intercepted, FAMILIES.len() as u64);
}

#[test]
fn test_every_family_executing_cancel_skips_driver() {
    let journal = journal();
    let mut access = access(&journal);
    let events = access.events_mut();
    events.execute.on_executing(|event| event.cancel());
    events.exists.on_executing(|event| event.cancel());
    events.aggregate.on_executing(|event| event.cancel());
    events.increment.on_executing(|event| event.cancel());
    events.import.on_executing(|event| event.cancel());
    events.delete.on_executing(|event| event.cancel());
    events.insert.on_executing(|event| event.cancel());
    events.upsert.on_executing(|event| event.cancel());
    events.update.on_executing(|event| event.cancel());
    events.select.on_executing(|event| event.cancel());

    let outcomes = run_every_family!(access, Hooks::none());

    assert!(outcomes.iter().all(Result::is_ok));
    assert!(driver_calls(&journal).is_empty());
    assert!(!entries(&journal).iter().any(|e| e.starts_with("spy:")));
    assert_eq!(disposals(&journal), FAMILIES.len());
    assert_eq!(access.metrics().snapshot().cancelled, FAMILIES.len() as u64);
}
