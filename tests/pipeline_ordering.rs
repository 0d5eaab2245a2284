//! Pipeline Ordering Tests
//!
//! One pass runs: factory, pre-callback, "ing" event, filters (pre),
//! driver, filters (post, same order), "ed" event, post-callback, dispose.

mod common;

use std::sync::Arc;

use common::{entries, journal, push, SpyDriver, SpyFilter};
use dataaccess::access::{InsertArgs, SelectArgs, UpdateArgs};
use dataaccess::{DataAccess, Hooks};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn access_with_spies(journal: &common::Journal) -> DataAccess {
    let mut access = DataAccess::new("app", Arc::new(SpyDriver::new(Arc::clone(journal))));
    access.filters_mut().add(SpyFilter::new("a", journal));
    access.filters_mut().add(SpyFilter::new("b", journal));

    let j = Arc::clone(journal);
    access
        .events_mut()
        .insert
        .on_executing(move |_| push(&j, "executing"));
    let j = Arc::clone(journal);
    access
        .events_mut()
        .insert
        .on_executed(move |_| push(&j, "executed"));
    access
}

// =============================================================================
// Full Pass
// =============================================================================

/// Every step runs exactly once and in order.
#[test]
fn test_insert_pass_order() {
    let journal = journal();
    let access = access_with_spies(&journal);

    let before = Arc::clone(&journal);
    let after = Arc::clone(&journal);
    let hooks = Hooks::none()
        .before(move |_| {
            push(&before, "before");
            false
        })
        .after(move |_| push(&after, "after"));

    let count = access
        .insert(InsertArgs::one("users", json!({"Name": "a"})), hooks)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        entries(&journal),
        vec![
            "factory:insert",
            "before",
            "executing",
            "a:filtering:insert",
            "b:filtering:insert",
            "driver:insert",
            "a:filtered:insert",
            "b:filtered:insert",
            "executed",
            "after",
            "dispose",
        ]
    );
}

/// Post-filters run in registration order, not reversed.
#[test]
fn test_filters_keep_registration_order() {
    let journal = journal();
    let mut access = DataAccess::new("app", Arc::new(SpyDriver::new(Arc::clone(&journal))));
    for name in ["first", "second", "third"] {
        access.filters_mut().add(SpyFilter::new(name, &journal));
    }

    access.select(SelectArgs::new("users"), Hooks::none()).unwrap();

    let filtered: Vec<String> = entries(&journal)
        .into_iter()
        .filter(|e| e.contains(":filtered:"))
        .collect();
    assert_eq!(
        filtered,
        vec![
            "first:filtered:select",
            "second:filtered:select",
            "third:filtered:select",
        ]
    );
}

/// Handlers of other families never fire.
#[test]
fn test_events_are_per_family() {
    let journal = journal();
    let access = access_with_spies(&journal);

    access
        .update(UpdateArgs::one("users", json!({"Id": 1})), Hooks::none())
        .unwrap();

    let log = entries(&journal);
    assert!(!log.iter().any(|e| e == "executing" || e == "executed"));
    assert!(log.contains(&"driver:update".to_string()));
}

/// Removing a filter takes effect for the next pass.
#[test]
fn test_remove_filter() {
    let journal = journal();
    let mut access = access_with_spies(&journal);

    assert!(access.filters_mut().remove("a"));
    assert!(!access.filters_mut().remove("a"));
    assert_eq!(access.filters().names(), vec!["b"]);

    access.select(SelectArgs::new("users"), Hooks::none()).unwrap();
    assert!(!entries(&journal).iter().any(|e| e.starts_with("a:")));
}

/// The pre-callback may rewrite the context before the driver sees it.
#[test]
fn test_before_hook_mutates_context() {
    let journal = journal();
    let access = access_with_spies(&journal);

    let hooks = Hooks::none().before(|context: &mut dataaccess::access::InsertContext| {
        context.data.push(json!({"Name": "extra"}));
        false
    });

    let count = access
        .insert(InsertArgs::one("users", json!({"Name": "a"})), hooks)
        .unwrap();
    assert_eq!(count, 2);
}

/// Completed passes are counted.
#[test]
fn test_metrics_count_completed() {
    let journal = journal();
    let access = access_with_spies(&journal);

    access.select(SelectArgs::new("users"), Hooks::none()).unwrap();
    access.select(SelectArgs::new("users"), Hooks::none()).unwrap();

    let snapshot = access.metrics().snapshot();
    assert_eq!(snapshot.completed, 2);
    assert_eq!(snapshot.total(), 2);
}
