//! Filter chain
//!
//! Filters see every pass that reaches the driver: `on_filtering` right
//! before it and `on_filtered` right after it, both in registration order.
//! Filters may mutate the context but cannot cancel the operation.

use std::fmt;
use std::sync::Arc;

use super::context::{
    AggregateContext, ContextBase, DataContext, DeleteContext, ExecuteContext, ExistContext,
    ImportContext, IncrementContext, InsertContext, OperationKind, SelectContext, UpdateContext,
    UpsertContext,
};

/// Mutable view of any context
pub enum ContextMut<'a> {
    Execute(&'a mut ExecuteContext),
    Exists(&'a mut ExistContext),
    Aggregate(&'a mut AggregateContext),
    Increment(&'a mut IncrementContext),
    Import(&'a mut ImportContext),
    Delete(&'a mut DeleteContext),
    Insert(&'a mut InsertContext),
    Upsert(&'a mut UpsertContext),
    Update(&'a mut UpdateContext),
    Select(&'a mut SelectContext),
}

impl<'a> ContextMut<'a> {
    pub fn base(&self) -> &ContextBase {
        match self {
            ContextMut::Execute(context) => &context.base,
            ContextMut::Exists(context) => &context.base,
            ContextMut::Aggregate(context) => &context.base,
            ContextMut::Increment(context) => &context.base,
            ContextMut::Import(context) => &context.base,
            ContextMut::Delete(context) => &context.base,
            ContextMut::Insert(context) => &context.base,
            ContextMut::Upsert(context) => &context.base,
            ContextMut::Update(context) => &context.base,
            ContextMut::Select(context) => &context.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ContextBase {
        match self {
            ContextMut::Execute(context) => &mut context.base,
            ContextMut::Exists(context) => &mut context.base,
            ContextMut::Aggregate(context) => &mut context.base,
            ContextMut::Increment(context) => &mut context.base,
            ContextMut::Import(context) => &mut context.base,
            ContextMut::Delete(context) => &mut context.base,
            ContextMut::Insert(context) => &mut context.base,
            ContextMut::Upsert(context) => &mut context.base,
            ContextMut::Update(context) => &mut context.base,
            ContextMut::Select(context) => &mut context.base,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.base().kind()
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }
}

/// A cross-cutting hook around the driver call
pub trait DataAccessFilter: Send + Sync {
    /// Name used to find and remove the filter
    fn name(&self) -> &str;

    /// Restrict the filter to some operations or entities
    fn applies(&self, _kind: OperationKind, _name: &str) -> bool {
        true
    }

    fn on_filtering(&self, _context: &mut ContextMut<'_>) {}

    fn on_filtered(&self, _context: &mut ContextMut<'_>) {}
}

/// Registered filters, in invocation order
#[derive(Default, Clone)]
pub struct FilterChain {
    filters: Vec<Arc<dyn DataAccessFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter
    pub fn add(&mut self, filter: impl DataAccessFilter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    pub fn add_shared(&mut self, filter: Arc<dyn DataAccessFilter>) {
        self.filters.push(filter);
    }

    /// Remove every filter with this name; true when one was removed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|filter| filter.name() != name);
        self.filters.len() != before
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Membership and order for one pass
    pub(crate) fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            filters: self.filters.clone(),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Filters taken for one pass; pre and post hooks use the same set
pub(crate) struct FilterSnapshot {
    filters: Vec<Arc<dyn DataAccessFilter>>,
}

impl FilterSnapshot {
    pub(crate) fn filtering<C: DataContext>(&self, context: &mut C) {
        for filter in self.matching(context) {
            filter.on_filtering(&mut context.target());
        }
    }

    pub(crate) fn filtered<C: DataContext>(&self, context: &mut C) {
        for filter in self.matching(context) {
            filter.on_filtered(&mut context.target());
        }
    }

    fn matching<C: DataContext>(&self, context: &C) -> Vec<Arc<dyn DataAccessFilter>> {
        let base = context.base();
        self.filters
            .iter()
            .filter(|filter| filter.applies(base.kind(), base.name()))
            .cloned()
            .collect()
    }
}
