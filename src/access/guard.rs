//! Scoped context ownership
//!
//! The guard owns the context for one pass and disposes it when dropped,
//! so early returns and driver failures dispose exactly like success.

use std::ops::{Deref, DerefMut};

use super::context::DataContext;

pub(crate) struct ContextGuard<C: DataContext> {
    context: C,
}

impl<C: DataContext> ContextGuard<C> {
    pub(crate) fn new(context: C) -> Self {
        Self { context }
    }
}

impl<C: DataContext> Deref for ContextGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.context
    }
}

impl<C: DataContext> DerefMut for ContextGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.context
    }
}

impl<C: DataContext> Drop for ContextGuard<C> {
    fn drop(&mut self) {
        self.context.base_mut().dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::args::ExistsArgs;
    use crate::access::context::ExistContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_drop_disposes_once() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut context = ExistContext::new(ExistsArgs::new("orders"));
        let counter = Arc::clone(&disposed);
        context.base.on_dispose(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        {
            let mut guard = ContextGuard::new(context);
            guard.result = true;
            assert!(guard.result);
        }

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }
}
