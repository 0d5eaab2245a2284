//! Caller callbacks
//!
//! The pre-callback runs before the "ing" event; returning `true` takes
//! over the operation and the driver is never called. The post-callback
//! runs after the "ed" event and is a pure notification.

type Before<'h, C> = Box<dyn FnOnce(&mut C) -> bool + Send + 'h>;
type After<'h, C> = Box<dyn FnOnce(&C) + Send + 'h>;

/// Optional pre and post callbacks for one call
pub struct Hooks<'h, C> {
    before: Option<Before<'h, C>>,
    after: Option<After<'h, C>>,
}

impl<'h, C> Default for Hooks<'h, C> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'h, C> Hooks<'h, C> {
    pub fn none() -> Self {
        Self {
            before: None,
            after: None,
        }
    }

    /// Set the pre-callback
    pub fn before(mut self, callback: impl FnOnce(&mut C) -> bool + Send + 'h) -> Self {
        self.before = Some(Box::new(callback));
        self
    }

    /// Set the post-callback
    pub fn after(mut self, callback: impl FnOnce(&C) + Send + 'h) -> Self {
        self.after = Some(Box::new(callback));
        self
    }

    /// True when the pre-callback intercepted the operation
    pub(crate) fn intercept(&mut self, context: &mut C) -> bool {
        match self.before.take() {
            Some(callback) => callback(context),
            None => false,
        }
    }

    pub(crate) fn notify(&mut self, context: &C) {
        if let Some(callback) = self.after.take() {
            callback(context);
        }
    }
}
