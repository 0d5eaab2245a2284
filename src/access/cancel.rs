//! Cancellation signal for async operations
//!
//! The pipeline only hands the signal to the driver; drivers decide where
//! to observe it.

use std::fmt;

use tokio::sync::watch;

use crate::errors::{DataAccessError, DataResult};

/// Owner side: fires the signal
#[derive(Debug)]
pub struct CancellationSource {
    sender: watch::Sender<bool>,
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSource {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Signal handed to operations
    pub fn token(&self) -> Cancellation {
        Cancellation {
            receiver: Some(self.sender.subscribe()),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Observer side, cheap to clone
#[derive(Clone, Default)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A signal that never fires
    pub fn none() -> Self {
        Self { receiver: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver
            .as_ref()
            .map_or(false, |receiver| *receiver.borrow())
    }

    /// `Err(Cancelled)` once the signal fired
    pub fn check(&self) -> DataResult<()> {
        if self.is_cancelled() {
            Err(DataAccessError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the signal fires; pending forever otherwise
    pub async fn cancelled(&self) {
        let Some(receiver) = &self.receiver else {
            return std::future::pending().await;
        };
        let mut receiver = receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Source dropped without firing
                return std::future::pending().await;
            }
        }
    }
}

impl fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellation")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
