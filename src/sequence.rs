//! Sequence generators
//!
//! A data access instance resolves its [`Sequence`] lazily from a
//! [`SequenceProvider`], first under its own name, then under the
//! provider's default (empty) name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{DataAccessError, DataResult};

/// Named monotonic counters
pub trait Sequence: Send + Sync {
    /// Add `interval` to `key` and return the new value.
    /// An unknown key starts at `seed`.
    fn increase(&self, key: &str, interval: i64, seed: i64) -> DataResult<i64>;

    fn decrease(&self, key: &str, interval: i64, seed: i64) -> DataResult<i64> {
        let interval = interval.checked_neg().ok_or_else(|| {
            DataAccessError::invalid_argument(format!("interval {} cannot be negated", interval))
        })?;
        self.increase(key, interval, seed)
    }

    /// Set `key` to `value`
    fn reset(&self, key: &str, value: i64) -> DataResult<()>;
}

/// Looks up sequence generators by name
pub trait SequenceProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<dyn Sequence>>;
}

/// Resolve the sequence for `name`, falling back to the default name
pub fn resolve_sequence(provider: &dyn SequenceProvider, name: &str) -> DataResult<Arc<dyn Sequence>> {
    if let Some(sequence) = provider.get(name) {
        return Ok(sequence);
    }
    if !name.is_empty() {
        if let Some(sequence) = provider.get("") {
            return Ok(sequence);
        }
    }
    Err(DataAccessError::configuration(format!(
        "No sequence registered for '{}' or as default",
        name
    )))
}

/// In-process sequence
#[derive(Debug, Default)]
pub struct MemorySequence {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemorySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value without changing it
    pub fn current(&self, key: &str) -> Option<i64> {
        self.counters.lock().ok()?.get(key).copied()
    }
}

impl Sequence for MemorySequence {
    fn increase(&self, key: &str, interval: i64, seed: i64) -> DataResult<i64> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| DataAccessError::backend("sequence", "counter lock poisoned"))?;
        let value = counters.entry(key.to_string()).or_insert(seed);
        *value = value
            .checked_add(interval)
            .ok_or_else(|| DataAccessError::backend("sequence", format!("sequence '{}' overflowed", key)))?;
        Ok(*value)
    }

    fn reset(&self, key: &str, value: i64) -> DataResult<()> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| DataAccessError::backend("sequence", "counter lock poisoned"))?;
        counters.insert(key.to_string(), value);
        Ok(())
    }
}

/// Map-backed [`SequenceProvider`]
#[derive(Default)]
pub struct MemorySequenceProvider {
    sequences: HashMap<String, Arc<dyn Sequence>>,
}

impl MemorySequenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sequence; `""` registers the default
    pub fn register(mut self, name: impl Into<String>, sequence: Arc<dyn Sequence>) -> Self {
        self.sequences.insert(name.into(), sequence);
        self
    }
}

impl SequenceProvider for MemorySequenceProvider {
    fn get(&self, name: &str) -> Option<Arc<dyn Sequence>> {
        self.sequences.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase_from_seed() {
        let sequence = MemorySequence::new();
        assert_eq!(sequence.increase("Order", 1, 100).unwrap(), 101);
        assert_eq!(sequence.increase("Order", 1, 100).unwrap(), 102);
        assert_eq!(sequence.decrease("Order", 2, 100).unwrap(), 100);
        assert_eq!(sequence.current("Other"), None);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let sequence = MemorySequence::new();
        sequence.reset("Order", i64::MAX).unwrap();
        let err = sequence.increase("Order", 1, 0).unwrap_err();
        assert_eq!(err.code(), "DATA_BACKEND");
        assert_eq!(sequence.current("Order"), Some(i64::MAX));

        let err = sequence.decrease("Order", i64::MIN, 0).unwrap_err();
        assert_eq!(err.code(), "DATA_INVALID_ARGUMENT");
    }

    #[test]
    fn test_reset() {
        let sequence = MemorySequence::new();
        sequence.reset("Order", 10).unwrap();
        assert_eq!(sequence.increase("Order", 5, 0).unwrap(), 15);
    }

    #[test]
    fn test_resolve_prefers_own_name() {
        let own: Arc<dyn Sequence> = Arc::new(MemorySequence::new());
        own.reset("k", 7).unwrap();
        let provider = MemorySequenceProvider::new()
            .register("sales", own)
            .register("", Arc::new(MemorySequence::new()));

        let resolved = resolve_sequence(&provider, "sales").unwrap();
        assert_eq!(resolved.increase("k", 1, 0).unwrap(), 8);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let provider = MemorySequenceProvider::new().register("", Arc::new(MemorySequence::new()));
        assert!(resolve_sequence(&provider, "anything").is_ok());
    }

    #[test]
    fn test_resolve_missing_is_configuration_error() {
        let provider = MemorySequenceProvider::new();
        let err = resolve_sequence(&provider, "sales").err().unwrap();
        assert!(err.is_fatal());
    }
}
