//! Naming
//!
//! Maps logical entity names to the storage names a backend uses.
//! A missing mapping is a configuration error, never a silent fallback.

use std::collections::HashMap;

use crate::errors::{DataAccessError, DataResult};

/// A type stored through the data access layer
pub trait Model {
    /// Logical entity name, the key looked up in [`Naming`]
    const NAME: &'static str;
}

/// Logical name to storage name resolver
pub trait Naming: Send + Sync {
    /// Mapped storage name, if any
    fn get(&self, logical: &str) -> Option<String>;

    /// Mapped storage name, or a configuration error
    fn resolve(&self, logical: &str) -> DataResult<String> {
        match self.get(logical) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(DataAccessError::configuration(format!(
                "Missing data access name mapping of the '{}' type",
                logical
            ))),
        }
    }
}

/// Storage name of model `T`
pub fn name_of<T: Model>(naming: &dyn Naming) -> DataResult<String> {
    naming.resolve(T::NAME)
}

/// Map-backed [`Naming`]
#[derive(Debug, Clone, Default)]
pub struct DataAccessNaming {
    names: HashMap<String, String>,
}

impl DataAccessNaming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a mapping
    pub fn map(&mut self, logical: impl Into<String>, storage: impl Into<String>) {
        self.names.insert(logical.into(), storage.into());
    }

    /// Builder form of [`map`](Self::map) keyed by a model
    pub fn with<T: Model>(mut self, storage: impl Into<String>) -> Self {
        self.map(T::NAME, storage);
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DataAccessNaming
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut naming = Self::new();
        for (logical, storage) in iter {
            naming.map(logical, storage);
        }
        naming
    }
}

impl Naming for DataAccessNaming {
    fn get(&self, logical: &str) -> Option<String> {
        self.names.get(logical).cloned()
    }
}
