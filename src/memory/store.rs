//! In-process table storage
//!
//! Tables are created on first write. Rows keep insertion order.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::errors::{DataAccessError, DataResult};

pub type Row = Map<String, Value>;

/// One table
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Key member, if the table has one
    pub key: Option<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Key value of a row
    pub fn key_of<'r>(&self, row: &'r Row) -> Option<&'r Value> {
        let key = self.key.as_ref()?;
        row.get(key).filter(|value| !value.is_null())
    }

    /// Index of the row holding `value` in the key member
    pub fn position(&self, value: &Value) -> Option<usize> {
        let key = self.key.as_ref()?;
        self.rows.iter().position(|row| row.get(key) == Some(value))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    keys: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the key member of a table
    pub fn set_key(&self, table: &str, member: &str) -> DataResult<()> {
        self.keys
            .write()
            .map_err(|e| DataAccessError::backend("memory", e.to_string()))?
            .insert(table.to_string(), member.to_string());

        let mut tables = self
            .tables
            .write()
            .map_err(|e| DataAccessError::backend("memory", e.to_string()))?;
        if let Some(existing) = tables.get_mut(table) {
            existing.key = Some(member.to_string());
        }
        Ok(())
    }

    /// Run `f` against a table, or against an empty one if it does not exist
    pub fn read<R>(&self, table: &str, f: impl FnOnce(&Table) -> R) -> DataResult<R> {
        let tables = self
            .tables
            .read()
            .map_err(|e| DataAccessError::backend("memory", e.to_string()))?;
        match tables.get(table) {
            Some(existing) => Ok(f(existing)),
            None => Ok(f(&self.empty(table)?)),
        }
    }

    /// Run `f` against a table, creating it first if needed
    pub fn write<R>(&self, table: &str, f: impl FnOnce(&mut Table) -> DataResult<R>) -> DataResult<R> {
        let fresh = self.empty(table)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|e| DataAccessError::backend("memory", e.to_string()))?;
        f(tables.entry(table.to_string()).or_insert(fresh))
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> DataResult<Vec<Row>> {
        self.read(table, |table| table.rows.clone())
    }

    fn empty(&self, table: &str) -> DataResult<Table> {
        let keys = self
            .keys
            .read()
            .map_err(|e| DataAccessError::backend("memory", e.to_string()))?;
        Ok(Table {
            key: keys.get(table).cloned(),
            rows: Vec::new(),
        })
    }
}
