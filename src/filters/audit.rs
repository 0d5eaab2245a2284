//! Audit filter
//!
//! Stamps creation and modification times on written rows before the
//! driver runs, and keeps one record per completed operation.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::access::{ContextMut, DataAccessFilter, OperationKind};
use crate::observability::Logger;

/// One completed operation
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub context_id: Uuid,
    pub operation: OperationKind,
    pub name: String,
    /// Rows written or deleted, for counting operations
    pub affected: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

pub struct AuditFilter {
    created_member: String,
    modified_member: String,
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self::new("CreatedTime", "ModifiedTime")
    }
}

impl AuditFilter {
    pub fn new(created_member: impl Into<String>, modified_member: impl Into<String>) -> Self {
        Self {
            created_member: created_member.into(),
            modified_member: modified_member.into(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded operations, oldest first
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shared handle to the records, usable after the filter is registered
    pub fn handle(&self) -> Arc<Mutex<Vec<AuditRecord>>> {
        Arc::clone(&self.records)
    }

    fn stamp(&self, rows: &mut [Value], created: bool) {
        let now = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        for row in rows.iter_mut() {
            let Some(object) = row.as_object_mut() else {
                continue;
            };
            if created && !object.contains_key(&self.created_member) {
                object.insert(self.created_member.clone(), now.clone());
            }
            object.insert(self.modified_member.clone(), now.clone());
        }
    }
}

impl DataAccessFilter for AuditFilter {
    fn name(&self) -> &str {
        "audit"
    }

    fn on_filtering(&self, context: &mut ContextMut<'_>) {
        match context {
            ContextMut::Insert(context) => self.stamp(&mut context.data, true),
            ContextMut::Upsert(context) => self.stamp(&mut context.data, true),
            ContextMut::Import(context) => self.stamp(&mut context.data, true),
            ContextMut::Update(context) => self.stamp(&mut context.data, false),
            _ => {}
        }
    }

    fn on_filtered(&self, context: &mut ContextMut<'_>) {
        let affected = match context {
            ContextMut::Insert(context) => Some(context.count),
            ContextMut::Upsert(context) => Some(context.count),
            ContextMut::Update(context) => Some(context.count),
            ContextMut::Delete(context) => Some(context.count),
            ContextMut::Import(context) => Some(context.count),
            _ => None,
        };

        let base = context.base();
        let record = AuditRecord {
            context_id: base.id(),
            operation: base.kind(),
            name: base.name().to_string(),
            affected,
            timestamp: Utc::now(),
        };

        let context_id = record.context_id.to_string();
        let affected_text = affected.map(|n| n.to_string()).unwrap_or_default();
        Logger::trace(
            "DATA_AUDIT",
            &[
                ("context_id", context_id.as_str()),
                ("operation", record.operation.as_str()),
                ("name", record.name.as_str()),
                ("affected", affected_text.as_str()),
            ],
        );

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
