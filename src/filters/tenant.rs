//! Tenant filter
//!
//! Confines every operation to one tenant: criteria-based operations get
//! an extra equality condition and written rows get the tenant member.
//! Keyed updates and upserts only touch rows already owned by the tenant.

use std::collections::HashSet;

use serde_json::Value;

use crate::access::{ContextMut, DataAccessFilter, OperationKind};
use crate::criteria::Condition;

pub struct TenantFilter {
    member: String,
    tenant: Value,
    /// Restrict to these storage names; empty applies to all
    entities: HashSet<String>,
}

impl TenantFilter {
    pub fn new(member: impl Into<String>, tenant: impl Into<Value>) -> Self {
        Self {
            member: member.into(),
            tenant: tenant.into(),
            entities: HashSet::new(),
        }
    }

    /// Apply only to the named entity; may be called repeatedly
    pub fn only(mut self, entity: impl Into<String>) -> Self {
        self.entities.insert(entity.into());
        self
    }

    fn condition(&self) -> Condition {
        Condition::equal(self.member.clone(), self.tenant.clone())
    }

    fn restrict(&self, criteria: &mut Option<Condition>) {
        *criteria = Some(Condition::combine(criteria.take(), self.condition()));
    }

    fn assign(&self, rows: &mut [Value]) {
        for row in rows.iter_mut() {
            if let Some(object) = row.as_object_mut() {
                object.insert(self.member.clone(), self.tenant.clone());
            }
        }
    }
}

impl DataAccessFilter for TenantFilter {
    fn name(&self) -> &str {
        "tenant"
    }

    fn applies(&self, _kind: OperationKind, name: &str) -> bool {
        self.entities.is_empty() || self.entities.contains(name)
    }

    fn on_filtering(&self, context: &mut ContextMut<'_>) {
        match context {
            ContextMut::Execute(context) => {
                context
                    .parameters
                    .insert(self.member.clone(), self.tenant.clone());
            }
            ContextMut::Exists(context) => self.restrict(&mut context.criteria),
            ContextMut::Aggregate(context) => self.restrict(&mut context.criteria),
            ContextMut::Increment(context) => self.restrict(&mut context.criteria),
            ContextMut::Delete(context) => self.restrict(&mut context.criteria),
            ContextMut::Select(context) => self.restrict(&mut context.criteria),
            ContextMut::Update(context) => {
                if context.criteria.is_some() {
                    self.restrict(&mut context.criteria);
                } else {
                    self.restrict(&mut context.scope);
                }
                self.assign(&mut context.data);
            }
            ContextMut::Insert(context) => self.assign(&mut context.data),
            ContextMut::Upsert(context) => {
                self.restrict(&mut context.scope);
                self.assign(&mut context.data);
            }
            ContextMut::Import(context) => self.assign(&mut context.data),
        }
    }
}
