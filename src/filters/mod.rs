//! Built-in filters

mod audit;
mod tenant;

pub use audit::{AuditFilter, AuditRecord};
pub use tenant::TenantFilter;
