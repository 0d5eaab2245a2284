//! In-process reference driver
//!
//! Keeps tables of JSON rows in memory. Supports key members, sequence
//! keys, schema projection, criteria, sorting, paging, aggregates,
//! grouping and stored procedures.

mod aggregate;
mod driver;
mod matcher;
mod projection;
mod store;

pub use aggregate::{compute, group};
pub use driver::{MemoryDriver, Procedure};
pub use matcher::{compare_values, lookup, matches, sort};
pub use projection::project;
pub use store::{MemoryStore, Row, Table};
