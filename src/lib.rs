//! dataaccess - A generic data access pipeline
//!
//! Operations run through a fixed sequence of caller hooks, cancelable
//! events and filters around one pluggable driver call.

pub mod access;
pub mod config;
pub mod criteria;
pub mod errors;
pub mod filters;
pub mod memory;
pub mod naming;
pub mod observability;
pub mod schema;
pub mod sequence;

pub use access::{DataAccess, DataDriver, Hooks};
pub use errors::{DataAccessError, DataResult};
