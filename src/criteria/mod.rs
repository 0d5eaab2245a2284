//! Criteria payloads carried by contexts: conditions, paging, sorting,
//! grouping and aggregates.

mod aggregate;
mod condition;
mod grouping;
mod paging;
mod sorting;

pub use aggregate::{AggregateFunction, DataAggregate};
pub use condition::{Condition, Operator};
pub use grouping::Grouping;
pub use paging::Paging;
pub use sorting::{SortDirection, Sorting};
