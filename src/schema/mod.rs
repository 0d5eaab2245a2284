//! Member-selection schemas
//!
//! A schema expression such as `"Name, Role{*}, !Password"` names the
//! members an operation should materialize. Parsers are supplied by the
//! driver; [`ExpressionParser`] is the default.

mod metadata;
mod parser;
mod types;

pub use metadata::{EntityMetadata, MemberKind, MetadataContainer};
pub use parser::{ExpressionParser, SchemaParser};
pub use types::{MemberSet, Schema, SchemaMember};
