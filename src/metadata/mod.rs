//! # Entity Metadata
//!
//! Column and relation descriptions supplied by the backing store.
//!
//! The query engine never hard-codes an entity shape. Everything it knows
//! about a table (which keys are real columns, which comparison a column
//! needs, which relations can be joined) comes from here.

mod column;
mod entity;

pub use column::{ColumnDescriptor, ColumnKind, Comparison};
pub use entity::{EntityMetadata, MetadataProvider, RelationDescriptor};
