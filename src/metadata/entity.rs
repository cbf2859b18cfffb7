//! Per-entity metadata and the provider capability

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::column::ColumnDescriptor;
use crate::store::StoreError;

/// A joinable relation from one entity to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation name, used as the join path segment and as the output key
    pub name: String,
    /// Target entity name
    pub target: String,
    /// Column on the owning entity
    pub local_column: String,
    /// Column on the target entity
    #[serde(default = "default_target_column")]
    pub target_column: String,
    /// One-to-many when true, many-to-one otherwise
    #[serde(default)]
    pub many: bool,
}

fn default_target_column() -> String {
    "id".to_string()
}

impl RelationDescriptor {
    /// Many-to-one relation (`course.departmentId -> department.id`)
    pub fn to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        local_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            local_column: local_column.into(),
            target_column: default_target_column(),
            many: false,
        }
    }

    /// One-to-many relation (`department.id -> course.departmentId`)
    pub fn to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            local_column: "id".to_string(),
            target_column: target_column.into(),
            many: true,
        }
    }
}

/// Immutable description of one entity's persisted shape.
///
/// Column lookups are by exact name.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    name: String,
    columns: Vec<ColumnDescriptor>,
    by_name: HashMap<String, usize>,
    relations: Vec<RelationDescriptor>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name.clone(), idx))
            .collect();

        Self {
            name: name.into(),
            columns,
            by_name,
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_relations(mut self, relations: impl IntoIterator<Item = RelationDescriptor>) -> Self {
        self.relations.extend(relations);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.by_name.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Source of entity metadata.
///
/// Implemented by stores; the engine only reads through this trait.
pub trait MetadataProvider {
    /// Metadata for the named entity
    fn metadata(&self, entity: &str) -> Result<Arc<EntityMetadata>, StoreError>;
}
