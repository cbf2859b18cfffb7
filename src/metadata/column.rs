//! Column descriptors and type-tag classification

use serde::{Deserialize, Serialize};

/// Broad column category derived from the store's type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Integer, decimal and floating point columns
    Numeric,
    /// `enum` and `simple-enum` columns
    Enum,
    /// `uuid` columns
    Uuid,
    /// Character columns
    Text,
    /// Anything else (timestamps, booleans, json, ...)
    Other,
}

impl ColumnKind {
    /// Classify a store type tag such as `varchar`, `int` or `simple-enum`
    pub fn from_type_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "enum" | "simple-enum" => ColumnKind::Enum,
            "uuid" => ColumnKind::Uuid,
            "int" | "int2" | "int4" | "int8" | "integer" | "smallint" | "bigint" | "tinyint"
            | "mediumint" | "numeric" | "decimal" | "float" | "float4" | "float8" | "double"
            | "double precision" | "real" | "number" => ColumnKind::Numeric,
            "varchar" | "character varying" | "char" | "character" | "nvarchar" | "text"
            | "tinytext" | "mediumtext" | "longtext" | "citext" | "string" => ColumnKind::Text,
            _ => ColumnKind::Other,
        }
    }

    /// Comparison semantics used when filtering on this column.
    ///
    /// Numeric columns fall back to text comparison: whether a filter
    /// value is numeric is decided per value, not from metadata.
    pub fn comparison(&self) -> Comparison {
        match self {
            ColumnKind::Enum => Comparison::Enum,
            ColumnKind::Uuid => Comparison::Uuid,
            ColumnKind::Numeric | ColumnKind::Text | ColumnKind::Other => Comparison::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Enum => "enum",
            ColumnKind::Uuid => "uuid",
            ColumnKind::Text => "text",
            ColumnKind::Other => "other",
        }
    }
}

/// How non-numeric filter values are compared against a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Exact equality on the raw string
    Enum,
    /// Exact equality for scalars, substring for list items
    Uuid,
    /// Case-insensitive substring
    Text,
}

/// A persisted column of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Build a descriptor from a raw store type tag
    pub fn from_type_tag(name: impl Into<String>, tag: &str) -> Self {
        Self::new(name, ColumnKind::from_type_tag(tag))
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Numeric)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Enum)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Uuid)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Other)
    }

    pub fn comparison(&self) -> Comparison {
        self.kind.comparison()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_classification() {
        assert_eq!(ColumnKind::from_type_tag("enum"), ColumnKind::Enum);
        assert_eq!(ColumnKind::from_type_tag("simple-enum"), ColumnKind::Enum);
        assert_eq!(ColumnKind::from_type_tag("UUID"), ColumnKind::Uuid);
        assert_eq!(ColumnKind::from_type_tag("int"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_type_tag("character varying"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_tag("timestamp"), ColumnKind::Other);
    }

    #[test]
    fn test_comparison_ignores_numeric_metadata() {
        assert_eq!(ColumnKind::Numeric.comparison(), Comparison::Text);
        assert_eq!(ColumnKind::Other.comparison(), Comparison::Text);
        assert_eq!(ColumnKind::Enum.comparison(), Comparison::Enum);
        assert_eq!(ColumnKind::Uuid.comparison(), Comparison::Uuid);
    }
}
