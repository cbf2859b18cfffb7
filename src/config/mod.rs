//! # Configuration
//!
//! JSON configuration file for the CLI and HTTP server: bind address,
//! CORS origins, log level, and the entity catalogue with seed rows for
//! the in-memory store.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::metadata::{ColumnDescriptor, EntityMetadata, RelationDescriptor};
use crate::observability::Severity;
use crate::store::{MemoryStore, MemoryTable};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config: {0}")]
    Read(String),

    /// File is not valid configuration JSON
    #[error("Invalid config JSON: {0}")]
    Parse(String),

    /// Parsed but inconsistent
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins. Empty means any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Entity catalogue
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

/// One entity: schema, query defaults and seed rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,

    pub columns: Vec<ColumnConfig>,

    #[serde(default)]
    pub relations: Vec<RelationDescriptor>,

    /// Columns searched in search mode
    #[serde(default)]
    pub search_columns: Vec<String>,

    /// Relations loaded when the caller names none
    #[serde(default)]
    pub default_relations: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Value>,
}

/// Column name plus the store type tag (`varchar`, `uuid`, `simple-enum`, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

/// Per-entity query defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityProfile {
    pub search_columns: Vec<String>,
    pub default_relations: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(), // Next.js dev server
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            log_level: default_log_level(),
            entities: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }
        self.min_severity()?;

        let mut names = HashSet::new();
        for entity in &self.entities {
            if entity.name.trim().is_empty() {
                return Err(ConfigError::Invalid("entity name cannot be empty".to_string()));
            }
            if !names.insert(entity.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "entity '{}' is declared twice",
                    entity.name
                )));
            }
        }

        for entity in &self.entities {
            let columns: HashSet<&str> = entity.columns.iter().map(|c| c.name.as_str()).collect();

            for relation in &entity.relations {
                if !names.contains(relation.target.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "relation '{}.{}' targets unknown entity '{}'",
                        entity.name, relation.name, relation.target
                    )));
                }
            }
            for column in &entity.search_columns {
                if !columns.contains(column.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "search column '{}' is not a column of '{}'",
                        column, entity.name
                    )));
                }
            }
            for row in &entity.rows {
                if !row.is_object() {
                    return Err(ConfigError::Invalid(format!(
                        "rows of '{}' must be JSON objects",
                        entity.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Configured minimum log severity
    pub fn min_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| ConfigError::Invalid(e))
    }

    /// `host:port`
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// In-memory store seeded with every configured entity
    pub fn build_store(&self) -> MemoryStore {
        let store = MemoryStore::new();
        for entity in &self.entities {
            let columns = entity
                .columns
                .iter()
                .map(|c| ColumnDescriptor::from_type_tag(c.name.clone(), &c.type_tag))
                .collect();
            let metadata = EntityMetadata::new(entity.name.clone(), columns)
                .with_relations(entity.relations.iter().cloned());
            store.insert_table(MemoryTable::new(metadata).with_rows(entity.rows.iter().cloned()));
        }
        store
    }

    /// Query defaults keyed by entity name
    pub fn profiles(&self) -> HashMap<String, EntityProfile> {
        self.entities
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    EntityProfile {
                        search_columns: e.search_columns.clone(),
                        default_relations: e.default_relations.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnKind, MetadataProvider};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "port": 9000,
            "entities": [
                {
                    "name": "room",
                    "columns": [
                        {"name": "id", "type": "uuid"},
                        {"name": "name", "type": "varchar"}
                    ],
                    "search_columns": ["name"],
                    "rows": [{"id": "r1", "name": "A-101"}]
                },
                {
                    "name": "class",
                    "columns": [
                        {"name": "id", "type": "int"},
                        {"name": "status", "type": "simple-enum"},
                        {"name": "roomId", "type": "uuid"}
                    ],
                    "relations": [
                        {"name": "room", "target": "room", "local_column": "roomId"}
                    ],
                    "default_relations": ["room"]
                }
            ]
        })
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert!(!config.cors_origins.is_empty());
        assert!(config.entities.is_empty());
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_build_store() {
        let config = Config::from_json_str(&sample().to_string()).unwrap();
        let store = config.build_store();

        let class = store.metadata("class").unwrap();
        assert_eq!(class.column("status").unwrap().kind, ColumnKind::Enum);
        assert_eq!(class.column("id").unwrap().kind, ColumnKind::Numeric);
        assert!(class.relation("room").is_some());

        let profiles = config.profiles();
        assert_eq!(profiles["room"].search_columns, vec!["name".to_string()]);
        assert_eq!(profiles["class"].default_relations, vec!["room".to_string()]);
    }

    #[test]
    fn test_validation_errors() {
        let mut bad = sample();
        bad["port"] = json!(0);
        assert!(matches!(
            Config::from_json_str(&bad.to_string()),
            Err(ConfigError::Invalid(_))
        ));

        let mut bad = sample();
        bad["log_level"] = json!("chatty");
        assert!(Config::from_json_str(&bad.to_string()).is_err());

        let mut bad = sample();
        bad["entities"][1]["relations"][0]["target"] = json!("building");
        assert!(Config::from_json_str(&bad.to_string()).is_err());

        let mut bad = sample();
        bad["entities"][0]["search_columns"] = json!(["floor"]);
        assert!(Config::from_json_str(&bad.to_string()).is_err());

        let mut bad = sample();
        bad["entities"][1]["name"] = json!("room");
        assert!(Config::from_json_str(&bad.to_string()).is_err());

        assert!(matches!(
            Config::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
