//! Data Access Configuration
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid config.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{DataAccessError, DataResult};
use crate::naming::DataAccessNaming;
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::schema::MetadataContainer;

/// Data access configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAccessConfig {
    /// Application (subsystem) name of the data access instance (default: "")
    #[serde(default)]
    pub name: String,

    /// Logical entity name to storage name
    #[serde(default)]
    pub naming: BTreeMap<String, String>,

    /// Minimum log severity (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// Reject unknown schema members when metadata is available (default: true)
    #[serde(default = "default_strict_schema")]
    pub strict_schema: bool,

    /// Entity metadata file (JSON array); relative paths resolve against the config file
    #[serde(default)]
    pub metadata: Option<PathBuf>,
}

fn default_log_level() -> Severity {
    Severity::Info
}

fn default_strict_schema() -> bool {
    true
}

impl Default for DataAccessConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            naming: BTreeMap::new(),
            log_level: default_log_level(),
            strict_schema: default_strict_schema(),
            metadata: None,
        }
    }
}

impl DataAccessConfig {
    /// Create a config with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DataAccessError::configuration(format!("Invalid config JSON: {}", e)))?;

        if let Some((logical, _)) = config
            .naming
            .iter()
            .find(|(logical, storage)| logical.trim().is_empty() || storage.trim().is_empty())
        {
            return Err(DataAccessError::configuration(format!(
                "naming entry '{}' must map a non-empty name to a non-empty name",
                logical
            )));
        }

        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> DataResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DataAccessError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config = Self::from_json_str(&content)?;
        let resolved = match (&config.metadata, path.parent()) {
            (Some(metadata), Some(dir)) if metadata.is_relative() => Some(dir.join(metadata)),
            _ => None,
        };
        if resolved.is_some() {
            config.metadata = resolved;
        }

        let path_text = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path_text.as_str()), ("name", config.name.as_str())],
        );
        Ok(config)
    }

    /// Naming resolver built from the `naming` table
    pub fn naming(&self) -> DataAccessNaming {
        self.naming
            .iter()
            .map(|(logical, storage)| (logical.clone(), storage.clone()))
            .collect()
    }

    /// Entity metadata for strict schema parsing
    ///
    /// `None` when strict parsing is off or no metadata file is configured.
    pub fn load_metadata(&self) -> DataResult<Option<Arc<MetadataContainer>>> {
        match (&self.metadata, self.strict_schema) {
            (Some(path), true) => Ok(Some(Arc::new(MetadataContainer::load(path)?))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::Naming;

    #[test]
    fn test_default_config() {
        let config = DataAccessConfig::default();
        assert_eq!(config.name, "");
        assert_eq!(config.log_level, Severity::Info);
        assert!(config.strict_schema);
        assert!(config.naming.is_empty());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        assert_eq!(
            DataAccessConfig::from_json_str("{}").unwrap(),
            DataAccessConfig::default()
        );
    }

    #[test]
    fn test_parse_full() {
        let json = r#"{
            "name": "sales",
            "naming": {"Order": "sales_orders"},
            "log_level": "warn",
            "strict_schema": false
        }"#;
        let config = DataAccessConfig::from_json_str(json).unwrap();
        assert_eq!(config.name, "sales");
        assert_eq!(config.log_level, Severity::Warn);
        assert!(!config.strict_schema);
        assert_eq!(config.naming().resolve("Order").unwrap(), "sales_orders");
    }

    #[test]
    fn test_rejects_blank_naming_entry() {
        let err = DataAccessConfig::from_json_str(r#"{"naming": {"Order": " "}}"#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = DataAccessConfig::from_json_str("{name:").unwrap_err();
        assert_eq!(err.code(), "DATA_CONFIGURATION");
    }
}
