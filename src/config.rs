//! Project Configuration
//!
//! A project is one document type described by a directory of JSON files:
//! `base.json`, `mapping.json`, and optionally `extended.json`, `facets.json`
//! and `table.json`.

use crate::error::{FacetError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mapping types left out of aggregations by default
pub const DEFAULT_EXCLUDED_TYPES: [&str; 2] = ["id", "text"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseConfig {
    pub document_type: String,
    #[serde(default)]
    pub index: Option<String>,
}

/// Operator-supplied display metadata for one mapping path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedFieldConfig {
    pub field_name: String,
    pub display_name: Option<String>,
    pub display_type: Option<String>,
    pub is_active: Option<bool>,
    pub show: Option<bool>,
    pub sortable: Option<bool>,
    pub is_array: Option<bool>,
    pub unit: Option<String>,
    pub display_values: Option<Value>,
    pub query: Option<String>,
}

/// One entry of the facet panel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetConfig {
    pub field_name: String,
    pub display_name: Option<String>,
    pub display_type: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub show: bool,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetsConfig {
    #[serde(default)]
    pub aggregations: Vec<FacetConfig>,
}

/// One entry of the results table configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub field_name: String,
    pub accessor: Option<String>,
    pub can_change_show: Option<bool>,
    pub display_format: Option<String>,
    pub display_name: Option<String>,
    pub display_type: Option<String>,
    pub display_values: Option<Value>,
    pub id: Option<String>,
    pub is_array: Option<bool>,
    pub json_path: Option<String>,
    pub query: Option<String>,
    pub show: Option<bool>,
    pub sortable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSorting {
    pub field_name: String,
    #[serde(default)]
    pub desc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub default_sorting: Vec<ColumnSorting>,
    pub max_results_window: Option<u32>,
    pub row_id_field_name: Option<String>,
}

/// Everything needed to compile one document type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub document_type: String,
    pub index: Option<String>,
    pub mapping: Value,
    pub extended: Vec<ExtendedFieldConfig>,
    pub facets: FacetsConfig,
    pub table: TableConfig,
}

impl ProjectConfig {
    pub fn new(document_type: impl Into<String>, mapping: Value) -> Self {
        Self {
            document_type: document_type.into(),
            index: None,
            mapping,
            extended: Vec::new(),
            facets: FacetsConfig::default(),
            table: TableConfig::default(),
        }
    }

    pub fn with_extended(mut self, extended: Vec<ExtendedFieldConfig>) -> Self {
        self.extended = extended;
        self
    }

    pub fn with_facets(mut self, facets: FacetsConfig) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.table = table;
        self
    }

    /// Load a project from a config directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        debug!("Loading project config from {}", dir.display());

        let base: BaseConfig = Self::load_json(dir.join("base.json"))?;
        let mapping: Value = Self::load_json(dir.join("mapping.json"))?;

        let extended: Vec<ExtendedFieldConfig> = match Self::load_optional(dir.join("extended.json"))? {
            Some(raw) => serde_json::from_value(unwrap_section(raw, "extended"))?,
            None => Vec::new(),
        };
        let facets: FacetsConfig = match Self::load_optional(dir.join("facets.json"))? {
            Some(raw) => serde_json::from_value(unwrap_section(raw, "facets"))?,
            None => FacetsConfig::default(),
        };
        let table: TableConfig = match Self::load_optional(dir.join("table.json"))? {
            Some(raw) => serde_json::from_value(unwrap_section(raw, "table"))?,
            None => TableConfig::default(),
        };

        Ok(Self {
            document_type: base.document_type,
            index: base.index,
            mapping,
            extended,
            facets,
            table,
        })
    }

    fn load_json<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| FacetError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| FacetError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn load_optional(path: PathBuf) -> Result<Option<Value>> {
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(None);
        }
        Self::load_json(path).map(Some)
    }
}

/// Config files may wrap their payload in a key named after the section
fn unwrap_section(raw: Value, key: &str) -> Value {
    match raw {
        Value::Object(mut obj) if obj.contains_key(key) => obj.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

/// Compiler tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    /// Mapping types pruned from aggregations and facets
    pub excluded_types: Vec<String>,
}

impl CompilerSettings {
    pub fn with_excluded_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_types: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self::with_excluded_types(DEFAULT_EXCLUDED_TYPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("facetql-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_project_with_wrapped_sections() {
        let dir = temp_dir("wrapped");
        std::fs::write(dir.join("base.json"), r#"{"documentType": "file", "index": "file_centric"}"#).unwrap();
        std::fs::write(
            dir.join("mapping.json"),
            json!({ "mappings": { "properties": { "file_size": { "type": "long" } } } }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join("extended.json"),
            json!({ "extended": [{ "fieldName": "file_size", "displayName": "File Size", "displayType": "bytes" }] })
                .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join("facets.json"),
            json!({ "facets": { "aggregations": [{ "fieldName": "file_size", "isActive": true, "show": true }] } })
                .to_string(),
        )
        .unwrap();

        let project = ProjectConfig::load(&dir).unwrap();
        assert_eq!(project.document_type, "file");
        assert_eq!(project.index.as_deref(), Some("file_centric"));
        assert_eq!(project.extended[0].display_type.as_deref(), Some("bytes"));
        assert!(project.facets.aggregations[0].is_active);
        assert!(project.table.columns.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_bare_sections() {
        let dir = temp_dir("bare");
        std::fs::write(dir.join("base.json"), r#"{"documentType": "donor"}"#).unwrap();
        std::fs::write(dir.join("mapping.json"), r#"{"age": {"type": "integer"}}"#).unwrap();
        std::fs::write(
            dir.join("table.json"),
            json!({ "columns": [{ "fieldName": "age", "show": true }], "rowIdFieldName": "id" }).to_string(),
        )
        .unwrap();

        let project = ProjectConfig::load(&dir).unwrap();
        assert_eq!(project.table.columns.len(), 1);
        assert_eq!(project.table.row_id_field_name.as_deref(), Some("id"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_base_is_config_error() {
        let dir = temp_dir("missing");
        let result = ProjectConfig::load(&dir);
        assert!(matches!(result, Err(FacetError::Config(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_settings() {
        let settings = CompilerSettings::default();
        assert_eq!(settings.excluded_types, vec!["id".to_string(), "text".to_string()]);
    }
}
