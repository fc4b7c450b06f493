//! Mapping Flattener
//!
//! Walks a nested document mapping (`{ field: { type?, properties? } }`) and
//! produces one dotted-path record per node, depth-first, parents before children.

use crate::error::{FacetError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::PATH_SEPARATOR;

/// Type recorded for a node that has `properties` but no declared type
pub const DEFAULT_OBJECT_TYPE: &str = "object";

/// Type recorded for a leaf with no declared type
pub const UNKNOWN_TYPE: &str = "unknown";

/// Type of a nested (separately indexed) object node
pub const NESTED_TYPE: &str = "nested";

/// A single flattened mapping record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatField {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl FlatField {
    pub fn new(field: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            field_type: field_type.into(),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.field_type == NESTED_TYPE
    }

    pub fn is_object(&self) -> bool {
        self.field_type == DEFAULT_OBJECT_TYPE
    }

    /// Object and nested nodes group children and hold no value of their own
    pub fn is_leaf(&self) -> bool {
        !self.is_object() && !self.is_nested()
    }
}

/// Unwrap the properties object from a raw mapping document.
///
/// Accepts `{ mappings: { properties } }`, `{ properties }` or a bare
/// properties object. A `mappings` or `properties` key declaring a string
/// `type` is a field of a bare properties object, not an envelope.
pub fn mapping_properties(mapping: &Value) -> Result<&Map<String, Value>> {
    let root = mapping.as_object().ok_or_else(|| FacetError::MalformedMapping {
        path: String::new(),
        reason: format!("mapping root must be an object, found {}", json_kind(mapping)),
    })?;

    if let Some(inner) = root.get("mappings") {
        let envelope = inner.as_object().map_or(false, |obj| {
            !declares_type(obj) && obj.get("properties").map_or(false, Value::is_object)
        });
        if envelope {
            return mapping_properties(inner);
        }
    }

    match root.get("properties") {
        Some(Value::Object(properties)) if !declares_type(properties) => Ok(properties),
        _ => Ok(root),
    }
}

fn declares_type(node: &Map<String, Value>) -> bool {
    node.get("type").map_or(false, Value::is_string)
}

/// Flatten a properties object into dotted-path records
pub fn flatten_mapping(properties: &Map<String, Value>) -> Result<Vec<FlatField>> {
    let mut fields = Vec::new();
    flatten_into(properties, "", &mut fields)?;

    // Keys are unique per level, but a key containing a dot can still collide
    // with a path produced by nesting.
    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.field.as_str()) {
            return Err(FacetError::MalformedMapping {
                path: field.field.clone(),
                reason: "path is produced more than once".to_string(),
            });
        }
    }

    Ok(fields)
}

/// Dotted paths of every `nested` node, in mapping order
pub fn nested_fields(properties: &Map<String, Value>) -> Result<Vec<String>> {
    Ok(flatten_mapping(properties)?
        .into_iter()
        .filter(|f| f.is_nested())
        .map(|f| f.field)
        .collect())
}

fn flatten_into(properties: &Map<String, Value>, parent: &str, out: &mut Vec<FlatField>) -> Result<()> {
    for (name, data) in properties {
        let path = join_path(parent, name);

        let node = data.as_object().ok_or_else(|| FacetError::MalformedMapping {
            path: path.clone(),
            reason: format!("expected an object, found {}", json_kind(data)),
        })?;

        let declared = match node.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(t)) => Some(t.as_str()),
            Some(other) => {
                return Err(FacetError::MalformedMapping {
                    path,
                    reason: format!("'type' must be a string, found {}", json_kind(other)),
                })
            }
        };

        match node.get("properties") {
            None | Some(Value::Null) => {
                out.push(FlatField::new(path, declared.unwrap_or(UNKNOWN_TYPE)));
            }
            Some(Value::Object(children)) => {
                out.push(FlatField::new(path.clone(), declared.unwrap_or(DEFAULT_OBJECT_TYPE)));
                flatten_into(children, &path, out)?;
            }
            Some(other) => {
                return Err(FacetError::MalformedMapping {
                    path,
                    reason: format!("'properties' must be an object, found {}", json_kind(other)),
                })
            }
        }
    }

    Ok(())
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, name)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
