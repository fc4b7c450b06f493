//! Per-document SDL generation
//!
//! Each document type `file` yields five object types:
//! `File`, `FileAggregations`, `FileConnection`, `FileEdge` and
//! `FileNode implements Node`. Mapping paths appear as sanitized field names
//! (`donor.age` → `donor__age`).

use crate::aggregations::AggregationShape;
use crate::error::{FacetError, Result};
use crate::mapping::FieldDescriptor;
use crate::schema_builder::is_valid_identifier;
use itertools::Itertools;
use std::collections::HashSet;

/// SDL type name for a document type: `file_centric` → `FileCentric`
pub fn type_name(document_type: &str) -> String {
    document_type
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// SDL scalar for a mapping type. Unrecognised types fall back to `JSON`.
pub fn scalar_for(field_type: &str) -> &'static str {
    match field_type.to_ascii_lowercase().as_str() {
        "boolean" => "Boolean",
        "integer" | "short" | "byte" => "Int",
        "long" | "double" | "float" | "half_float" | "scaled_float" | "unsigned_long" => "Float",
        "keyword" | "text" | "string" | "date" | "date_nanos" | "id" | "ip" | "constant_keyword" | "wildcard" => {
            "String"
        }
        _ => "JSON",
    }
}

/// Reject a name that cannot be used as an SDL identifier
pub fn check_identifier(name: &str, what: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(FacetError::InvalidIdentifier(format!("{} '{}'", what, name)))
    }
}

/// The document entry type
pub fn document_type_def(type_name: &str, has_aggregations: bool) -> String {
    let mut fields = Vec::new();
    if has_aggregations {
        fields.push(format!(
            "aggregations(filters: JSON, aggregations_filter_themselves: Boolean, include_missing: Boolean): {}Aggregations",
            type_name
        ));
    }
    fields.push("configs: ConfigsWithState".to_string());
    fields.push(format!(
        "hits(score: String, offset: Int, sort: [Sort], filters: JSON, before: String, after: String, first: Int, last: Int, searchAfter: JSON, trackTotalHits: Boolean = true): {}Connection",
        type_name
    ));
    fields.push("mapping: JSON".to_string());

    object_type(type_name, None, &fields)
}

/// `<Doc>Aggregations`, one field per aggregatable leaf. `None` when there
/// is nothing to aggregate, since an object type needs at least one field.
pub fn aggregations_type_def(type_name: &str, shapes: &[(String, AggregationShape)]) -> Result<Option<String>> {
    if shapes.is_empty() {
        return Ok(None);
    }

    let fields = shapes
        .iter()
        .map(|(gql_field, shape)| {
            check_identifier(gql_field, "aggregation field")?;
            Ok(format!("{}: {}", gql_field, shape.gql_type()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(object_type(&format!("{}Aggregations", type_name), None, &fields)))
}

pub fn connection_type_defs(type_name: &str) -> Vec<String> {
    vec![
        object_type(
            &format!("{}Connection", type_name),
            None,
            &["total: Int!".to_string(), format!("edges: [{}Edge]", type_name)],
        ),
        object_type(
            &format!("{}Edge", type_name),
            None,
            &["searchAfter: JSON".to_string(), format!("node: {}Node", type_name)],
        ),
    ]
}

/// `<Doc>Node implements Node` with every leaf field of the document.
///
/// A mapping field named `id` is dropped in favour of the interface's `id: ID!`.
/// Two paths that sanitize to the same identifier are an error.
pub fn node_type_def(type_name: &str, fields: &[FieldDescriptor]) -> Result<String> {
    let mut seen = HashSet::new();
    let mut lines = vec!["id: ID!".to_string()];

    for field in fields.iter().filter(|f| f.is_leaf()) {
        let gql_field = field.gql_field();
        if gql_field == "id" {
            continue;
        }
        check_identifier(&gql_field, "field")?;
        if !seen.insert(gql_field.clone()) {
            return Err(FacetError::InvalidIdentifier(format!(
                "'{}' is produced by more than one mapping path",
                gql_field
            )));
        }

        let scalar = scalar_for(&field.field_type);
        let rendered = if field.is_array {
            format!("[{}]", scalar)
        } else {
            scalar.to_string()
        };
        lines.push(format!("{}: {}", gql_field, rendered));
    }

    Ok(object_type(&format!("{}Node", type_name), Some("Node"), &lines))
}

fn object_type(name: &str, implements: Option<&str>, fields: &[String]) -> String {
    let header = match implements {
        Some(interface) => format!("type {} implements {}", name, interface),
        None => format!("type {}", name),
    };
    format!(
        "{} {{\n{}\n}}",
        header,
        fields.iter().map(|f| format!("  {}", f)).join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FlatField;

    fn descriptor(path: &str, field_type: &str, is_array: bool) -> FieldDescriptor {
        FieldDescriptor::from_mapping(&FlatField::new(path, field_type), is_array)
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name("file"), "File");
        assert_eq!(type_name("file_centric"), "FileCentric");
        assert_eq!(type_name("case-data"), "CaseData");
    }

    #[test]
    fn test_node_type_def() {
        let fields = vec![
            descriptor("id", "keyword", false),
            descriptor("donor", "nested", false),
            descriptor("donor.age", "integer", true),
            descriptor("status", "keyword", false),
            descriptor("location", "geo_point", false),
        ];

        let sdl = node_type_def("File", &fields).unwrap();
        assert_eq!(
            sdl,
            "type FileNode implements Node {\n  id: ID!\n  donor__age: [Int]\n  status: String\n  location: JSON\n}"
        );
    }

    #[test]
    fn test_node_type_rejects_bad_identifiers() {
        let bad = vec![descriptor("file-size", "long", false)];
        assert!(matches!(node_type_def("File", &bad), Err(FacetError::InvalidIdentifier(_))));

        let colliding = vec![descriptor("donor.age", "long", false), descriptor("donor__age", "long", false)];
        assert!(node_type_def("File", &colliding).is_err());
    }

    #[test]
    fn test_aggregations_type_def() {
        let shapes = vec![
            ("donor__age".to_string(), AggregationShape::NumericStats),
            ("status".to_string(), AggregationShape::Bucketed),
        ];
        let sdl = aggregations_type_def("File", &shapes).unwrap().unwrap();
        assert_eq!(
            sdl,
            "type FileAggregations {\n  donor__age: NumericAggregations\n  status: Aggregations\n}"
        );
        assert!(aggregations_type_def("File", &[]).unwrap().is_none());
    }

    #[test]
    fn test_document_type_def() {
        let sdl = document_type_def("File", false);
        assert!(!sdl.contains("aggregations("));
        assert!(sdl.contains("): FileConnection"));
        assert!(document_type_def("File", true).contains("): FileAggregations"));
    }
}
