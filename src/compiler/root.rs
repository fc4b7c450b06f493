//! Root query type, document type enum and schema definition

use itertools::Itertools;

use crate::schema_builder::create_enum;

/// Fields every `Root` carries regardless of document types
const ROOT_FIELDS: [&str; 4] = [
    "node(id: ID!): Node",
    "viewer: Root",
    "query(query: String, types: [String]): QueryResults",
    "hasValidConfig(documentType: String!, index: String!): Boolean",
];

/// Names of the fixed `Root` fields, which no document type may reuse
pub fn reserved_root_fields() -> impl Iterator<Item = &'static str> {
    ROOT_FIELDS
        .iter()
        .filter_map(|f| f.split(|c: char| c == '(' || c == ':').next())
}

pub const SCHEMA_DEFINITION: &str = "schema {\n  query: Root\n}";

/// `type Root` with one field per document type, `file: File`
pub fn root_type_def(documents: &[(String, String)]) -> String {
    let fields = ROOT_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(
            documents
                .iter()
                .map(|(document_type, type_name)| format!("{}: {}", document_type, type_name)),
        )
        .map(|f| format!("  {}", f))
        .join("\n");

    format!("type Root {{\n{}\n}}", fields)
}

pub fn document_type_enum(documents: &[(String, String)]) -> String {
    let values: Vec<&str> = documents.iter().map(|(document_type, _)| document_type.as_str()).collect();
    create_enum("DocumentType", &values)
}
