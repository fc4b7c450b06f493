mod common;

use common::{compile_fixture, load_fixture, parsed_object_fields, parsed_type_names, type_block};
use facetql::aggregations::AggregationShape;
use facetql::config::CompilerSettings;
use facetql::schema_builder::extract_type_names;
use facetql::{FacetError, ProjectConfig, SchemaCompiler, SchemaStore};
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_fixture_compiles() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();

    assert_eq!(document.type_name, "File");
    assert_eq!(document.index.as_deref(), Some("file_centric"));
    assert_eq!(document.nested_fields, vec!["donors"]);

    let facet_paths: Vec<&str> = document.facets.iter().map(|f| f.path()).collect();
    assert_eq!(
        facet_paths,
        vec![
            "data_category",
            "file_size",
            "donors.age_at_diagnosis",
            "donors.gender",
            "analysis.workflow.name"
        ]
    );
    assert_eq!(document.facets[1].shape, AggregationShape::NumericStats);
    assert!(!document.facets[3].show);

    let fragment_keys: Vec<&String> = document.aggregation_fragments.keys().collect();
    assert_eq!(fragment_keys.len(), 5);
    assert_eq!(
        document.aggregation_fragments["analysis.workflow.name"],
        "analysis__workflow__name { buckets { doc_count key_as_string key } }"
    );
}

#[test]
fn test_dangling_references_are_recorded_not_fatal() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();

    assert_eq!(document.dangling.len(), 2);
    assert!(document.dangling.iter().any(|d| d.contains("'sample.type'") && d.contains("extended")));
    assert!(document.dangling.iter().any(|d| d.contains("'sample__type'") && d.contains("facets")));
    assert!(document.field("sample.type").is_none());
}

#[test]
fn test_sdl_declares_each_type_once() {
    let schema = compile_fixture("file");
    let names = extract_type_names(&schema.sdl);

    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len(), "duplicate declarations in {:?}", names);

    for expected in [
        "JSON",
        "Node",
        "Sort",
        "Aggregations",
        "NumericAggregations",
        "ConfigsWithState",
        "DocumentType",
        "Root",
        "File",
        "FileAggregations",
        "FileConnection",
        "FileEdge",
        "FileNode",
    ] {
        assert!(names.iter().any(|n| n == expected), "{} not declared", expected);
    }
}

#[test]
fn test_sdl_category_order() {
    let sdl = compile_fixture("file").sdl;
    let position = |needle: &str| sdl.find(needle).unwrap_or_else(|| panic!("{} missing", needle));

    assert!(sdl.starts_with("scalar JSON"));
    assert!(position("enum DocumentType") < position("interface Node"));
    assert!(position("interface Node") < position("type Root"));
    assert!(position("type Root") < position("schema {"));
    assert!(sdl.ends_with("schema {\n  query: Root\n}"));
}

#[test]
fn test_document_types() {
    let sdl = compile_fixture("file").sdl;

    let root = type_block(&sdl, "Root");
    assert!(root.contains("  file: File\n"));
    assert!(root.contains("  hasValidConfig(documentType: String!, index: String!): Boolean\n"));

    let node = type_block(&sdl, "FileNode");
    assert!(node.starts_with("type FileNode implements Node {\n  id: ID!\n"));
    assert!(node.contains("  file_size: Float\n"));
    assert!(node.contains("  is_public: Boolean\n"));
    assert!(node.contains("  analysis__workflow__name: String\n"));
    assert!(node.contains("  donors__age_at_diagnosis: [Int]\n"));
    assert!(node.contains("  donors__notes: [String]\n"));
    assert!(node.contains("  location: JSON\n"));
    assert!(!node.contains("donors: "));

    let aggregations = type_block(&sdl, "FileAggregations");
    assert!(aggregations.contains("  file_size: NumericAggregations\n"));
    assert!(aggregations.contains("  donors__gender: Aggregations\n"));
    assert!(aggregations.contains("  created_at: Aggregations\n"));
    // excluded types and unclassifiable leaves
    assert!(!aggregations.contains("description"));
    assert!(!aggregations.contains("donors__notes"));
    assert!(!aggregations.contains("location"));

    let connection = type_block(&sdl, "FileConnection");
    assert_eq!(connection, "type FileConnection {\n  total: Int!\n  edges: [FileEdge]\n}");
}

#[test]
fn test_compile_is_byte_identical() {
    let compiler = SchemaCompiler::default();
    let project = load_fixture("file");
    let first = compiler.compile_project(&project).unwrap();
    let second = compiler.compile_project(&project).unwrap();
    assert_eq!(first.sdl, second.sdl);
}

#[test]
fn test_custom_excluded_types() {
    let compiler = SchemaCompiler::new(CompilerSettings::with_excluded_types(Vec::<String>::new()));
    let schema = compiler.compile_project(&load_fixture("file")).unwrap();
    let document = schema.document("file").unwrap();

    assert!(document.aggregation_fragments.contains_key("description"));
    assert!(type_block(&schema.sdl, "FileAggregations").contains("  donors__notes: Aggregations\n"));
}

#[test]
fn test_unknown_display_type_fails_whole_compile() {
    let good = load_fixture("file");
    let mut bad = good.clone();
    bad.facets.aggregations[4].display_type = Some("geo_shape".to_string());

    let store = SchemaStore::new(SchemaCompiler::default(), &[good]).unwrap();
    let before = store.current();

    match store.recompile(&[bad]) {
        Err(FacetError::UnknownDisplayType { display_type, field }) => {
            assert_eq!(display_type, "geo_shape");
            assert_eq!(field.as_deref(), Some("analysis.workflow.name"));
        }
        other => panic!("expected UnknownDisplayType, got {:?}", other.map(|s| s.sdl.len())),
    }
    assert!(Arc::ptr_eq(&before, &store.current()));
}

#[test]
fn test_malformed_mapping_names_path() {
    let mut project = load_fixture("file");
    project.mapping["mappings"]["properties"]["analysis"]["properties"]["workflow"]["properties"]["name"] =
        serde_json::json!("keyword");

    match SchemaCompiler::default().compile_project(&project) {
        Err(FacetError::MalformedMapping { path, .. }) => assert_eq!(path, "analysis.workflow.name"),
        other => panic!("expected MalformedMapping, got {:?}", other.map(|s| s.sdl.len())),
    }
}

#[test]
fn test_sdl_parses_as_graphql() {
    let mut donor = ProjectConfig::new(
        "donor_centric",
        serde_json::json!({ "mappings": { "properties": {
            "donor_id": { "type": "keyword" },
            "legacy__code": { "type": "keyword" },
            "diagnoses": { "type": "nested", "properties": { "age": { "type": "integer" } } }
        } } }),
    );
    donor.index = Some("donor_centric".to_string());

    let schema = SchemaCompiler::default()
        .compile(&[load_fixture("file"), donor])
        .unwrap();

    let names = parsed_type_names(&schema.sdl);
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len(), "duplicate declarations in {:?}", names);
    assert!(names.iter().any(|n| n == "DonorCentricNode"));

    let root_fields = parsed_object_fields(&schema.sdl, "Root");
    let unique: HashSet<&String> = root_fields.iter().collect();
    assert_eq!(unique.len(), root_fields.len(), "duplicate Root fields in {:?}", root_fields);
    assert!(root_fields.iter().any(|f| f == "donor_centric"));
}

#[test]
fn test_built_in_names_are_not_document_types() {
    let compiler = SchemaCompiler::default();
    let mapping = serde_json::json!({ "status": { "type": "keyword" } });

    for document_type in ["node", "query", "stats", "bucket", "file_size"] {
        match compiler.compile_project(&ProjectConfig::new(document_type, mapping.clone())) {
            Err(FacetError::InvalidIdentifier(msg)) => assert!(msg.contains(document_type), "{}", msg),
            other => panic!("{} compiled: {:?}", document_type, other.map(|s| s.sdl)),
        }
    }
}
