mod common;

use common::compile_fixture;
use facetql::aggregations::{AggregationResult, HitsPage, Stats};
use facetql::sqon::{toggle, FilterNode};
use facetql::FacetError;
use serde_json::json;

#[test]
fn test_request_carries_every_active_facet() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();
    let sqon = toggle(&FilterNode::in_values("data_category", vec![json!("Genomics")]), None).unwrap();

    let request = document.assembler().build_request(sqon.as_ref());
    graphql_parser::parse_query::<String>(&request.query).unwrap_or_else(|e| panic!("{}\n{}", e, request.query));

    assert!(request.query.starts_with("query FileAggregationsQuery($sqon: JSON) {\n  file {\n"));
    assert!(request
        .query
        .contains("aggregations(aggregations_filter_themselves: false, filters: $sqon)"));
    for fragment in document.aggregation_fragments.values() {
        assert!(request.query.contains(fragment.as_str()), "missing {}", fragment);
    }
    assert!(!request.query.contains("donors.gender"));
    assert_eq!(request.variables["sqon"]["content"][0]["content"]["fieldName"], "data_category");

    let body = serde_json::to_value(&request).unwrap();
    assert!(body["query"].is_string());
    assert!(body["variables"].is_object());
}

#[test]
fn test_response_is_keyed_by_dotted_path() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();

    let response = json!({
        "data": {
            "file": {
                "aggregations": {
                    "data_category": { "buckets": [
                        { "doc_count": 40, "key": "Genomics", "key_as_string": null },
                        { "doc_count": 2, "key": "Imaging" }
                    ] },
                    "file_size": { "stats": { "max": 9.5e9, "min": 120.0, "avg": 2.1e8, "sum": 8.4e9, "count": 42 } },
                    "donors__age_at_diagnosis": { "stats": { "max": null, "min": null, "avg": null, "sum": null, "count": 0 } },
                    "analysis__workflow__name": { "buckets": [] }
                }
            }
        }
    });

    let result = document.assembler().reshape_response(&response).unwrap();

    let keys: Vec<&str> = result.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "analysis.workflow.name",
            "data_category",
            "donors.age_at_diagnosis",
            "donors.gender",
            "file_size"
        ]
    );

    match &result["data_category"] {
        AggregationResult::Buckets(buckets) => {
            assert_eq!(buckets[0].key, "Genomics");
            assert_eq!(buckets[0].doc_count, 40);
            assert_eq!(buckets[1].key_as_string, None);
        }
        other => panic!("expected buckets, got {:?}", other),
    }
    match &result["file_size"] {
        AggregationResult::Stats(stats) => assert_eq!(stats.count, 42),
        other => panic!("expected stats, got {:?}", other),
    }

    // absent from the response but still present in the result
    assert_eq!(result["donors.gender"], AggregationResult::Buckets(Vec::new()));
    assert_eq!(result["donors.age_at_diagnosis"], AggregationResult::Stats(Stats::default()));
    assert!(result.values().filter(|r| r.is_empty()).count() >= 3);
}

#[test]
fn test_errors_and_missing_documents() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();
    let assembler = document.assembler();

    let failed = json!({ "errors": [{ "message": "No index was found" }] });
    assert!(matches!(
        assembler.reshape_response(&failed),
        Err(FacetError::AggregationResponse(msg)) if msg.contains("No index was found")
    ));

    let wrong_document = json!({ "data": { "donor": { "aggregations": {} } } });
    assert!(assembler.reshape_response(&wrong_document).is_err());

    let null_aggregations = json!({ "data": { "file": { "aggregations": null } } });
    let result = assembler.reshape_response(&null_aggregations).unwrap();
    assert_eq!(result.len(), 5);
    assert!(result.values().all(AggregationResult::is_empty));
}

#[test]
fn test_hits_request_selects_visible_columns() {
    let schema = compile_fixture("file");
    let document = schema.document("file").unwrap();
    let sqon = toggle(&FilterNode::gte("file_size", 1024), None).unwrap();

    let request = document.hits_request(sqon.as_ref(), HitsPage { first: 50, offset: 100 });
    graphql_parser::parse_query::<String>(&request.query).unwrap_or_else(|e| panic!("{}\n{}", e, request.query));

    assert!(request.query.starts_with("query FileHitsQuery("));
    for selection in ["id", "file_id", "file_name", "file_size", "donors__donor_id", "created_at"] {
        assert!(
            request.query.contains(&format!("            {}\n", selection)),
            "missing column {}",
            selection
        );
    }
    assert!(!request.query.contains("analysis__workflow__version"));

    assert_eq!(request.variables["first"], 50);
    assert_eq!(request.variables["offset"], 100);
    assert_eq!(request.variables["sort"], json!([{ "fieldName": "created_at", "order": "desc" }]));
    assert_eq!(request.variables["sqon"]["op"], "and");
}

#[test]
fn test_request_without_active_facets_parses() {
    let mut project = common::load_fixture("file");
    for facet in project.facets.aggregations.iter_mut() {
        facet.is_active = false;
    }
    let schema = facetql::SchemaCompiler::default().compile_project(&project).unwrap();
    let document = schema.document("file").unwrap();
    assert!(document.facets.is_empty());

    let request = document.assembler().build_request(None);
    graphql_parser::parse_query::<String>(&request.query).unwrap_or_else(|e| panic!("{}\n{}", e, request.query));
    assert!(!request.query.contains("aggregations("));
}
