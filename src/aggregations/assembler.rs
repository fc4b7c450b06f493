//! Aggregation Query Assembler
//!
//! Builds one combined aggregation request for the active facets and maps the
//! response, keyed by SDL-safe identifiers, back onto dotted field paths.
//! Every facet is present in the reshaped result, with empty buckets or
//! empty stats when nothing matched, so the key set is stable across requests.

use crate::config::ColumnSorting;
use crate::error::{FacetError, Result};
use crate::mapping::{ColumnField, FacetField};
use crate::sqon::SqonNode;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::AggregationShape;

/// A GraphQL request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub doc_count: u64,
    #[serde(deserialize_with = "string_or_scalar")]
    pub key: String,
    #[serde(default)]
    pub key_as_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub sum: Option<f64>,
    #[serde(deserialize_with = "null_as_zero")]
    pub count: u64,
}

/// Aggregation data for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationResult {
    Buckets(Vec<Bucket>),
    Stats(Stats),
}

impl AggregationResult {
    pub fn empty(shape: AggregationShape) -> Self {
        match shape {
            AggregationShape::Bucketed => AggregationResult::Buckets(Vec::new()),
            AggregationShape::NumericStats => AggregationResult::Stats(Stats::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AggregationResult::Buckets(buckets) => buckets.is_empty(),
            AggregationResult::Stats(stats) => stats.count == 0,
        }
    }
}

/// Assembles aggregation requests for one document type
pub struct AggregationQueryAssembler<'a> {
    document_type: &'a str,
    facets: &'a [FacetField],
}

impl<'a> AggregationQueryAssembler<'a> {
    pub fn new(document_type: &'a str, facets: &'a [FacetField]) -> Self {
        Self {
            document_type,
            facets,
        }
    }

    /// One request fetching every facet's aggregation under the current SQON.
    ///
    /// With no active facets there is nothing to select under `aggregations`,
    /// so the request only asks for the document's `__typename` and declares
    /// no variables.
    pub fn build_request(&self, sqon: Option<&SqonNode>) -> GraphqlRequest {
        let (params, body) = if self.facets.is_empty() {
            ("", "    __typename".to_string())
        } else {
            let selections = self
                .facets
                .iter()
                .map(|facet| format!("        {}", facet.fragment))
                .join("\n");
            let body = format!(
                "    aggregations(aggregations_filter_themselves: false, filters: $sqon) {{\n{}\n    }}",
                selections
            );
            ("($sqon: JSON)", body)
        };

        let query = format!(
            "query {name}AggregationsQuery{params} {{\n  {doc} {{\n{body}\n  }}\n}}",
            name = capitalize(self.document_type),
            params = params,
            doc = self.document_type,
            body = body,
        );

        debug!(
            "Assembled aggregation query for {} with {} facets",
            self.document_type,
            self.facets.len()
        );

        GraphqlRequest {
            query,
            variables: json!({ "sqon": sqon }),
        }
    }

    /// Reshape a response into a map keyed by dotted field path
    pub fn reshape_response(&self, response: &Value) -> Result<BTreeMap<String, AggregationResult>> {
        let aggregations = self.locate_aggregations(response)?;

        let mut reshaped = BTreeMap::new();
        let mut expected = HashSet::new();
        for facet in self.facets {
            let gql_field = facet.gql_field();
            let raw = aggregations.and_then(|aggs| aggs.get(&gql_field));
            let result = parse_entry(facet.shape, facet.path(), raw)?;
            reshaped.insert(facet.path().to_string(), result);
            expected.insert(gql_field);
        }

        if let Some(aggs) = aggregations {
            for key in aggs.keys().filter(|k| !expected.contains(*k)) {
                debug!("Ignoring aggregation '{}' with no active facet", key);
            }
        }

        Ok(reshaped)
    }

    fn locate_aggregations<'v>(&self, response: &'v Value) -> Result<Option<&'v Map<String, Value>>> {
        let data = match response.get("data") {
            Some(Value::Null) | None if response.get("errors").is_some() => {
                return Err(FacetError::AggregationResponse(format!(
                    "request failed: {}",
                    error_messages(response)
                )));
            }
            Some(data) => data,
            None => response,
        };

        let document = data.get(self.document_type).ok_or_else(|| {
            FacetError::AggregationResponse(format!(
                "response has no '{}' document type",
                self.document_type
            ))
        })?;

        match document.get("aggregations") {
            Some(Value::Object(aggs)) => Ok(Some(aggs)),
            Some(Value::Null) => Ok(None),
            Some(_) => Err(FacetError::AggregationResponse(
                "'aggregations' is not an object".to_string(),
            )),
            None if self.facets.is_empty() => Ok(None),
            None => Err(FacetError::AggregationResponse(format!(
                "'{}' has no aggregations",
                self.document_type
            ))),
        }
    }
}

/// Paging options for a hits request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitsPage {
    pub first: u32,
    pub offset: u32,
}

impl Default for HitsPage {
    fn default() -> Self {
        Self { first: 20, offset: 0 }
    }
}

/// A table-data request selecting the visible columns under the current SQON
pub fn build_hits_request(
    document_type: &str,
    columns: &[ColumnField],
    sorting: &[ColumnSorting],
    sqon: Option<&SqonNode>,
    page: HitsPage,
) -> GraphqlRequest {
    let selections = std::iter::once("id".to_string())
        .chain(columns.iter().filter(|c| c.show).map(ColumnField::selection))
        .unique()
        .map(|s| format!("            {}", s))
        .join("\n");

    let query = format!(
        "query {name}HitsQuery($sqon: JSON, $first: Int, $offset: Int, $sort: [Sort]) {{\n  {doc} {{\n    hits(filters: $sqon, first: $first, offset: $offset, sort: $sort) {{\n      total\n      edges {{\n        node {{\n{selections}\n        }}\n      }}\n    }}\n  }}\n}}",
        name = capitalize(document_type),
        doc = document_type,
        selections = selections,
    );

    let sort: Vec<Value> = sorting
        .iter()
        .map(|s| json!({ "fieldName": s.field_name, "order": if s.desc { "desc" } else { "asc" } }))
        .collect();

    GraphqlRequest {
        query,
        variables: json!({
            "sqon": sqon,
            "first": page.first,
            "offset": page.offset,
            "sort": sort,
        }),
    }
}

fn parse_entry(shape: AggregationShape, path: &str, raw: Option<&Value>) -> Result<AggregationResult> {
    let key = match shape {
        AggregationShape::Bucketed => "buckets",
        AggregationShape::NumericStats => "stats",
    };

    let payload = match raw.and_then(|v| v.get(key)) {
        None | Some(Value::Null) => return Ok(AggregationResult::empty(shape)),
        Some(payload) => payload.clone(),
    };

    let invalid = |e: serde_json::Error| {
        FacetError::AggregationResponse(format!("invalid {} for '{}': {}", key, path, e))
    };

    match shape {
        AggregationShape::Bucketed => serde_json::from_value(payload)
            .map(AggregationResult::Buckets)
            .map_err(invalid),
        AggregationShape::NumericStats => serde_json::from_value(payload)
            .map(AggregationResult::Stats)
            .map_err(invalid),
    }
}

fn error_messages(response: &Value) -> String {
    match response.get("errors") {
        Some(Value::Array(errors)) => errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string())
            })
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_or_scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
