//! Aggregation Type Classifier
//!
//! Maps a field's display type to the shape of aggregation it supports.
//! The lookup is a fixed table; an unmapped display type is an error so a
//! malformed aggregation query is never produced.

use crate::error::{FacetError, Result};
use serde::{Deserialize, Serialize};

/// Shape of an aggregation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationShape {
    /// Discrete value buckets with document counts
    Bucketed,
    /// `{ min max avg sum count }` over a numeric field
    NumericStats,
}

use AggregationShape::{Bucketed, NumericStats};

/// Display type → aggregation shape. Lookups are case-insensitive.
const SHAPE_TABLE: &[(&str, AggregationShape)] = &[
    // categorical
    ("keyword", Bucketed),
    ("string", Bucketed),
    ("text", Bucketed),
    ("id", Bucketed),
    ("boolean", Bucketed),
    ("date", Bucketed),
    ("date_nanos", Bucketed),
    ("date_range", Bucketed),
    // numeric
    ("numeric", NumericStats),
    ("number", NumericStats),
    ("long", NumericStats),
    ("integer", NumericStats),
    ("short", NumericStats),
    ("byte", NumericStats),
    ("double", NumericStats),
    ("float", NumericStats),
    ("half_float", NumericStats),
    ("scaled_float", NumericStats),
    ("unsigned_long", NumericStats),
    ("bits", NumericStats),
    ("bytes", NumericStats),
    ("integer_range", NumericStats),
    ("long_range", NumericStats),
    ("float_range", NumericStats),
    ("double_range", NumericStats),
];

impl AggregationShape {
    /// Classify a display type, failing on anything outside the table
    pub fn classify(display_type: &str) -> Result<Self> {
        Self::lookup(display_type).ok_or_else(|| FacetError::UnknownDisplayType {
            display_type: display_type.to_string(),
            field: None,
        })
    }

    /// Classify a display type on behalf of a field, naming it in the error
    pub fn classify_field(field: &str, display_type: &str) -> Result<Self> {
        Self::lookup(display_type).ok_or_else(|| FacetError::UnknownDisplayType {
            display_type: display_type.to_string(),
            field: Some(field.to_string()),
        })
    }

    pub fn lookup(display_type: &str) -> Option<Self> {
        let needle = display_type.trim().to_ascii_lowercase();
        SHAPE_TABLE
            .iter()
            .find(|(name, _)| *name == needle)
            .map(|(_, shape)| *shape)
    }

    /// Every display type the classifier knows about
    pub fn known_display_types() -> impl Iterator<Item = &'static str> {
        SHAPE_TABLE.iter().map(|(name, _)| *name)
    }

    /// SDL type that exposes this shape
    pub fn gql_type(&self) -> &'static str {
        match self {
            Bucketed => "Aggregations",
            NumericStats => "NumericAggregations",
        }
    }

    /// Selection set requested for this shape
    pub fn selection(&self) -> &'static str {
        match self {
            Bucketed => "buckets { doc_count key_as_string key }",
            NumericStats => "stats { max min avg sum count }",
        }
    }

    /// Full aggregation fragment for one SDL field
    pub fn fragment(&self, gql_field: &str) -> String {
        format!("{} {{ {} }}", gql_field, self.selection())
    }
}
