//! SQON Tree
//!
//! A SQON is either a combination of child nodes or a single filter leaf.
//! The wire format is plain JSON:
//!
//! ```json
//! { "op": "and", "content": [ { "op": "in", "content": { "fieldName": "status", "value": ["active"] } } ] }
//! ```

use crate::error::{FacetError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "in")]
    In,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "filter")]
    Filter,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            FilterOp::In => "in",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Filter => "filter",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterContent {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub value: Value,
}

/// A single filter clause on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    pub op: FilterOp,
    pub content: FilterContent,
}

impl FilterNode {
    pub fn new(op: FilterOp, field_name: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            content: FilterContent {
                field_name: field_name.into(),
                value,
            },
        }
    }

    pub fn in_values(field_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(FilterOp::In, field_name, Value::Array(values))
    }

    pub fn gte(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Gte, field_name, value.into())
    }

    pub fn lte(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Lte, field_name, value.into())
    }

    /// Wildcard text match
    pub fn filter(field_name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(FilterOp::Filter, field_name, Value::String(pattern.into()))
    }

    pub fn field_name(&self) -> &str {
        &self.content.field_name
    }

    pub fn value(&self) -> &Value {
        &self.content.value
    }

    /// Same op, same field, and equal values. Array values compare as sets.
    pub fn matches(&self, other: &FilterNode) -> bool {
        self.op == other.op
            && self.content.field_name == other.content.field_name
            && values_equal(&self.content.value, &other.content.value)
    }

    /// True when this clause's value is, or contains, `value`
    pub fn holds_value(&self, value: &Value) -> bool {
        match &self.content.value {
            Value::Array(items) => items.contains(value) || values_equal(&self.content.value, value),
            scalar => scalar == value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationNode {
    pub op: CombinationOp,
    pub content: Vec<SqonNode>,
}

impl CombinationNode {
    pub fn new(op: CombinationOp, content: Vec<SqonNode>) -> Self {
        Self { op, content }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A node of the filter expression tree. An absent tree (`None`) means no filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqonNode {
    Combination(CombinationNode),
    Filter(FilterNode),
}

impl SqonNode {
    pub fn and(content: Vec<SqonNode>) -> Self {
        SqonNode::Combination(CombinationNode::new(CombinationOp::And, content))
    }

    pub fn or(content: Vec<SqonNode>) -> Self {
        SqonNode::Combination(CombinationNode::new(CombinationOp::Or, content))
    }

    pub fn not(content: Vec<SqonNode>) -> Self {
        SqonNode::Combination(CombinationNode::new(CombinationOp::Not, content))
    }

    pub fn as_combination(&self) -> Option<&CombinationNode> {
        match self {
            SqonNode::Combination(node) => Some(node),
            SqonNode::Filter(_) => None,
        }
    }

    pub fn as_filter(&self) -> Option<&FilterNode> {
        match self {
            SqonNode::Filter(node) => Some(node),
            SqonNode::Combination(_) => None,
        }
    }

    /// Every filter leaf, depth-first in content order
    pub fn filters(&self) -> Vec<&FilterNode> {
        let mut out = Vec::new();
        collect_filters(self, &mut out);
        out
    }

    /// Parse a wire-format tree. `null` is the empty tree.
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        parse_node(value, "$").map(Some)
    }

    pub fn to_value(tree: Option<&SqonNode>) -> Value {
        match tree {
            Some(node) => serde_json::to_value(node).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
}

impl From<FilterNode> for SqonNode {
    fn from(node: FilterNode) -> Self {
        SqonNode::Filter(node)
    }
}

impl From<CombinationNode> for SqonNode {
    fn from(node: CombinationNode) -> Self {
        SqonNode::Combination(node)
    }
}

impl fmt::Display for SqonNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Deep equality, except that two arrays are equal when they hold the same
/// set of values regardless of order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(left), Value::Array(right)) => {
            left.iter().all(|v| right.contains(v)) && right.iter().all(|v| left.contains(v))
        }
        _ => a == b,
    }
}

fn collect_filters<'a>(node: &'a SqonNode, out: &mut Vec<&'a FilterNode>) {
    match node {
        SqonNode::Filter(filter) => out.push(filter),
        SqonNode::Combination(combination) => {
            for child in &combination.content {
                collect_filters(child, out);
            }
        }
    }
}

fn parse_node(value: &Value, path: &str) -> Result<SqonNode> {
    let mismatch = |reason: String| FacetError::SqonStructuralMismatch(format!("{}: {}", path, reason));

    let obj = value
        .as_object()
        .ok_or_else(|| mismatch(format!("expected an object, found {}", value)))?;
    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| mismatch("missing string 'op'".to_string()))?;
    let content = obj
        .get("content")
        .ok_or_else(|| mismatch("missing 'content'".to_string()))?;

    let combination_op = match op {
        "and" => Some(CombinationOp::And),
        "or" => Some(CombinationOp::Or),
        "not" => Some(CombinationOp::Not),
        _ => None,
    };

    if let Some(op) = combination_op {
        let children = content
            .as_array()
            .ok_or_else(|| mismatch(format!("'{}' content must be an array", op_name(op))))?;
        let content = children
            .iter()
            .enumerate()
            .map(|(i, child)| parse_node(child, &format!("{}.content[{}]", path, i)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(SqonNode::Combination(CombinationNode::new(op, content)));
    }

    let filter_op = match op {
        "in" => FilterOp::In,
        ">=" => FilterOp::Gte,
        "<=" => FilterOp::Lte,
        "filter" => FilterOp::Filter,
        other => return Err(mismatch(format!("unknown op '{}'", other))),
    };

    let field_name = content
        .get("fieldName")
        .and_then(Value::as_str)
        .ok_or_else(|| mismatch(format!("'{}' content needs a string 'fieldName'", filter_op)))?;
    let value = content.get("value").cloned().unwrap_or(Value::Null);

    Ok(SqonNode::Filter(FilterNode::new(filter_op, field_name, value)))
}

fn op_name(op: CombinationOp) -> &'static str {
    match op {
        CombinationOp::And => "and",
        CombinationOp::Or => "or",
        CombinationOp::Not => "not",
    }
}
