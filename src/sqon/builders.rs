//! Clause builders for the common filter widgets: numeric range sliders,
//! date pickers and quick search.

use chrono::NaiveDate;
use itertools::Itertools;
use serde_json::{json, Value};
use tracing::debug;

use super::node::{FilterNode, SqonNode};

/// Range clause for a slider selection.
///
/// A bound is only emitted when the selection is narrower than the field's
/// full extent; selecting the whole extent yields no clause.
pub fn range_clause(field_name: &str, selected: (f64, f64), bounds: (f64, f64)) -> Option<SqonNode> {
    let (min, max) = selected;
    let (lower, upper) = bounds;

    let mut content = Vec::new();
    if min > lower {
        content.push(FilterNode::gte(field_name, json!(min)).into());
    }
    if max < upper {
        content.push(FilterNode::lte(field_name, json!(max)).into());
    }

    if content.is_empty() {
        None
    } else {
        Some(SqonNode::and(content))
    }
}

/// Date range clause with inclusive day bounds, as UTC epoch milliseconds
pub fn date_range_clause(field_name: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<SqonNode> {
    let mut content = Vec::new();

    if let Some(millis) = start.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|t| t.and_utc().timestamp_millis()) {
        content.push(FilterNode::gte(field_name, millis).into());
    }
    if let Some(millis) = end
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .map(|t| t.and_utc().timestamp_millis())
    {
        content.push(FilterNode::lte(field_name, millis).into());
    }

    if content.is_empty() {
        None
    } else {
        Some(SqonNode::and(content))
    }
}

/// Quick-search tree over `field_names`.
///
/// Exact search emits one `in` clause per field holding every part; fuzzy
/// search emits a `*part*` wildcard clause per field and part.
pub fn quick_search_sqon(field_names: &[String], parts: &[String], exact: bool) -> Option<SqonNode> {
    if field_names.is_empty() || parts.is_empty() {
        return None;
    }

    let content: Vec<SqonNode> = if exact {
        let values: Vec<Value> = parts.iter().map(|p| Value::String(p.clone())).collect();
        field_names
            .iter()
            .map(|field| FilterNode::in_values(field.as_str(), values.clone()).into())
            .collect()
    } else {
        field_names
            .iter()
            .cartesian_product(parts.iter())
            .map(|(field, part)| FilterNode::filter(field.as_str(), format!("*{}*", part)).into())
            .collect()
    };

    debug!("Quick search over {} fields with {} parts", field_names.len(), parts.len());
    Some(SqonNode::or(content))
}

/// Split free text into distinct search parts
pub fn split_search_text(text: &str, delimiters: &[char], lowercase: bool) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || delimiters.contains(&c))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| if lowercase { part.to_lowercase() } else { part.to_string() })
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqon::FilterOp;

    #[test]
    fn test_range_clause_only_narrowed_bounds() {
        assert!(range_clause("age", (0.0, 100.0), (0.0, 100.0)).is_none());

        let lower = range_clause("age", (10.0, 100.0), (0.0, 100.0)).unwrap();
        let filters = lower.filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].op, FilterOp::Gte);
        assert_eq!(filters[0].value(), &json!(10.0));

        let both = range_clause("age", (10.0, 20.0), (0.0, 100.0)).unwrap();
        assert_eq!(both.filters().len(), 2);
    }

    #[test]
    fn test_date_range_clause_covers_whole_days() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 2);
        let clause = date_range_clause("created", day, day).unwrap();
        let filters = clause.filters();

        assert_eq!(filters[0].value(), &json!(1_577_923_200_000i64));
        assert_eq!(filters[1].value(), &json!(1_578_009_599_999i64));
        assert!(date_range_clause("created", None, None).is_none());
    }

    #[test]
    fn test_quick_search_exact_and_fuzzy() {
        let fields = vec!["name".to_string(), "donor.id".to_string()];
        let parts = vec!["abc".to_string()];

        let exact = quick_search_sqon(&fields, &parts, true).unwrap();
        assert_eq!(
            SqonNode::to_value(Some(&exact)),
            json!({ "op": "or", "content": [
                { "op": "in", "content": { "fieldName": "name", "value": ["abc"] } },
                { "op": "in", "content": { "fieldName": "donor.id", "value": ["abc"] } }
            ] })
        );

        let fuzzy = quick_search_sqon(&fields, &parts, false).unwrap();
        assert!(fuzzy.filters().iter().all(|f| f.value() == &json!("*abc*")));
        assert!(quick_search_sqon(&fields, &[], false).is_none());
    }

    #[test]
    fn test_split_search_text() {
        let parts = split_search_text("  ABC, def\nabc;ghi ", &[',', ';'], true);
        assert_eq!(parts, vec!["abc", "def", "ghi"]);

        let raw = split_search_text("A a", &[], false);
        assert_eq!(raw, vec!["A", "a"]);
    }
}
