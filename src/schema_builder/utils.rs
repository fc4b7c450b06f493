//! Textual helpers for composing SDL fragments. None of these parse GraphQL;
//! they only recognise declaration keywords at the start of a line.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Editor marker some fragments carry on their first line
pub const GRAPHQL_MARKER: &str = "#graphql";

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"^\s*#graphql\s*").unwrap();
    static ref DECLARED_NAME: Regex =
        Regex::new(r"(?m)^\s*(?:extend\s+)?(?:type|input|enum|interface|union|scalar)\s+([_A-Za-z][_0-9A-Za-z]*)")
            .unwrap();
    static ref DECLARATION: Regex =
        Regex::new(r"(?m)^\s*(?:extend\s+)?(?:type|input|enum|interface|union|scalar|directive|schema)\b").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").unwrap();
}

/// Strip a leading `#graphql` marker and surrounding whitespace
pub fn clean_type_def(type_def: &str) -> String {
    MARKER.replace(type_def, "").trim().to_string()
}

/// Prefix a fragment with the `#graphql` marker
pub fn gql(type_def: &str) -> String {
    format!("{}\n{}", GRAPHQL_MARKER, type_def)
}

/// Join cleaned fragments with a blank line, skipping empty ones
pub fn combine_type_defs<S: AsRef<str>>(type_defs: &[S]) -> String {
    type_defs
        .iter()
        .map(|def| clean_type_def(def.as_ref()))
        .filter(|def| !def.is_empty())
        .join("\n\n")
}

pub fn create_enum<S: AsRef<str>>(name: &str, values: &[S]) -> String {
    let body = values.iter().map(|v| format!("  {}", v.as_ref())).join("\n");
    format!("enum {} {{\n{}\n}}", name, body)
}

pub fn create_union<S: AsRef<str>>(name: &str, types: &[S]) -> String {
    format!("union {} = {}", name, types.iter().map(AsRef::as_ref).join(" | "))
}

/// True if the fragment declares at least one schema element
pub fn validate_type_def(type_def: &str) -> bool {
    DECLARATION.is_match(&clean_type_def(type_def))
}

/// Names declared by `type`, `input`, `enum`, `interface`, `union` and
/// `scalar` lines, in order of appearance
pub fn extract_type_names(type_def: &str) -> Vec<String> {
    let cleaned = clean_type_def(type_def);
    DECLARED_NAME
        .captures_iter(&cleaned)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keep the first fragment declaring each type name. A fragment that only
/// repeats names already seen is dropped; one declaring no names is kept.
pub fn deduplicate_type_defs<S: AsRef<str>>(type_defs: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for def in type_defs {
        let names = extract_type_names(def.as_ref());
        let has_new = names.is_empty() || names.iter().any(|n| !seen.contains(n));
        if has_new {
            seen.extend(names);
            result.push(def.as_ref().to_string());
        }
    }

    result
}

/// SDL name rule: `[_A-Za-z][_0-9A-Za-z]*`, and `__` is reserved for introspection
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !name.starts_with("__")
}
