//! Field Extender
//!
//! Merges flattened mapping records with operator-supplied extended field
//! config, and derives the facet and table-column projections.
//!
//! The mapping is authoritative for which fields exist; config only changes
//! how they are displayed. Config entries naming a path the mapping does not
//! have are logged and ignored.

use crate::aggregations::AggregationShape;
use crate::config::{
    ColumnConfig, CompilerSettings, ExtendedFieldConfig, FacetsConfig, TableConfig,
};
use crate::error::{FacetError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

use super::flatten::FlatField;
use super::{sanitize_field_name, unsanitize_field_name, PATH_SEPARATOR};

/// A mapping field enriched with display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub display_name: Option<String>,
    /// Defaults to the mapping type when config does not override it
    pub display_type: String,
    pub is_active: bool,
    pub show: bool,
    pub sortable: bool,
    /// True when the field sits under a `nested` ancestor
    pub is_array: bool,
    pub unit: Option<String>,
    pub display_values: Option<Value>,
    pub query: Option<String>,
}

impl FieldDescriptor {
    /// Mapping-only defaults: no display name, facet and table inactive
    pub fn from_mapping(flat: &FlatField, under_nested: bool) -> Self {
        Self {
            field: flat.field.clone(),
            field_type: flat.field_type.clone(),
            display_name: None,
            display_type: flat.field_type.clone(),
            is_active: false,
            show: false,
            sortable: flat.is_leaf(),
            is_array: under_nested,
            unit: None,
            display_values: None,
            query: None,
        }
    }

    /// Apply an extended config record; set fields win over mapping defaults
    pub fn merged(mut self, config: &ExtendedFieldConfig) -> Self {
        if let Some(name) = &config.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(display_type) = &config.display_type {
            self.display_type = display_type.clone();
        }
        if let Some(active) = config.is_active {
            self.is_active = active;
        }
        if let Some(show) = config.show {
            self.show = show;
        }
        if let Some(sortable) = config.sortable {
            self.sortable = sortable;
        }
        if let Some(is_array) = config.is_array {
            self.is_array = is_array;
        }
        if config.unit.is_some() {
            self.unit = config.unit.clone();
        }
        if config.display_values.is_some() {
            self.display_values = config.display_values.clone();
        }
        if config.query.is_some() {
            self.query = config.query.clone();
        }
        self
    }

    pub fn gql_field(&self) -> String {
        sanitize_field_name(&self.field)
    }

    pub fn is_nested(&self) -> bool {
        self.field_type == super::NESTED_TYPE
    }

    pub fn is_object(&self) -> bool {
        self.field_type == super::DEFAULT_OBJECT_TYPE
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_object() && !self.is_nested()
    }
}

/// A facet-active field with its classified aggregation shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetField {
    pub field: FieldDescriptor,
    pub shape: AggregationShape,
    pub show: bool,
    /// Aggregation selection for this field, ready to embed in a query
    pub fragment: String,
}

impl FacetField {
    pub fn path(&self) -> &str {
        &self.field.field
    }

    pub fn gql_field(&self) -> String {
        self.field.gql_field()
    }
}

/// A table column backed by a mapping field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnField {
    pub field: FieldDescriptor,
    pub id: String,
    pub accessor: Option<String>,
    pub display_name: Option<String>,
    pub display_format: Option<String>,
    pub json_path: Option<String>,
    pub show: bool,
    pub sortable: bool,
    pub can_change_show: bool,
    pub query: Option<String>,
}

impl ColumnField {
    /// Selection used to fetch this column in a hits query
    pub fn selection(&self) -> String {
        match &self.query {
            Some(query) => query.clone(),
            None => self.field.gql_field(),
        }
    }
}

/// Merges mapping records with extended config
pub struct FieldExtender {
    excluded_types: BTreeSet<String>,
}

impl FieldExtender {
    pub fn new<I, S>(excluded_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_types: excluded_types
                .into_iter()
                .map(|t| t.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_settings(settings: &CompilerSettings) -> Self {
        Self::new(settings.excluded_types.iter().cloned())
    }

    pub fn is_excluded(&self, field_type: &str) -> bool {
        self.excluded_types.contains(&field_type.to_ascii_lowercase())
    }

    /// Drop mapping nodes whose own type is excluded. Children of kept
    /// object nodes are pruned recursively.
    pub fn prune_mapping(&self, properties: &Map<String, Value>) -> Map<String, Value> {
        let mut pruned = Map::new();
        for (name, data) in properties {
            let declared = data.get("type").and_then(Value::as_str);
            if declared.map_or(false, |t| self.is_excluded(t)) {
                debug!("Pruning '{}' of excluded type {:?}", name, declared);
                continue;
            }

            let node = match (data, data.get("properties").and_then(Value::as_object)) {
                (Value::Object(obj), Some(children)) => {
                    let mut obj = obj.clone();
                    obj.insert("properties".to_string(), Value::Object(self.prune_mapping(children)));
                    Value::Object(obj)
                }
                _ => data.clone(),
            };
            pruned.insert(name.clone(), node);
        }
        pruned
    }

    /// Merge flattened records with extended config.
    ///
    /// When `parent` is given only fields below that path are returned.
    pub fn extend(
        &self,
        flat: &[FlatField],
        extended: &[ExtendedFieldConfig],
        parent: Option<&str>,
    ) -> Vec<FieldDescriptor> {
        let known: HashSet<&str> = flat.iter().map(|f| f.field.as_str()).collect();
        let mut by_path: HashMap<String, &ExtendedFieldConfig> = HashMap::new();
        for config in extended {
            let Some(path) = resolve_path(&config.field_name, |p| known.contains(p)) else {
                warn!(
                    "{}",
                    FacetError::DanglingConfigReference {
                        field: config.field_name.clone(),
                        section: "extended".to_string(),
                    }
                );
                continue;
            };
            by_path.insert(path, config);
        }

        let nested: Vec<&str> = flat
            .iter()
            .filter(|f| f.is_nested())
            .map(|f| f.field.as_str())
            .collect();

        flat.iter()
            .filter(|f| parent.map_or(true, |p| is_descendant(&f.field, p)))
            .map(|f| {
                let under_nested = nested.iter().any(|n| is_descendant(&f.field, n));
                let descriptor = FieldDescriptor::from_mapping(f, under_nested);
                match by_path.get(f.field.as_str()) {
                    Some(config) => descriptor.merged(config),
                    None => descriptor,
                }
            })
            .collect()
    }

    /// Facet-active fields in declared facet order, each classified.
    ///
    /// Object, nested and excluded-type fields are skipped; an active facet
    /// whose display type has no aggregation shape is an error.
    pub fn extend_facets(&self, fields: &[FieldDescriptor], facets: &FacetsConfig) -> Result<Vec<FacetField>> {
        let index = index_by_path(fields);
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        for facet in &facets.aggregations {
            if !facet.is_active {
                debug!("Facet '{}' is inactive", facet.field_name);
                continue;
            }

            let field = resolve_path(&facet.field_name, |p| index.contains_key(p))
                .and_then(|path| index.get(path.as_str()));
            let Some(field) = field else {
                warn!(
                    "{}",
                    FacetError::DanglingConfigReference {
                        field: facet.field_name.clone(),
                        section: "facets".to_string(),
                    }
                );
                continue;
            };
            let path = field.field.clone();

            if !field.is_leaf() || self.is_excluded(&field.field_type) {
                debug!("Facet '{}' has non-aggregatable type {}", path, field.field_type);
                continue;
            }
            if !seen.insert(path.clone()) {
                debug!("Facet '{}' listed more than once", path);
                continue;
            }

            let mut descriptor = (*field).clone();
            if let Some(display_type) = &facet.display_type {
                descriptor.display_type = display_type.clone();
            }
            if facet.display_name.is_some() {
                descriptor.display_name = facet.display_name.clone();
            }
            if self.is_excluded(&descriptor.display_type) {
                debug!("Facet '{}' has excluded display type {}", path, descriptor.display_type);
                continue;
            }
            descriptor.is_active = true;

            let shape = AggregationShape::classify_field(&path, &descriptor.display_type)?;
            debug!("Facet '{}' classified as {:?}", path, shape);

            let fragment = match facet.query.as_ref().or(descriptor.query.as_ref()) {
                Some(query) => query.clone(),
                None => shape.fragment(&descriptor.gql_field()),
            };

            result.push(FacetField {
                field: descriptor,
                shape,
                show: facet.show,
                fragment,
            });
        }

        Ok(result)
    }

    /// Table columns in declared column order. Object and nested paths have
    /// no node field to select and are skipped.
    pub fn extend_columns(&self, fields: &[FieldDescriptor], table: &TableConfig) -> Vec<ColumnField> {
        let index = index_by_path(fields);

        table
            .columns
            .iter()
            .filter_map(|column| {
                let field = resolve_path(&column.field_name, |p| index.contains_key(p))
                    .and_then(|path| index.get(path.as_str()));
                match field {
                    Some(field) if !field.is_leaf() => {
                        debug!("Column '{}' is a {} node, not a leaf", field.field, field.field_type);
                        None
                    }
                    Some(field) => Some(build_column(field, column)),
                    None => {
                        warn!(
                            "{}",
                            FacetError::DanglingConfigReference {
                                field: column.field_name.clone(),
                                section: "table".to_string(),
                            }
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Config entries across all sections that name a path absent from the mapping
    pub fn dangling_references(
        &self,
        flat: &[FlatField],
        extended: &[ExtendedFieldConfig],
        facets: &FacetsConfig,
        table: &TableConfig,
    ) -> Vec<FacetError> {
        let known: HashSet<&str> = flat.iter().map(|f| f.field.as_str()).collect();
        let sections = extended
            .iter()
            .map(|c| (c.field_name.as_str(), "extended"))
            .chain(facets.aggregations.iter().map(|c| (c.field_name.as_str(), "facets")))
            .chain(table.columns.iter().map(|c| (c.field_name.as_str(), "table")));

        sections
            .filter(|(name, _)| resolve_path(name, |p| known.contains(p)).is_none())
            .map(|(name, section)| FacetError::DanglingConfigReference {
                field: name.to_string(),
                section: section.to_string(),
            })
            .collect()
    }
}

impl Default for FieldExtender {
    fn default() -> Self {
        Self::from_settings(&CompilerSettings::default())
    }
}

fn build_column(field: &FieldDescriptor, column: &ColumnConfig) -> ColumnField {
    let mut descriptor = field.clone();
    if let Some(display_type) = &column.display_type {
        descriptor.display_type = display_type.clone();
    }
    if let Some(is_array) = column.is_array {
        descriptor.is_array = is_array;
    }

    ColumnField {
        id: column.id.clone().unwrap_or_else(|| field.field.clone()),
        accessor: column.accessor.clone().or_else(|| Some(field.field.clone())),
        display_name: column.display_name.clone().or_else(|| field.display_name.clone()),
        display_format: column.display_format.clone(),
        json_path: column.json_path.clone(),
        show: column.show.unwrap_or(field.show),
        sortable: column.sortable.unwrap_or(field.sortable),
        can_change_show: column.can_change_show.unwrap_or(true),
        query: column.query.clone().or_else(|| field.query.clone()),
        field: descriptor,
    }
}

/// Map a config field name to a mapping path. The literal name wins, so a
/// mapping key containing `__` is found as-is; otherwise `__` reads as `.`.
fn resolve_path<F>(field_name: &str, is_known: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    if is_known(field_name) {
        return Some(field_name.to_string());
    }
    let path = unsanitize_field_name(field_name);
    is_known(&path).then_some(path)
}

fn index_by_path(fields: &[FieldDescriptor]) -> HashMap<&str, &FieldDescriptor> {
    fields.iter().map(|f| (f.field.as_str(), f)).collect()
}

fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(PATH_SEPARATOR)
}
