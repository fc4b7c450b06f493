//! Schema Compiler
//!
//! Turns project configs into one SDL document plus, per document type, the
//! merged field list and the aggregation fragment for each active facet.
//! Compilation is all-or-nothing: any error aborts the whole compile and no
//! SDL is produced.

use crate::aggregations::{build_hits_request, AggregationQueryAssembler, AggregationShape, GraphqlRequest, HitsPage};
use crate::config::{ColumnSorting, CompilerSettings, ProjectConfig};
use crate::error::{FacetError, Result};
use crate::mapping::{
    flatten_mapping, mapping_properties, nested_fields, sanitize_field_name, ColumnField, FacetField,
    FieldDescriptor, FieldExtender,
};
use crate::schema_builder::fragments::CORE_FRAGMENTS;
use crate::schema_builder::{extract_type_names, SchemaBuilder};
use crate::sqon::SqonNode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use super::root::{document_type_enum, reserved_root_fields, root_type_def, SCHEMA_DEFINITION};
use super::type_defs::{
    aggregations_type_def, check_identifier, connection_type_defs, document_type_def, node_type_def, type_name,
};

/// Compiled view of one document type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDocument {
    pub document_type: String,
    pub type_name: String,
    pub index: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    pub facets: Vec<FacetField>,
    pub columns: Vec<ColumnField>,
    pub default_sorting: Vec<ColumnSorting>,
    pub nested_fields: Vec<String>,
    /// Dotted path → aggregation selection, for every active facet
    pub aggregation_fragments: BTreeMap<String, String>,
    /// Config entries that named paths missing from the mapping
    pub dangling: Vec<String>,
}

impl CompiledDocument {
    pub fn field(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field == path)
    }

    pub fn assembler(&self) -> AggregationQueryAssembler<'_> {
        AggregationQueryAssembler::new(&self.document_type, &self.facets)
    }

    pub fn hits_request(&self, sqon: Option<&SqonNode>, page: HitsPage) -> GraphqlRequest {
        build_hits_request(&self.document_type, &self.columns, &self.default_sorting, sqon, page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledSchema {
    pub sdl: String,
    pub documents: Vec<CompiledDocument>,
}

impl CompiledSchema {
    pub fn document(&self, document_type: &str) -> Option<&CompiledDocument> {
        self.documents.iter().find(|d| d.document_type == document_type)
    }

    pub fn document_types(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.document_type.as_str())
    }
}

pub struct SchemaCompiler {
    settings: CompilerSettings,
    extender: FieldExtender,
}

impl SchemaCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        let extender = FieldExtender::from_settings(&settings);
        Self { settings, extender }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compile a single project
    pub fn compile_project(&self, project: &ProjectConfig) -> Result<CompiledSchema> {
        self.compile(std::slice::from_ref(project))
    }

    /// Compile every project into one schema
    pub fn compile(&self, projects: &[ProjectConfig]) -> Result<CompiledSchema> {
        if projects.is_empty() {
            return Err(FacetError::Config("no document types to compile".to_string()));
        }
        info!("Compiling schema for {} document types", projects.len());

        let mut seen_types = HashSet::new();
        let mut declared = reserved_type_names();
        let mut documents = Vec::with_capacity(projects.len());
        let mut document_defs = Vec::new();

        for project in projects {
            check_identifier(&project.document_type, "document type")?;
            if reserved_root_fields().any(|f| f == project.document_type) {
                return Err(FacetError::InvalidIdentifier(format!(
                    "document type '{}' clashes with a built-in Root field",
                    project.document_type
                )));
            }
            if !seen_types.insert(project.document_type.as_str()) {
                return Err(FacetError::Config(format!(
                    "document type '{}' is configured more than once",
                    project.document_type
                )));
            }

            let (document, defs) = self.compile_document(project)?;
            for name in defs.iter().flat_map(|def| extract_type_names(def)) {
                if !declared.insert(name.clone()) {
                    return Err(FacetError::InvalidIdentifier(format!(
                        "document type '{}' declares '{}', which is already declared",
                        document.document_type, name
                    )));
                }
            }
            documents.push(document);
            document_defs.extend(defs);
        }

        let names: Vec<(String, String)> = documents
            .iter()
            .map(|d| (d.document_type.clone(), d.type_name.clone()))
            .collect();

        let builder = document_defs.iter().fold(
            SchemaBuilder::new()
                .add_multiple(CORE_FRAGMENTS)
                .add_enum(&document_type_enum(&names))
                .add_type(&root_type_def(&names))
                .set_schema(SCHEMA_DEFINITION),
            |builder, def| builder.add_type(def),
        );
        let sdl = builder.build();

        info!(
            "Compiled schema: {} document types, {} fields, {} facets, {} bytes of SDL",
            documents.len(),
            documents.iter().map(|d| d.fields.len()).sum::<usize>(),
            documents.iter().map(|d| d.facets.len()).sum::<usize>(),
            sdl.len()
        );

        Ok(CompiledSchema { sdl, documents })
    }

    fn compile_document(&self, project: &ProjectConfig) -> Result<(CompiledDocument, Vec<String>)> {
        debug!("Compiling document type {}", project.document_type);

        let properties = mapping_properties(&project.mapping)?;
        let flat = flatten_mapping(properties)?;

        let fields = self.extender.extend(&flat, &project.extended, None);
        let facets = self.extender.extend_facets(&fields, &project.facets)?;
        let columns = self.extender.extend_columns(&fields, &project.table);
        let dangling: Vec<String> = self
            .extender
            .dangling_references(&flat, &project.extended, &project.facets, &project.table)
            .iter()
            .map(ToString::to_string)
            .collect();

        let shapes = self.aggregation_shapes(properties, &fields, &facets)?;
        let type_name = type_name(&project.document_type);
        check_identifier(&type_name, "type name")?;

        let mut defs = vec![document_type_def(&type_name, !shapes.is_empty())];
        defs.extend(aggregations_type_def(&type_name, &shapes)?);
        defs.extend(connection_type_defs(&type_name));
        defs.push(node_type_def(&type_name, &fields)?);

        let aggregation_fragments = facets
            .iter()
            .map(|f| (f.path().to_string(), f.fragment.clone()))
            .collect();

        let document = CompiledDocument {
            document_type: project.document_type.clone(),
            type_name,
            index: project.index.clone(),
            nested_fields: nested_fields(properties)?,
            fields,
            facets,
            columns,
            default_sorting: project.table.default_sorting.clone(),
            aggregation_fragments,
            dangling,
        };

        Ok((document, defs))
    }

    /// Aggregation shape of every leaf that survives pruning, keyed by SDL
    /// field name. Active facets override the mapping-derived shape.
    fn aggregation_shapes(
        &self,
        properties: &Map<String, Value>,
        fields: &[FieldDescriptor],
        facets: &[FacetField],
    ) -> Result<Vec<(String, AggregationShape)>> {
        let pruned = self.extender.prune_mapping(properties);
        let by_path: HashMap<&str, &FieldDescriptor> = fields.iter().map(|f| (f.field.as_str(), f)).collect();

        let mut shapes: Vec<(String, AggregationShape)> = Vec::new();
        for flat in flatten_mapping(&pruned)?.iter().filter(|f| f.is_leaf()) {
            let display_type = by_path
                .get(flat.field.as_str())
                .map_or(flat.field_type.as_str(), |f| f.display_type.as_str());
            let shape = AggregationShape::lookup(display_type).or_else(|| AggregationShape::lookup(&flat.field_type));

            match shape {
                Some(shape) => shapes.push((sanitize_field_name(&flat.field), shape)),
                None => debug!("'{}' of type {} has no aggregation", flat.field, flat.field_type),
            }
        }

        for facet in facets {
            let gql_field = facet.gql_field();
            match shapes.iter_mut().find(|(name, _)| *name == gql_field) {
                Some(entry) => entry.1 = facet.shape,
                None => shapes.push((gql_field, facet.shape)),
            }
        }

        Ok(shapes)
    }
}

/// Type names declared by the shared fragments and the root definitions
fn reserved_type_names() -> HashSet<String> {
    CORE_FRAGMENTS
        .iter()
        .flat_map(|fragment| extract_type_names(fragment))
        .chain(["Root".to_string(), "DocumentType".to_string()])
        .collect()
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(CompilerSettings::default())
    }
}
