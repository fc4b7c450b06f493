//! facetql
//!
//! Compiles Elasticsearch-style document mappings plus display config into a
//! GraphQL schema and per-field aggregation fragments, and provides the SQON
//! filter algebra used to build queries against it.

pub mod aggregations;
pub mod compiler;
pub mod config;
pub mod error;
pub mod mapping;
pub mod schema_builder;
pub mod sqon;

pub use aggregations::{AggregationQueryAssembler, AggregationResult, AggregationShape, GraphqlRequest};
pub use compiler::{CompiledDocument, CompiledSchema, SchemaCompiler, SchemaStore};
pub use config::{CompilerSettings, ProjectConfig};
pub use error::{FacetError, Result};
pub use schema_builder::SchemaBuilder;
pub use sqon::{FilterNode, SqonNode};
