//! Shared SDL fragments included in every compiled schema

pub const CORE_SCALARS: &str = r#"#graphql
scalar JSON
scalar Date
"#;

pub const CORE_INTERFACES: &str = r#"#graphql
interface Node {
  id: ID!
}
"#;

pub const CORE_ENUMS: &str = r#"#graphql
enum EsRefresh {
  TRUE
  FALSE
  WAIT_FOR
}
"#;

pub const QUERY_TYPES: &str = r#"#graphql
type QueryResults {
  total: Int
  hits: [Node]
}

type FileSize {
  value: Float
}
"#;

pub const SORT_TYPES: &str = r#"#graphql
enum Missing {
  first
  last
}

enum Mode {
  avg
  max
  min
  sum
}

enum Order {
  asc
  desc
}

input Sort {
  fieldName: String!
  order: Order
  mode: Mode
  missing: Missing
}
"#;

pub const AGGREGATION_TYPES: &str = r#"#graphql
type Stats {
  max: Float
  min: Float
  count: Int
  avg: Float
  sum: Float
}

type Bucket {
  doc_count: Int
  key: String
  key_as_string: String
  top_hits(_source: [String], size: Int): JSON
  filter_by_term(filter: JSON): JSON
}

type NumericAggregations {
  stats: Stats
  histogram(interval: Float): Aggregations
}

type Aggregations {
  bucket_count: Int
  buckets(max: Int): [Bucket]
  cardinality(precision_threshold: Int): Int
}
"#;

pub const CONFIG_TYPES: &str = r#"#graphql
type AggregationMapping {
  displayName: String
  displayType: String
  fieldName: String
  isActive: Boolean
  show: Boolean
}

type FacetsConfig {
  aggregations: [AggregationMapping]
}

type ColumnMapping {
  accessor: String
  canChangeShow: Boolean
  displayFormat: String
  displayName: String
  displayType: String
  displayValues: JSON
  fieldName: String
  id: String
  isArray: Boolean
  jsonPath: String
  query: String
  show: Boolean
  sortable: Boolean
}

type ColumnSorting {
  fieldName: String
  desc: Boolean
}

type TableConfig {
  columns: [ColumnMapping]
  defaultSorting: [ColumnSorting]
  maxResultsWindow: Int
  rowIdFieldName: String
}

type ConfigsWithState {
  facets: FacetsConfig
  extended(fieldNames: [String]): JSON
  table: TableConfig
}
"#;

/// Every shared fragment, in the order they are fed to the builder
pub const CORE_FRAGMENTS: [&str; 7] = [
    CORE_SCALARS,
    CORE_INTERFACES,
    CORE_ENUMS,
    QUERY_TYPES,
    SORT_TYPES,
    AGGREGATION_TYPES,
    CONFIG_TYPES,
];
