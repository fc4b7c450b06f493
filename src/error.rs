use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacetError {
    #[error("Malformed mapping at '{path}': {reason}")]
    MalformedMapping { path: String, reason: String },

    #[error(
        "Unknown display type '{display_type}'{}",
        .field.as_deref().map(|f| format!(" for field '{}'", f)).unwrap_or_default()
    )]
    UnknownDisplayType {
        display_type: String,
        field: Option<String>,
    },

    #[error("Dangling {section} config reference: '{field}' is not in the mapping")]
    DanglingConfigReference { field: String, section: String },

    #[error("SQON structural mismatch: {0}")]
    SqonStructuralMismatch(String),

    #[error("Invalid SDL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Aggregation response error: {0}")]
    AggregationResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FacetError>;
