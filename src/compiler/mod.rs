pub mod compile;
pub mod root;
pub mod store;
pub mod type_defs;

pub use compile::{CompiledDocument, CompiledSchema, SchemaCompiler};
pub use store::SchemaStore;
