pub mod builder;
pub mod fragments;
pub mod utils;

pub use builder::{SchemaBuilder, SchemaFragment, SdlCategory};
pub use utils::*;
