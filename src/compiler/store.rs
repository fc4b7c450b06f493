//! Holds the schema currently in effect.
//!
//! Readers get an `Arc` snapshot and never block on a recompile beyond the
//! pointer swap. A failed recompile leaves the previous schema in place.

use crate::config::ProjectConfig;
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info};

use super::compile::{CompiledSchema, SchemaCompiler};

pub struct SchemaStore {
    compiler: SchemaCompiler,
    current: RwLock<Arc<CompiledSchema>>,
}

impl SchemaStore {
    /// Compile the initial schema. There is no fallback, so a failure here is returned.
    pub fn new(compiler: SchemaCompiler, projects: &[ProjectConfig]) -> Result<Self> {
        let schema = compiler.compile(projects)?;
        Ok(Self {
            compiler,
            current: RwLock::new(Arc::new(schema)),
        })
    }

    pub fn current(&self) -> Arc<CompiledSchema> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compile and swap in a new schema, or keep the old one on error
    pub fn recompile(&self, projects: &[ProjectConfig]) -> Result<Arc<CompiledSchema>> {
        match self.compiler.compile(projects) {
            Ok(schema) => {
                let schema = Arc::new(schema);
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = schema.clone();
                info!("Swapped in recompiled schema");
                Ok(schema)
            }
            Err(e) => {
                error!("Recompile failed, keeping previous schema: {}", e);
                Err(e)
            }
        }
    }
}
