//! Script definitions
//!
//! The orchestrator resolves the [`ScriptSpec`] of a script through a
//! [`ScriptStore`] right before dispatch, so the record snapshots the
//! definition as it was at that moment.

use std::collections::HashMap;

use async_trait::async_trait;
use runway_core::domain::script::ScriptSpec;
use thiserror::Error;

use crate::catalog::Catalog;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("script {namespace}/{id} not found")]
    NotFound { namespace: String, id: String },

    #[error("definition store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn get(&self, namespace: &str, id: &str) -> Result<ScriptSpec, DefinitionError>;
}

/// Script store backed by the catalog loaded at startup
#[derive(Debug, Clone, Default)]
pub struct CatalogScriptStore {
    scripts: HashMap<(String, String), ScriptSpec>,
}

impl CatalogScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut store = Self::new();
        for script in &catalog.scripts {
            store.insert(&script.namespace, &script.name, script.spec.clone());
        }
        store
    }

    pub fn insert(&mut self, namespace: &str, id: &str, spec: ScriptSpec) {
        self.scripts
            .insert((namespace.to_string(), id.to_string()), spec);
    }

    pub fn with_script(mut self, namespace: &str, id: &str, spec: ScriptSpec) -> Self {
        self.insert(namespace, id, spec);
        self
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[async_trait]
impl ScriptStore for CatalogScriptStore {
    async fn get(&self, namespace: &str, id: &str) -> Result<ScriptSpec, DefinitionError> {
        self.scripts
            .get(&(namespace.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| DefinitionError::NotFound {
                namespace: namespace.to_string(),
                id: id.to_string(),
            })
    }
}
