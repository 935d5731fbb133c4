//! Executor registry
//!
//! Resolves the executor client responsible for a script type. The registry is
//! built once at startup from the catalog's descriptors; in-process handlers
//! must be supplied by name when it is built.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use runway_core::domain::executor::{ExecutorDescriptor, ExecutorTarget};
use thiserror::Error;

use super::{ExecutorClient, HttpExecutorClient};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no executor registered for type '{0}'")]
    UnknownType(String),

    #[error("executor '{script_type}' refers to unknown in-process handler '{handler}'")]
    UnknownHandler {
        script_type: String,
        handler: String,
    },

    #[error("executor for type '{0}' is registered more than once")]
    Duplicate(String),
}

/// Maps script types to executor clients
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn ExecutorClient>>,
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("types", &self.types())
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors
    ///
    /// HTTP targets get an [`HttpExecutorClient`]; in-process targets are looked
    /// up in `handlers` and fail the build if missing.
    pub fn from_descriptors(
        descriptors: &[ExecutorDescriptor],
        handlers: &HashMap<String, Arc<dyn ExecutorClient>>,
        poll_interval: Duration,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for descriptor in descriptors {
            let client: Arc<dyn ExecutorClient> = match &descriptor.target {
                ExecutorTarget::Http { uri } => Arc::new(HttpExecutorClient::new(
                    descriptor.script_type.clone(),
                    uri.clone(),
                    descriptor.input_types.clone(),
                    poll_interval,
                )),
                ExecutorTarget::InProcess { handler } => handlers
                    .get(handler)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownHandler {
                        script_type: descriptor.script_type.clone(),
                        handler: handler.clone(),
                    })?,
            };

            registry.register(descriptor.script_type.clone(), client)?;
        }

        Ok(registry)
    }

    /// Registers a client for a script type
    pub fn register(
        &mut self,
        script_type: impl Into<String>,
        client: Arc<dyn ExecutorClient>,
    ) -> Result<(), RegistryError> {
        let script_type = script_type.into();
        if self.executors.contains_key(&script_type) {
            return Err(RegistryError::Duplicate(script_type));
        }
        self.executors.insert(script_type, client);
        Ok(())
    }

    pub fn get(&self, script_type: &str) -> Result<Arc<dyn ExecutorClient>, RegistryError> {
        self.executors
            .get(script_type)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType(script_type.to_string()))
    }

    /// Registered script types, sorted
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.executors.keys().cloned().collect();
        types.sort();
        types
    }
}
