//! Catalog loading
//!
//! The catalog is a TOML file declaring executor backends and script
//! definitions:
//!
//! ```toml
//! [[executor]]
//! type = "curl/test"
//! input_types = ["content"]
//! target = { kind = "http", uri = "http://curl-executor:8082" }
//!
//! [[script]]
//! name = "demo-script"
//! type = "curl/test"
//! input_type = "content"
//! content = "curl -sf http://demo/health"
//! ```
//!
//! Everything is validated when the catalog is loaded so misconfiguration
//! fails at startup instead of on the first request.

use std::collections::HashSet;
use std::path::Path;

use runway_core::domain::executor::{ExecutorDescriptor, ExecutorTarget};
use runway_core::domain::script::ScriptSpec;
use runway_core::dto::execution::DEFAULT_NAMESPACE;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("executor for type '{0}' is declared more than once")]
    DuplicateExecutor(String),

    #[error("executor '{script_type}' is invalid: {reason}")]
    InvalidExecutor { script_type: String, reason: String },

    #[error("script {namespace}/{name} is declared more than once")]
    DuplicateScript { namespace: String, name: String },

    #[error("script {namespace}/{name} is invalid: {reason}")]
    InvalidScript {
        namespace: String,
        name: String,
        reason: String,
    },
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Script definition as declared in the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptDefinition {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(flatten)]
    pub spec: ScriptSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "executor")]
    pub executors: Vec<ExecutorDescriptor>,
    #[serde(default, rename = "script")]
    pub scripts: Vec<ScriptDefinition>,
}

impl Catalog {
    /// Reads and validates a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parses and validates catalog contents
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut types = HashSet::new();
        for descriptor in &self.executors {
            if !types.insert(descriptor.script_type.as_str()) {
                return Err(CatalogError::DuplicateExecutor(
                    descriptor.script_type.clone(),
                ));
            }
            validate_descriptor(descriptor)?;
        }

        let mut scripts = HashSet::new();
        for script in &self.scripts {
            if !scripts.insert((script.namespace.as_str(), script.name.as_str())) {
                return Err(CatalogError::DuplicateScript {
                    namespace: script.namespace.clone(),
                    name: script.name.clone(),
                });
            }

            let invalid = |reason: String| CatalogError::InvalidScript {
                namespace: script.namespace.clone(),
                name: script.name.clone(),
                reason,
            };

            script.spec.validate().map_err(invalid)?;

            let Some(executor) = self
                .executors
                .iter()
                .find(|e| e.script_type == script.spec.script_type)
            else {
                return Err(invalid(format!(
                    "no executor registered for type '{}'",
                    script.spec.script_type
                )));
            };

            if !executor.accepts(script.spec.input_type) {
                return Err(invalid(format!(
                    "executor '{}' does not accept {} input",
                    executor.script_type, script.spec.input_type
                )));
            }
        }

        Ok(())
    }
}

fn validate_descriptor(descriptor: &ExecutorDescriptor) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidExecutor {
        script_type: descriptor.script_type.clone(),
        reason: reason.to_string(),
    };

    if descriptor.script_type.is_empty() {
        return Err(invalid("type cannot be empty"));
    }

    if descriptor.input_types.is_empty() {
        return Err(invalid("at least one input type is required"));
    }

    match &descriptor.target {
        ExecutorTarget::Http { uri } => {
            if !uri.starts_with("http://") && !uri.starts_with("https://") {
                return Err(invalid("uri must start with http:// or https://"));
            }
        }
        ExecutorTarget::InProcess { handler } => {
            if handler.is_empty() {
                return Err(invalid("in-process handler name cannot be empty"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use runway_core::domain::script::InputType;

    const CATALOG: &str = r#"
        [[executor]]
        type = "curl/test"
        input_types = ["content"]
        target = { kind = "http", uri = "http://curl-executor:8082" }

        [[executor]]
        type = "cypress/project"
        input_types = ["git"]
        target = { kind = "in_process", handler = "cypress" }

        [[script]]
        name = "demo-script"
        type = "curl/test"
        input_type = "content"
        content = "curl -sf http://demo/health"

        [[script]]
        name = "e2e"
        namespace = "qa"
        type = "cypress/project"
        input_type = "git"
        repository = { uri = "https://github.com/acme/e2e.git", branch = "main" }
    "#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.executors.len(), 2);
        assert_eq!(catalog.scripts.len(), 2);

        let demo = &catalog.scripts[0];
        assert_eq!(demo.namespace, "default");
        assert_eq!(demo.spec.input_type, InputType::Content);

        let e2e = &catalog.scripts[1];
        let repository = e2e.spec.repository.as_ref().unwrap();
        assert_eq!(repository.kind, "git");
        assert_eq!(repository.branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_duplicate_executor_rejected() {
        let raw = r#"
            [[executor]]
            type = "curl/test"
            input_types = ["content"]
            target = { kind = "http", uri = "http://a" }

            [[executor]]
            type = "curl/test"
            input_types = ["content"]
            target = { kind = "http", uri = "http://b" }
        "#;
        assert_matches!(Catalog::parse(raw), Err(CatalogError::DuplicateExecutor(t)) if t == "curl/test");
    }

    #[test]
    fn test_script_without_executor_rejected() {
        let raw = r#"
            [[script]]
            name = "orphan"
            type = "k6/script"
            input_type = "content"
            content = "export default function() {}"
        "#;
        assert_matches!(Catalog::parse(raw), Err(CatalogError::InvalidScript { name, .. }) if name == "orphan");
    }

    #[test]
    fn test_unsupported_input_rejected() {
        let raw = r#"
            [[executor]]
            type = "curl/test"
            input_types = ["content"]
            target = { kind = "http", uri = "http://curl" }

            [[script]]
            name = "from-git"
            type = "curl/test"
            input_type = "git"
            repository = { uri = "https://github.com/acme/curl.git" }
        "#;
        assert_matches!(Catalog::parse(raw), Err(CatalogError::InvalidScript { .. }));
    }

    #[test]
    fn test_bad_executor_uri_rejected() {
        let raw = r#"
            [[executor]]
            type = "curl/test"
            input_types = ["content"]
            target = { kind = "http", uri = "curl-executor:8082" }
        "#;
        assert_matches!(Catalog::parse(raw), Err(CatalogError::InvalidExecutor { .. }));
    }
}
