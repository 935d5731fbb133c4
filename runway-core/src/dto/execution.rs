//! Execution DTOs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::execution::ExecutionResult;
use crate::domain::script::ScriptSpec;

/// Namespace used when a request does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Caller-supplied parameters of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Execution variables passed to the executor
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables_file_content: Option<String>,
    /// Image override for container based executors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Additional arguments for the executor binary
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub envs: HashMap<String, String>,
    /// Secret references in the form `secret_name -> secret_key`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub secret_envs: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
}

/// Request to execute a script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Execution name; generated when empty
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(flatten)]
    pub parameters: RunParameters,
}

impl RunRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: default_namespace(),
            parameters: RunParameters::default(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.params.insert(key.into(), value.into());
        self
    }
}

/// Everything an executor backend needs to start a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    #[serde(flatten)]
    pub spec: ScriptSpec,
    #[serde(flatten)]
    pub parameters: RunParameters,
}

/// Run as reported by an executor backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendExecution {
    pub id: String,
    #[serde(default)]
    pub result: ExecutionResult,
}
