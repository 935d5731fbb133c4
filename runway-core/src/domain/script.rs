//! Script definition types
//!
//! The execution spec of a script as resolved from the definition store.
//! A snapshot of it is stored on every [`Execution`](crate::domain::execution::Execution).

use serde::{Deserialize, Serialize};

/// Where the script content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Content passed inline with the definition
    #[serde(alias = "string")]
    Content,
    /// Content checked out from a git repository
    #[serde(alias = "git-file", alias = "git-dir")]
    Git,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::Content => write!(f, "content"),
            InputType::Git => write!(f, "git"),
        }
    }
}

/// Repository coordinates for git-sourced scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "type", default = "default_repository_type")]
    pub kind: String,
    pub uri: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

fn default_repository_type() -> String {
    "git".to_string()
}

/// Execution spec of a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSpec {
    /// Runner family, e.g. `postman/collection`
    #[serde(rename = "type")]
    pub script_type: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
}

impl ScriptSpec {
    /// Spec for a script whose content is passed inline
    pub fn inline(script_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            script_type: script_type.into(),
            input_type: InputType::Content,
            content: Some(content.into()),
            repository: None,
        }
    }

    /// Checks that the spec carries the source its input type requires
    pub fn validate(&self) -> Result<(), String> {
        if self.script_type.is_empty() {
            return Err("script type cannot be empty".to_string());
        }
        match self.input_type {
            InputType::Content if self.content.is_none() => {
                Err("content input requires inline content".to_string())
            }
            InputType::Git if self.repository.as_ref().is_none_or(|r| r.uri.is_empty()) => {
                Err("git input requires a repository uri".to_string())
            }
            _ => Ok(()),
        }
    }
}
