//! Executor descriptor
//!
//! Maps a script type to the backend that runs it.

use serde::{Deserialize, Serialize};

use crate::domain::script::InputType;

/// Where runs of a given script type are dispatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutorTarget {
    /// Executor service reachable over HTTP
    Http { uri: String },
    /// Handler registered inside the process under the given name
    InProcess { handler: String },
}

/// Declares which backend handles a script type and what input it accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDescriptor {
    #[serde(rename = "type")]
    pub script_type: String,
    pub target: ExecutorTarget,
    pub input_types: Vec<InputType>,
}

impl ExecutorDescriptor {
    pub fn accepts(&self, input_type: InputType) -> bool {
        self.input_types.contains(&input_type)
    }
}
