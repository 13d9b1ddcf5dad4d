use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model can ask the agent to run.
///
/// The input schema is an explicit JSON schema value attached at
/// construction time, so the declaration can be tested apart from whatever
/// code ends up executing the call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool, unique within the catalog sent to the model
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the tool's input
    pub input_schema: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A model-issued request to execute a named tool with structured input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
