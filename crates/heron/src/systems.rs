use async_trait::async_trait;

use crate::errors::AgentResult;
use crate::models::tool::{Tool, ToolCall};

/// A capability surface the agent can pilot through tools.
///
/// A system declares a fixed set of tools at construction and dispatches
/// calls to them by name. Declaration and dispatch are intentionally
/// separate: the catalog returned by `tools()` is what the model sees, and
/// `call()` is the only entry point for executing one.
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system
    fn name(&self) -> &str;

    /// Get the system description
    fn description(&self) -> &str;

    /// Instructions for the model on how to use this system
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Run a tool with the given structured input. Errors are returned, not
    /// raised: the conversation loop forwards them to the model as
    /// error-flagged tool results.
    async fn call(&self, tool_call: ToolCall) -> AgentResult<String>;
}
