use anyhow::Result;
use async_stream::try_stream;
use futures::stream::BoxStream;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::Provider;
use crate::systems::System;

const BASE_PROMPT: &str = "You are a capable assistant with access to the user's working \
directory through the tools listed below. Use them whenever a question concerns local files. \
Keep answers short and direct.";

/// Drives the conversation: sends history to the provider, resolves the tool
/// requests the model issues, and re-queries until the model answers in
/// plain text.
pub struct Agent {
    systems: Vec<Box<dyn System>>,
    provider: Box<dyn Provider>,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            systems: Vec::new(),
            provider,
        }
    }

    /// Add a system to the agent
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// The combined tool catalog across all systems. Names must be unique;
    /// duplicates are rejected at the provider boundary.
    fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Find the system whose catalog declares the named tool
    fn system_for_tool(&self, name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == name))
            .map(|system| &**system)
    }

    /// Dispatch a single tool call. An unknown name becomes a ToolNotFound
    /// error result rather than a failure of the loop.
    async fn dispatch_tool_call(&self, call: ToolCall) -> AgentResult<String> {
        let system = self
            .system_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        system.call(call).await
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(BASE_PROMPT);
        for system in &self.systems {
            prompt.push_str(&format!(
                "\n\n## {}\n{}\n{}",
                system.name(),
                system.description(),
                system.instructions()
            ));
        }
        prompt
    }

    /// A stream of the messages generated during one reply round: the
    /// assistant turns and the synthetic user turns carrying tool results.
    ///
    /// Every tool request in an assistant turn is answered by exactly one
    /// tool response in the following user turn, matched by id, in the same
    /// order. A turn with no tool requests ends the round; a turn with at
    /// least one re-queries the provider without new user input.
    pub fn reply<'a>(&'a self, messages: &[Message]) -> BoxStream<'a, Result<Message>> {
        let mut messages = messages.to_vec();

        Box::pin(try_stream! {
            let tools = self.tools();
            let system_prompt = self.system_prompt();

            loop {
                let (response, _usage) = self
                    .provider
                    .complete(&system_prompt, &messages, &tools)
                    .await?;

                yield response.clone();

                // Let the consumer render the assistant turn, including the
                // tool invocations about to run, before execution starts.
                tokio::task::yield_now().await;

                let tool_requests: Vec<ToolRequest> = response
                    .content
                    .iter()
                    .filter_map(|content| content.as_tool_request().cloned())
                    .collect();

                if tool_requests.is_empty() {
                    break;
                }

                // Strictly sequential, in the order the model issued them:
                // tools share the filesystem.
                let mut tool_response = Message::user();
                for request in &tool_requests {
                    let output = self.dispatch_tool_call(request.tool_call.clone()).await;
                    tool_response = tool_response.with_tool_response(request.id.clone(), output);
                }

                yield tool_response.clone();

                messages.push(response);
                messages.push(tool_response);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{MessageContent, Role};
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde_json::json;

    struct MockSystem {
        tools: Vec<Tool>,
    }

    impl MockSystem {
        fn new() -> Self {
            Self {
                tools: vec![
                    Tool::new(
                        "echo",
                        "Echoes back the input",
                        json!({"type": "object", "properties": {"message": {"type": "string"}}, "required": ["message"]}),
                    ),
                    Tool::new(
                        "always_fails",
                        "Always returns an error",
                        json!({"type": "object", "properties": {}}),
                    ),
                ],
            }
        }
    }

    #[async_trait]
    impl System for MockSystem {
        fn name(&self) -> &str {
            "mock"
        }

        fn description(&self) -> &str {
            "A mock system for testing"
        }

        fn instructions(&self) -> &str {
            "Mock system instructions"
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> AgentResult<String> {
            match tool_call.name.as_str() {
                "echo" => Ok(tool_call.arguments["message"]
                    .as_str()
                    .unwrap_or("")
                    .to_string()),
                "always_fails" => Err(AgentError::ExecutionError("it broke".to_string())),
                _ => Err(AgentError::ToolNotFound(tool_call.name)),
            }
        }
    }

    fn agent_with(responses: Vec<Message>) -> (Agent, MockProvider) {
        let provider = MockProvider::new(responses);
        let handle = provider.clone();
        let mut agent = Agent::new(Box::new(provider));
        agent.add_system(Box::new(MockSystem::new()));
        (agent, handle)
    }

    async fn collect(agent: &Agent, messages: &[Message]) -> Vec<Message> {
        agent.reply(messages).try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn test_simple_response() {
        let response = Message::assistant().with_text("Hello!");
        let (agent, provider) = agent_with(vec![response.clone()]);

        let messages = collect(&agent, &[Message::user().with_text("Hi")]).await;

        // A text-only turn ends the round after a single completion
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], response);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_call_requeries_without_user_input() {
        let (agent, provider) = agent_with(vec![
            Message::assistant()
                .with_tool_request("1", ToolCall::new("echo", json!({"message": "test"}))),
            Message::assistant().with_text("Done!"),
        ]);

        let messages = collect(&agent, &[Message::user().with_text("Echo test")]).await;

        // Tool request turn, synthetic user turn, then the closing text turn
        assert_eq!(messages.len(), 3);
        assert_eq!(provider.call_count(), 2);

        assert!(matches!(messages[1].role, Role::User));
        let responses = messages[1].tool_responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, "1");
        assert_eq!(responses[0].tool_result, Ok("test".to_string()));

        assert_eq!(messages[2].content[0], MessageContent::text("Done!"));
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_error_result() {
        let (agent, _provider) = agent_with(vec![
            Message::assistant().with_tool_request("1", ToolCall::new("telepathy", json!({}))),
            Message::assistant().with_text("Error occurred"),
        ]);

        let messages = collect(&agent, &[Message::user().with_text("Guess my thoughts")]).await;

        assert_eq!(messages.len(), 3);
        let responses = messages[1].tool_responses();
        assert_eq!(responses.len(), 1);
        assert!(matches!(
            responses[0].tool_result,
            Err(AgentError::ToolNotFound(_))
        ));
        assert_eq!(messages[2].text(), "Error occurred");
    }

    #[tokio::test]
    async fn test_failing_tool_yields_error_result() {
        let (agent, _provider) = agent_with(vec![
            Message::assistant().with_tool_request("1", ToolCall::new("always_fails", json!({}))),
            Message::assistant().with_text("Understood"),
        ]);

        let messages = collect(&agent, &[Message::user().with_text("Try it")]).await;

        let responses = messages[1].tool_responses();
        assert_eq!(
            responses[0].tool_result,
            Err(AgentError::ExecutionError("it broke".to_string()))
        );
    }

    #[tokio::test]
    async fn test_multiple_tool_calls_answered_in_order() {
        let (agent, provider) = agent_with(vec![
            Message::assistant()
                .with_tool_request("1", ToolCall::new("echo", json!({"message": "first"})))
                .with_tool_request("2", ToolCall::new("echo", json!({"message": "second"}))),
            Message::assistant().with_text("All done!"),
        ]);

        let messages = collect(&agent, &[Message::user().with_text("Two calls")]).await;

        assert_eq!(messages.len(), 3);
        assert_eq!(provider.call_count(), 2);

        // Both results land in one synthetic user turn, ids in request order
        let responses = messages[1].tool_responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, "1");
        assert_eq!(responses[0].tool_result, Ok("first".to_string()));
        assert_eq!(responses[1].id, "2");
        assert_eq!(responses[1].tool_result, Ok("second".to_string()));
    }

    #[tokio::test]
    async fn test_mixed_text_and_tool_turn() {
        let (agent, _provider) = agent_with(vec![
            Message::assistant()
                .with_text("Let me look")
                .with_tool_request("1", ToolCall::new("echo", json!({"message": "peek"}))),
            Message::assistant().with_text("Found it"),
        ]);

        let messages = collect(&agent, &[Message::user().with_text("Look around")]).await;

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text(), "Let me look");
        assert_eq!(messages[1].tool_responses().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_does_not_mutate_caller_history() {
        let (agent, _provider) = agent_with(vec![
            Message::assistant().with_tool_request("1", ToolCall::new("echo", json!({"message": "x"}))),
            Message::assistant().with_text("done"),
        ]);

        let history = vec![Message::user().with_text("hi")];
        let _ = collect(&agent, &history).await;
        assert_eq!(history.len(), 1);
    }
}
