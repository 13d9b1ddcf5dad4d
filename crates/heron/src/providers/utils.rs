use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::models::message::{Message, MessageContent, Role};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::Usage;

/// Convert internal messages to the Anthropic messages API specification.
///
/// Tool responses ride in user turns as `tool_result` blocks keyed by the
/// originating `tool_use` id; a local error becomes an error-flagged result
/// with the error text as content, so the model can read it and react.
pub fn messages_to_anthropic_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let mut content = Vec::new();
        for msg_content in &message.content {
            match msg_content {
                MessageContent::Text(text) => {
                    content.push(json!({
                        "type": "text",
                        "text": text.text,
                    }));
                }
                MessageContent::ToolRequest(request) => {
                    content.push(json!({
                        "type": "tool_use",
                        "id": request.id,
                        "name": request.tool_call.name,
                        "input": request.tool_call.arguments,
                    }));
                }
                MessageContent::ToolResponse(response) => {
                    let (output, is_error) = match &response.tool_result {
                        Ok(output) => (output.clone(), false),
                        Err(e) => (e.to_string(), true),
                    };
                    content.push(json!({
                        "type": "tool_result",
                        "tool_use_id": response.id,
                        "content": output,
                        "is_error": is_error,
                    }));
                }
            }
        }

        messages_spec.push(json!({
            "role": role,
            "content": content,
        }));
    }

    messages_spec
}

/// Convert the tool catalog to the Anthropic tools specification.
pub fn tools_to_anthropic_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.input_schema,
        }));
    }

    Ok(result)
}

/// Convert an Anthropic messages API response to an assistant message.
pub fn anthropic_response_to_message(response: &Value) -> Result<Message> {
    let content = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow!("Invalid response: missing content array"))?;

    let mut message = Message::assistant();
    for block in content {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                let text = block
                    .get("text")
                    .and_then(|t| t.as_str())
                    .ok_or_else(|| anyhow!("Invalid response: text block without text"))?;
                message = message.with_text(text);
            }
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(|i| i.as_str())
                    .ok_or_else(|| anyhow!("Invalid response: tool_use block without id"))?;
                let name = block
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| anyhow!("Invalid response: tool_use block without name"))?;
                let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                message = message.with_tool_request(id, ToolCall::new(name, input));
            }
            Some(other) => {
                return Err(anyhow!("Invalid response: unexpected content type '{}'", other));
            }
            None => {
                return Err(anyhow!("Invalid response: content block without type"));
            }
        }
    }

    Ok(message)
}

pub fn get_anthropic_usage(response: &Value) -> Usage {
    let usage = match response.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("input_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let output_tokens = usage
        .get("output_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let total_tokens = match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => Some(input + output),
        _ => None,
    };

    Usage::new(input_tokens, output_tokens, total_tokens)
}
