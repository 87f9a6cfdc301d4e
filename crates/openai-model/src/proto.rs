use lang_search_model::{
    ModelMessage, ModelRequest, ModelTool, ToolCallRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionToolCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub id: Option<String>,
    pub r#type: Option<String>,
    pub function: Option<FunctionToolCall>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: Some(content.clone()),
            tool_calls: None,
        },
        ModelMessage::AssistantToolCalls { content, calls } => {
            Message::Assistant {
                content: (!content.is_empty()).then(|| content.clone()),
                tool_calls: Some(calls.iter().map(create_tool_call).collect()),
            }
        }
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool_call(call: &ToolCallRequest) -> ToolCall {
    ToolCall {
        index: None,
        id: Some(call.id.clone()),
        r#type: Some("function".to_owned()),
        function: Some(FunctionToolCall {
            name: Some(call.name.clone()),
            arguments: Some(call.arguments.to_string()),
        }),
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use lang_search_model::ToolCallResult;
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a search assistant.".to_owned()),
                ModelMessage::User("Hello".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "wikipedia".to_owned(),
                description: "Looks up encyclopedia articles.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } }
                }),
            }],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "You are a search assistant.".to_owned(),
                },
                Message::User {
                    content: "Hello".to_owned(),
                },
            ],
            tools: vec![Tool {
                r#type: "function",
                function: FunctionTool {
                    name: "wikipedia".to_owned(),
                    description: "Looks up encyclopedia articles.".to_owned(),
                    parameters: json!({
                        "type": "object",
                        "properties": { "query": { "type": "string" } }
                    }),
                },
            }],
            stream: true,
        };
        assert_eq!(create_request(&request, &config), expected);
    }

    #[test]
    fn test_tool_call_history_wire_format() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::AssistantToolCalls {
                    content: String::new(),
                    calls: vec![ToolCallRequest {
                        id: "call_1".to_owned(),
                        name: "arxiv".to_owned(),
                        arguments: json!({ "query": "attention" }),
                    }],
                },
                ModelMessage::Tool(ToolCallResult {
                    id: "call_1".to_owned(),
                    content: "Title: Attention Is All You Need".to_owned(),
                }),
            ],
            tools: vec![],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        let value =
            serde_json::to_value(create_request(&request, &config)).unwrap();

        assert!(value.get("tools").is_none());
        assert_eq!(
            value["messages"][0],
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "arxiv",
                        "arguments": "{\"query\":\"attention\"}"
                    }
                }]
            })
        );
        assert_eq!(
            value["messages"][1],
            json!({
                "role": "tool",
                "tool_call_id": "call_1",
                "content": "Title: Attention Is All You Need"
            })
        );
    }
}
