use lang_search_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

impl PresetEvent {
    /// Shorthand for a tool call that takes a single `query` argument.
    pub fn search<S1, S2, S3>(id: S1, tool: S2, query: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        PresetEvent::ToolCall(ToolCallRequest {
            id: id.into(),
            name: tool.into(),
            arguments: json!({ "query": query.into() }),
        })
    }
}

/// A scripted failure of the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// The preset response for one model request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this error instead of streaming
    /// `events`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a text-only answer.
    #[inline]
    pub fn answer<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a response that fails the request.
    #[inline]
    pub fn failure<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            events: vec![],
            failure: Some(PresetFailure {
                kind,
                message: message.into(),
            }),
        }
    }
}
