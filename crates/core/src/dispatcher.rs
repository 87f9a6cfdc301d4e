//! The reasoning loop behind a single query.

mod builder;
mod error;
mod prompt;

use std::sync::Arc;
use std::time::Duration;

use lang_search_model::{
    ModelFinishReason, ModelMessage, ModelRequest, ToolCallRequest,
    ToolCallResult,
};
use serde_json::Value;

use crate::model_client::ModelClient;
use crate::tool::{Error as ToolError, ToolRegistry};
pub use builder::DispatcherBuilder;
pub use error::DispatchError;
use error::{EMPTY_ANSWER, StepLimitExceeded};
pub use prompt::augment_query;

/// How many model round trips a single query may take by default.
pub const DEFAULT_MAX_STEPS: usize = 15;

/// Progress notifications emitted while a query is being handled.
///
/// These are purely informational, the result of a dispatch does not
/// depend on whether anyone listens.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchEvent {
    /// The query is held back by the rate limiter.
    RateLimited {
        /// How long the query will wait.
        wait: Duration,
    },
    /// A piece of the answer text.
    MessageDelta(String),
    /// The model asked for a tool.
    ToolCall {
        /// Name of the tool.
        name: String,
        /// Arguments as sent by the model.
        arguments: Value,
    },
    /// A tool call finished.
    ToolResult {
        /// Name of the tool.
        name: String,
        /// Whether the tool produced an output.
        success: bool,
    },
}

pub(crate) type EventHandler = Arc<dyn Fn(DispatchEvent) + Send + Sync>;

/// Turns a user query into a final answer by running a function-calling
/// agent over a [`ToolRegistry`].
///
/// A dispatcher holds no per-query state and can be reused for any number
/// of queries.
pub struct Dispatcher {
    model_client: ModelClient,
    registry: ToolRegistry,
    system_prompt: Option<String>,
    max_steps: usize,
    on_event: Option<EventHandler>,
}

impl Dispatcher {
    /// Returns the registry the model can call into.
    #[inline]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Returns the maximum number of model round trips per query.
    #[inline]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub(crate) fn notify(&self, event: DispatchEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }

    /// Produces an answer for `query`.
    ///
    /// The query is wrapped with [`augment_query`] and sent to the model
    /// together with the registry's tool definitions. Tool calls are run
    /// one after another and their outputs, including failures, are handed
    /// back to the model until it answers with text.
    pub async fn dispatch(&self, query: &str) -> Result<String, DispatchError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(ModelMessage::System(system_prompt.clone()));
        }
        messages.push(ModelMessage::User(augment_query(query)));
        let tools = self.registry.definitions();

        let mut last_tool_error = None;
        for step in 0..self.max_steps {
            debug!("dispatch step {step}");
            let req = ModelRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let resp = self
                .model_client
                .send_request(req, self.delta_handler())
                .await
                .map_err(DispatchError::from_provider)?;
            debug!(
                "model finished ({:?}) with {} tool call(s)",
                resp.finish_reason,
                resp.tool_calls.len()
            );

            if resp.tool_calls.is_empty() {
                if resp.transcript.trim().is_empty() {
                    warn!("model finished without an answer");
                    return Err(DispatchError::Parsing(EMPTY_ANSWER.to_owned()));
                }
                if resp.finish_reason == Some(ModelFinishReason::Length) {
                    warn!("answer was cut off by the output limit");
                }
                return Ok(resp.transcript);
            }

            messages.push(ModelMessage::AssistantToolCalls {
                content: resp.transcript,
                calls: resp.tool_calls.clone(),
            });
            for call in resp.tool_calls {
                let (result, err) = self.run_tool(&call).await;
                if err.is_some() {
                    last_tool_error = err;
                }
                messages.push(ModelMessage::Tool(result));
            }
        }

        warn!("giving up after {} steps", self.max_steps);
        Err(match last_tool_error {
            Some(err) => DispatchError::generic(err),
            None => DispatchError::generic(StepLimitExceeded {
                max_steps: self.max_steps,
            }),
        })
    }

    async fn run_tool(
        &self,
        call: &ToolCallRequest,
    ) -> (ToolCallResult, Option<ToolError>) {
        self.notify(DispatchEvent::ToolCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let output = self.registry.run(call).await;
        self.notify(DispatchEvent::ToolResult {
            name: call.name.clone(),
            success: output.is_ok(),
        });

        let (content, err) = match output {
            Ok(content) => (content, None),
            Err(err) => {
                warn!("tool `{}` failed: {err}", call.name);
                (format!("Error: {err}"), Some(err))
            }
        };
        let result = ToolCallResult {
            id: call.id.clone(),
            content,
        };
        (result, err)
    }

    fn delta_handler(&self) -> impl Fn(String) + Send + 'static {
        let on_event = self.on_event.clone();
        move |delta| {
            if let Some(on_event) = &on_event {
                on_event(DispatchEvent::MessageDelta(delta));
            }
        }
    }
}
