use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelProviderError;

/// A completion that is streamed back as a sequence of events.
///
/// Events arrive in this order: text deltas and tool calls as the model
/// produces them, then one [`ModelResponseEvent::Completed`], then the end
/// of the stream.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error returned when the stream fails.
    type Error: ModelProviderError;

    /// Polls for the next event.
    ///
    /// Returns `Poll::Ready(Ok(Some(event)))` for each event,
    /// `Poll::Ready(Ok(None))` once the stream has ended and
    /// `Poll::Ready(Err(_))` if it broke off. After the end or an error,
    /// further polls keep returning `Ok(None)`. While no event is ready the
    /// current task is registered for wake-up and `Poll::Pending` is
    /// returned.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// Why the model stopped generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model wants the results of its tool calls.
    ToolCalls,
    /// The model finished its answer.
    Stop,
    /// The answer was cut off by the output token limit.
    Length,
}

/// A tool call the model asked for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifies the call, echoed back with its result.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// The arguments object, as decoded from the model's output.
    pub arguments: Value,
}

/// One step of a streamed completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// A piece of the answer text.
    MessageDelta(String),
    /// A complete tool call.
    ToolCall(ToolCallRequest),
    /// Generation finished for the given reason.
    Completed(ModelFinishReason),
}
