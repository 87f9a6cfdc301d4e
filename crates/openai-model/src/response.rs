use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use lang_search_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCall};

struct PartialState {
    sse: Sse,
    id: Option<String>,
    tool_calls: Vec<ToolCall>,
    // Indices of tool calls that have started streaming but have not been
    // handed out yet. Arguments arrive in fragments, so a call is emitted only
    // once the stream moves past it.
    pending_tool_call_idx: VecDeque<usize>,
    // Cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    let mut message_delta = None;

    while !partial_state.finished {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                partial_state.finished = true;
                break;
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            partial_state.finished = true;
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if partial_state.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id
        {
            return Err(Error::new("chunk id mismatch", ErrorKind::Other));
        };

        // Trailing usage chunks carry no choices.
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                message_delta = Some(content);
            }
        }
        if let Some(tool_calls) = choice.delta.tool_calls {
            merge_tool_calls(&mut partial_state, tool_calls);
        }

        if let Some(finish_reason) = choice.finish_reason {
            partial_state.pending_finish_reason =
                Some(match finish_reason.as_str() {
                    "tool_calls" => ModelFinishReason::ToolCalls,
                    "length" => ModelFinishReason::Length,
                    _ => ModelFinishReason::Stop,
                });
            partial_state.finished = true;
            break;
        }

        if message_delta.is_some() {
            break;
        }
    }

    // The order of events is important. Always emit message delta first, then
    // emit pending tool calls, and finally emit pending finish reason if any.

    if let Some(message_delta) = message_delta {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(idx) = partial_state.pending_tool_call_idx.pop_front() {
        let event = ModelResponseEvent::ToolCall(finish_tool_call(
            &partial_state.tool_calls[idx],
        )?);
        return Ok((Some(event), partial_state));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

fn merge_tool_calls(partial_state: &mut PartialState, tool_calls: Vec<ToolCall>) {
    for tool_call in tool_calls {
        let Some(partial_tool_call) = partial_state
            .tool_calls
            .iter_mut()
            .find(|t| t.index == tool_call.index)
        else {
            partial_state
                .pending_tool_call_idx
                .push_back(partial_state.tool_calls.len());
            partial_state.tool_calls.push(tool_call);
            continue;
        };
        // Patch the partial tool call.
        if let Some(id) = tool_call.id {
            partial_tool_call.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = tool_call.r#type {
            partial_tool_call.r#type.get_or_insert_default().push_str(&ty);
        }
        if let Some(function) = tool_call.function {
            match partial_tool_call.function {
                Some(ref mut partial_func) => {
                    if let Some(name) = function.name {
                        partial_func.name.get_or_insert_default().push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        partial_func
                            .arguments
                            .get_or_insert_default()
                            .push_str(&arguments);
                    }
                }
                None => partial_tool_call.function = Some(function),
            }
        }
    }
}

/// Converts a fully streamed tool call. Arguments that are not a JSON
/// object mean the model produced an unusable call.
fn finish_tool_call(tool_call: &ToolCall) -> Result<ToolCallRequest, Error> {
    let id = tool_call.id.clone().unwrap_or_default();
    let name = tool_call
        .function
        .as_ref()
        .and_then(|f| f.name.clone())
        .unwrap_or_default();
    let raw_arguments = tool_call
        .function
        .as_ref()
        .and_then(|f| f.arguments.as_deref())
        .map(str::trim)
        .unwrap_or_default();

    let arguments = if raw_arguments.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str::<Value>(raw_arguments).map_err(|err| {
            Error::new(
                format!("Could not parse arguments of `{name}`: {err}"),
                ErrorKind::Parsing,
            )
        })?
    };
    if !arguments.is_object() {
        return Err(Error::new(
            format!("Arguments of `{name}` must be an object: {raw_arguments}"),
            ErrorKind::Parsing,
        ));
    }

    Ok(ToolCallRequest {
        id,
        name,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use lang_search_model::ModelProviderError;
    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    async fn collect_events(
        payload: &'static [u8],
    ) -> Result<Vec<ModelResponseEvent>, Error> {
        let chunks = Chunks::from_vec_deque(vec![Bytes::from_static(payload)].into());
        let mut resp = pin!(OpenAIResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            events.push(event);
        }
        Ok(events)
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let events =
            collect_events(include_bytes!("../fixtures/tool_call_response.txt"))
                .await
                .unwrap();

        let tool_calls: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::ToolCall(req) => Some(req.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].id, "call_wiki");
        assert_eq!(tool_calls[0].name, "wikipedia");
        assert_eq!(
            tool_calls[0].arguments,
            json!({ "query": "quantum entanglement" })
        );
        assert_eq!(tool_calls[1].name, "arxiv");

        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::ToolCalls))
        );
    }

    #[tokio::test]
    async fn test_text_events() {
        let events =
            collect_events(include_bytes!("../fixtures/text_response.txt"))
                .await
                .unwrap();
        let text: String = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::MessageDelta(delta) => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Quantum entanglement links particles.");
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::Stop))
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let err = collect_events(
            b"data: {\"id\":\"c\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"web_search\",\"arguments\":\"{\\\"query\\\": \"}}]},\"finish_reason\":null}]}\n\n\
data: {\"id\":\"c\",\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n\
data: [DONE]\n\n",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parsing);
        assert!(err.message().contains("web_search"));
    }

    #[tokio::test]
    async fn test_length_finish_reason() {
        let events = collect_events(
            br#"data: {"id":"c","choices":[{"delta":{"role":"assistant","content":"Quantum"},"finish_reason":null}]}

data: {"id":"c","choices":[{"delta":{},"finish_reason":"length"}]}

data: [DONE]

"#,
        )
        .await
        .unwrap();
        assert_eq!(
            events,
            [
                ModelResponseEvent::MessageDelta("Quantum".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Length),
            ]
        );
    }
}
