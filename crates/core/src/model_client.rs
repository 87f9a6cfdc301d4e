use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use lang_search_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, ToolCallRequest,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(String) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and collects the whole response. Text deltas are
    /// passed to `on_delta` as they arrive.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> Result<ModelClientResponse, Box<dyn ModelProviderError>> {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub transcript: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Box<dyn Fn(String) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut transcript = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                transcript.push_str(&msg);
                on_delta(msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        transcript,
        tool_calls,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use lang_search_model::{ErrorKind, ModelMessage};
    use lang_search_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.add_response(PresetResponse::with_events([
                PresetEvent::MessageDelta("How ".to_owned()),
                PresetEvent::MessageDelta("are ".to_owned()),
                PresetEvent::MessageDelta("you?".to_owned()),
            ]));
        }

        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let deltas = Arc::new(Mutex::new(vec![]));
            let resp = model_client
                .send_request(request(), {
                    let deltas = Arc::clone(&deltas);
                    move |delta| deltas.lock().unwrap().push(delta)
                })
                .await
                .unwrap();
            assert_eq!(resp.transcript, "How are you?");
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
            assert!(resp.tool_calls.is_empty());
            assert_eq!(deltas.lock().unwrap().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_tool_calls() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([
            PresetEvent::search("call:1", "wikipedia", "rust"),
            PresetEvent::search("call:2", "web_search", "rust"),
        ]));
        let model_client = ModelClient::new(model_provider);

        let resp = model_client.send_request(request(), |_| {}).await.unwrap();
        assert!(resp.transcript.is_empty());
        assert_eq!(resp.tool_calls.len(), 2);
        assert_eq!(resp.tool_calls[1].name, "web_search");
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::failure(
            ErrorKind::RateLimitExceeded,
            "slow down",
        ));
        let model_client = ModelClient::new(model_provider);

        let err = model_client
            .send_request(request(), |_| {})
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        // The script is exhausted now.
        let resp_or_err = model_client.send_request(request(), |_| {}).await;
        assert!(resp_or_err.is_err());
    }
}
