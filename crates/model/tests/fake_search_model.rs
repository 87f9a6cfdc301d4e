use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use lang_search_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ModelTool, ToolCallRequest, ToolCallResult,
};
use serde_json::json;
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Emits its events one by one, each after a tiny delay.
#[derive(Debug)]
struct FakeModelResponse {
    events: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn answer(text: &str) -> Self {
        let mut events: VecDeque<_> = text
            .split_inclusive(' ')
            .map(|word| ModelResponseEvent::MessageDelta(word.to_owned()))
            .collect();
        events.push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));
        Self {
            events,
            sleep: None,
        }
    }

    fn search(tool: &str, query: &str) -> Self {
        let events = [
            ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call:0".to_owned(),
                name: tool.to_owned(),
                arguments: json!({ "query": query }),
            }),
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
        ];
        Self {
            events: events.into(),
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.events.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

/// Searches with the first available tool, then answers with whatever the
/// tool returned.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = match req.messages.last() {
            None => Err(FakeModelProviderError(ErrorKind::Other)),
            Some(ModelMessage::User(query)) => match req.tools.first() {
                Some(tool) => Ok(FakeModelResponse::search(&tool.name, query)),
                None => Ok(FakeModelResponse::answer("I cannot search")),
            },
            Some(ModelMessage::Tool(result)) => {
                Ok(FakeModelResponse::answer(&result.content))
            }
            Some(_) => Err(FakeModelProviderError(ErrorKind::Parsing)),
        };
        ready(result)
    }
}

async fn collect(
    mut resp: FakeModelResponse,
) -> (String, Vec<ToolCallRequest>, Option<ModelFinishReason>) {
    use std::future::poll_fn;

    let mut text = String::new();
    let mut calls = vec![];
    let mut finish_reason = None;
    while let Some(event) = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
        .await
        .unwrap()
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::ToolCall(call) => calls.push(call),
            ModelResponseEvent::Completed(reason) => finish_reason = Some(reason),
        }
    }
    (text, calls, finish_reason)
}

#[tokio::test]
async fn test_tool_round_trip() {
    let provider = FakeModelProvider;
    let mut req = ModelRequest {
        messages: vec![ModelMessage::User("quantum entanglement".to_owned())],
        tools: vec![ModelTool {
            name: "wikipedia".to_owned(),
            description: "Looks up encyclopedia articles".to_owned(),
            parameters: json!({ "type": "object" }),
        }],
    };

    let resp = provider.send_request(&req).await.unwrap();
    let (text, calls, reason) = collect(resp).await;
    assert!(text.is_empty());
    assert_eq!(reason, Some(ModelFinishReason::ToolCalls));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "wikipedia");
    assert_eq!(calls[0].arguments, json!({ "query": "quantum entanglement" }));

    req.messages.push(ModelMessage::AssistantToolCalls {
        content: String::new(),
        calls: calls.clone(),
    });
    req.messages.push(ModelMessage::Tool(ToolCallResult {
        id: calls[0].id.clone(),
        content: "Page: Quantum entanglement".to_owned(),
    }));

    let resp = provider.send_request(&req).await.unwrap();
    let (text, calls, reason) = collect(resp).await;
    assert_eq!(text, "Page: Quantum entanglement");
    assert!(calls.is_empty());
    assert_eq!(reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_error() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![],
        tools: vec![],
    };
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);

    let req = ModelRequest {
        messages: vec![ModelMessage::Assistant("dangling".to_owned())],
        tools: vec![],
    };
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parsing);
}
