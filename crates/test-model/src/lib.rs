//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use lang_search_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<ModelResponseEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn from_preset(preset: PresetResponse, delay: Duration) -> Self {
        let has_tool_call = preset
            .events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        let mut events: VecDeque<_> = preset
            .events
            .into_iter()
            .map(|event| match event {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg)
                }
                PresetEvent::ToolCall(req) => ModelResponseEvent::ToolCall(req),
            })
            .collect();
        events.push_back(ModelResponseEvent::Completed(if has_tool_call {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        }));
        Self {
            events,
            delay,
            sleep: None,
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        if this.events.is_empty() {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.events.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to set up the script, which is how the
/// model should respond to each request. Responses are consumed in order,
/// one per request. If the script runs out, an error will be returned.
///
/// Clones share the same script and request log, so a test can keep a clone
/// around to inspect what the dispatcher sent.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<VecDeque<PresetResponse>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("request lock poisoned").clone()
    }

    /// Returns the number of scripted responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().expect("script lock poisoned").len()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.requests
            .lock()
            .expect("request lock poisoned")
            .push(req.clone());

        let preset = self.script.lock().expect("script lock poisoned").pop_front();
        let result = match preset {
            None => Err(Error {
                message: "no enough steps".to_owned(),
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(failure),
                ..
            }) => Err(Error {
                message: failure.message,
                kind: failure.kind,
            }),
            Some(preset) => Ok(TestModelResponse::from_preset(
                preset,
                self.delay.unwrap_or(Duration::from_millis(1)),
            )),
        };
        ready(result)
    }
}
