use std::error::Error as _;

use crate::dispatcher::{DispatchEvent, Dispatcher};
use crate::rate_limiter::RateLimiter;
use crate::transcript::{Transcript, Turn};

/// One user's conversation with the assistant.
///
/// A session exclusively owns its transcript and rate limiter, so separate
/// sessions never throttle each other. Queries are handled one at a time.
pub struct Session {
    dispatcher: Dispatcher,
    transcript: Transcript,
    rate_limiter: RateLimiter,
}

impl Session {
    /// Creates a session with a fresh transcript and the default rate
    /// limiter.
    #[inline]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_rate_limiter(dispatcher, RateLimiter::new())
    }

    /// Creates a session with a custom rate limiter.
    #[inline]
    pub fn with_rate_limiter(
        dispatcher: Dispatcher,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            dispatcher,
            transcript: Transcript::new(),
            rate_limiter,
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the dispatcher that answers queries.
    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one user query and returns the assistant turn it produced.
    ///
    /// Blank input is ignored and leaves the transcript untouched. Otherwise
    /// the query is recorded, held back by the rate limiter if the assistant
    /// can reach a rate-sensitive tool, and dispatched. The answer, or the
    /// user-facing text of the error, is recorded as the assistant's reply.
    pub async fn submit_query(&mut self, text: &str) -> Option<&Turn> {
        if text.trim().is_empty() {
            trace!("ignoring blank input");
            return None;
        }

        self.transcript.append(Turn::user(text));

        if self.dispatcher.registry().has_rate_limited_tool() {
            let dispatcher = &self.dispatcher;
            self.rate_limiter
                .acquire_with(|wait| {
                    dispatcher.notify(DispatchEvent::RateLimited { wait })
                })
                .await;
        }

        let reply = match self.dispatcher.dispatch(text).await {
            Ok(answer) => answer,
            Err(err) => {
                match err.source() {
                    Some(cause) => error!("dispatch failed: {err} ({cause})"),
                    None => error!("dispatch failed: {err}"),
                }
                err.to_string()
            }
        };
        self.transcript.append(Turn::assistant(reply));
        self.transcript.last()
    }
}
