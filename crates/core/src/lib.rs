//! Core logic of the search assistant: the rate limiter, tool registry,
//! agent dispatcher and the per-session transcript, tied together by
//! [`Session`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod dispatcher;
mod model_client;
pub mod rate_limiter;
mod session;
pub mod tool;
pub mod transcript;

pub use dispatcher::{
    DEFAULT_MAX_STEPS, DispatchError, DispatchEvent, Dispatcher,
    DispatcherBuilder, augment_query,
};
pub use rate_limiter::RateLimiter;
pub use session::Session;
pub use transcript::{GREETING, Role, Transcript, Turn};
