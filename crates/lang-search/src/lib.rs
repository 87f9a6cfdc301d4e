//! A conversational search assistant.
//!
//! The assistant answers questions with a language model that can look
//! things up on Wikipedia, arXiv and the web. The crate ships a terminal
//! client and can also be used as a library through [`AssistantBuilder`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod assistant;
pub mod config;
pub mod tools;

pub use assistant::AssistantBuilder;
pub use config::{Config, ConfigError};

/// Re-exports of [`lang_search_core`] crate.
pub mod core {
    pub use lang_search_core::*;
}
