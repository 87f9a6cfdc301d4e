//! The protocol between the search agent and chat models.
//!
//! A [`ModelProvider`] takes a [`ModelRequest`] (the conversation so far and
//! the tools on offer) and streams back [`ModelResponseEvent`]s. Failures
//! carry an [`ErrorKind`] so the agent can tell malformed model output from
//! other errors.
//!
//! This crate only holds types and traits. Concrete providers live in their
//! own crates.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
