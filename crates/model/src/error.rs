use std::error::Error;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Broad classification of a provider failure.
///
/// Callers use the kind to decide how a failure is reported. Only
/// [`ErrorKind::Parsing`] is surfaced with its detail, everything else is
/// shown as a generic failure.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ErrorKind {
    /// The provider refused the content.
    Moderated,
    /// Too many requests or the quota is used up.
    RateLimitExceeded,
    /// The model produced output that could not be interpreted, such as
    /// malformed tool call arguments.
    Parsing,
    /// Network failures, bad credentials, and the rest.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::Moderated => "Moderated",
            ErrorKind::RateLimitExceeded => "Rate limit exceeded",
            ErrorKind::Parsing => "Parsing error",
            ErrorKind::Other => "Other",
        };
        f.write_str(text)
    }
}

/// Implemented by the error type of every [`ModelProvider`].
///
/// [`ModelProvider`]: crate::ModelProvider
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Classifies this error.
    fn kind(&self) -> ErrorKind;
}
