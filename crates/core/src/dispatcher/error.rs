use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

use lang_search_model::{ErrorKind, ModelProviderError};

/// The error type of [`Dispatcher::dispatch`].
///
/// The display text of each variant is what the user sees in place of an
/// answer.
///
/// [`Dispatcher::dispatch`]: super::Dispatcher::dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The model produced output that could not be interpreted.
    #[error("⚠️ Parsing Error: {0}")]
    Parsing(String),
    /// Any other failure. The cause is only kept for logging.
    #[error("🚨 Oops! Something went wrong. Please try again later.")]
    Generic(#[source] Box<dyn StdError + Send + Sync>),
}

impl DispatchError {
    /// Returns `true` if this is a [`DispatchError::Parsing`].
    #[inline]
    pub fn is_parsing(&self) -> bool {
        matches!(self, DispatchError::Parsing(_))
    }

    pub(crate) fn from_provider(err: Box<dyn ModelProviderError>) -> Self {
        match err.kind() {
            ErrorKind::Parsing => DispatchError::Parsing(err.to_string()),
            _ => DispatchError::Generic(Box::new(ProviderFailure(err))),
        }
    }

    pub(crate) fn generic<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        DispatchError::Generic(Box::new(err))
    }
}

/// A model provider error, kept as the cause of a generic failure.
struct ProviderFailure(Box<dyn ModelProviderError>);

impl Debug for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model provider error ({}): {}", self.0.kind(), self.0)
    }
}

impl StdError for ProviderFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// The reasoning loop ran out of steps without a final answer.
#[derive(Debug, thiserror::Error)]
#[error("no final answer after {max_steps} steps")]
pub(crate) struct StepLimitExceeded {
    pub max_steps: usize,
}

/// The model finished without any text.
pub(crate) const EMPTY_ANSWER: &str =
    "Could not parse LLM output: the model returned an empty answer";
