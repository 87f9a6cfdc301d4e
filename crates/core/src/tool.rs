//! Tool call supports.

mod error;
mod object;
mod registry;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use registry::{ToolDescriptor, ToolRegistry};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless. Any configuration,
/// such as the HTTP client or the result limits, is fixed when the tool is
/// created and copied into the future returned by [`Tool::execute`].
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Returns the bounds applied to the tool's output.
    fn limits(&self) -> ResultLimits;

    /// Whether calls to the tool need to be spaced out by the session's
    /// rate limiter.
    fn rate_limited(&self) -> bool {
        false
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// Bounds on how much a lookup tool hands back to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResultLimits {
    /// Maximum number of documents.
    pub max_results: usize,
    /// Maximum number of characters of the combined output.
    pub max_chars: usize,
}

impl ResultLimits {
    /// Keeps the first `max_results` documents, joins them with a blank line
    /// and cuts the result to `max_chars` characters.
    pub fn apply<I, S>(&self, docs: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for doc in docs.into_iter().take(self.max_results) {
            if !joined.is_empty() {
                joined.push_str("\n\n");
            }
            joined.push_str(doc.as_ref());
        }
        self.truncate(joined)
    }

    /// Cuts `text` to at most `max_chars` characters.
    pub fn truncate(&self, mut text: String) -> String {
        if let Some((idx, _)) = text.char_indices().nth(self.max_chars) {
            text.truncate(idx);
        }
        text
    }
}

impl Default for ResultLimits {
    #[inline]
    fn default() -> Self {
        Self {
            max_results: 3,
            max_chars: 1000,
        }
    }
}
