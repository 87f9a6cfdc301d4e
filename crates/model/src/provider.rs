use crate::error::ModelProviderError;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// A chat model that can be asked for completions.
///
/// Providers are treated as stateless: every request carries the whole
/// conversation, and a provider may be dropped at any time. Any internal
/// state, such as a connection pool, must not leak into the responses.
pub trait ModelProvider: Send + Sync {
    /// The error returned when a request or its response fails.
    type Error: ModelProviderError;

    /// The streamed response of a request.
    type Response: ModelResponse<Error = Self::Error>;

    /// Starts a completion for `req`.
    ///
    /// The returned future owns everything it needs, so the request can be
    /// dropped as soon as this method returns.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
