use lang_search_core::tool::ToolRegistry;
use lang_search_core::{DispatchEvent, DispatcherBuilder, RateLimiter, Session};
use lang_search_model::ModelProvider;
use lang_search_openai_model::OpenAIProvider;

use crate::config::{Config, ConfigError};
use crate::tools::{ArxivTool, WebSearchTool, WikipediaTool, http_client};

/// Assembles a [`Session`] with the lookup tools.
///
/// Tools are registered in a fixed order: Wikipedia, arXiv, then the web
/// search.
pub struct AssistantBuilder {
    dispatcher_builder: DispatcherBuilder,
    rate_limiter: Option<RateLimiter>,
}

impl AssistantBuilder {
    /// Creates an assistant builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let dispatcher_builder =
            DispatcherBuilder::with_model_provider(provider)
                .with_system_prompt(include_str!("./system_prompt.md"));
        Self {
            dispatcher_builder,
            rate_limiter: None,
        }
    }

    /// Creates an assistant builder that talks to the configured
    /// OpenAI-compatible endpoint.
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        debug!("using model provider: {config:?}");
        let provider = OpenAIProvider::new(config.to_openai_config());
        Self::with_model_provider(provider)
    }

    /// Replaces the default system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.dispatcher_builder =
            self.dispatcher_builder.with_system_prompt(prompt);
        self
    }

    /// Sets the maximum number of model round trips per query.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.dispatcher_builder =
            self.dispatcher_builder.with_max_steps(max_steps);
        self
    }

    /// Replaces the session's rate limiter.
    #[inline]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Attaches a callback that receives progress notifications.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(DispatchEvent) + Send + Sync + 'static,
    ) -> Self {
        self.dispatcher_builder = self.dispatcher_builder.on_event(on_event);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Result<Session, ConfigError> {
        let client = http_client()?;
        let registry = ToolRegistry::new()
            .with_tool(WikipediaTool::new(client.clone()))
            .with_tool(ArxivTool::new(client.clone()))
            .with_tool(WebSearchTool::new(client));

        let dispatcher =
            self.dispatcher_builder.with_registry(registry).build();
        let rate_limiter = self.rate_limiter.unwrap_or_default();
        Ok(Session::with_rate_limiter(dispatcher, rate_limiter))
    }
}

#[cfg(test)]
mod tests {
    use lang_search_core::Role;
    use lang_search_model::ModelMessage;
    use lang_search_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[test]
    fn test_tool_order() {
        let session =
            AssistantBuilder::with_model_provider(TestModelProvider::default())
                .build()
                .unwrap();
        let registry = session.dispatcher().registry();
        assert_eq!(registry.names(), ["wikipedia", "arxiv", "web_search"]);
        assert!(registry.has_rate_limited_tool());
    }

    #[tokio::test]
    async fn test_first_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::answer("Hello there!"));
        let mut session =
            AssistantBuilder::with_model_provider(model_provider.clone())
                .build()
                .unwrap();

        let reply = session.submit_query("Hi").await.unwrap();
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.content(), "Hello there!");

        let requests = model_provider.requests();
        let ModelMessage::System(system_prompt) = &requests[0].messages[0]
        else {
            panic!("expected the system prompt first");
        };
        assert!(system_prompt.contains("`web_search`"));
        assert_eq!(requests[0].tools.len(), 3);
    }
}
