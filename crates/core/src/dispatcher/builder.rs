use lang_search_model::ModelProvider;

use super::{DEFAULT_MAX_STEPS, DispatchEvent, Dispatcher};
use crate::model_client::ModelClient;
use crate::tool::{Tool, ToolRegistry};

/// [`Dispatcher`] builder.
pub struct DispatcherBuilder {
    model_client: ModelClient,
    registry: ToolRegistry,
    system_prompt: Option<String>,
    max_steps: usize,
    on_event: Option<super::EventHandler>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: ToolRegistry::new(),
            system_prompt: None,
            max_steps: DEFAULT_MAX_STEPS,
            on_event: None,
        }
    }

    /// Replaces the tool registry.
    #[inline]
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.registry.add_tool(tool);
        self
    }

    /// Sets the system instructions sent ahead of every query.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum number of model round trips per query.
    ///
    /// A value of zero is treated as one.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Attaches a callback that receives progress notifications.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(DispatchEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(std::sync::Arc::new(on_event));
        self
    }

    /// Builds the dispatcher.
    #[inline]
    pub fn build(self) -> Dispatcher {
        let Self {
            model_client,
            registry,
            system_prompt,
            max_steps,
            on_event,
        } = self;
        debug!("building dispatcher with tools: {:?}", registry.names());
        Dispatcher {
            model_client,
            registry,
            system_prompt,
            max_steps,
            on_event,
        }
    }
}
