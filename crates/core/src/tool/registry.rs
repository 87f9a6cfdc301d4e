use std::future::ready;
use std::pin::Pin;

use lang_search_model::{ModelTool, ToolCallRequest};
use serde_json::Value;

use super::object::{ToolObject, ToolObjectImpl};
use super::{Error, ResultLimits, Tool, ToolResult};

/// Static description of a registered tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Name the model uses to call the tool.
    pub name: String,
    /// What the tool is good for, shown to the model.
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub parameters: Value,
    /// Bounds applied to the tool's output.
    pub limits: ResultLimits,
    /// Whether the tool sits behind the session's rate limiter.
    pub rate_limited: bool,
}

impl ToolDescriptor {
    /// Converts the descriptor into the definition sent to the model.
    #[inline]
    pub fn to_model_tool(&self) -> ModelTool {
        ModelTool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// A fixed, ordered set of tools the model can call.
///
/// Order is the registration order and is preserved in everything the
/// registry hands out, including the definitions sent to the model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolObject>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced in place.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let tool: Box<dyn ToolObject> = Box::new(ToolObjectImpl(tool));
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => {
                warn!("replacing tool: {}", tool.name());
                *existing = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Registers a tool, builder style.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.add_tool(tool);
        self
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Returns the descriptors of every tool in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
                limits: tool.limits(),
                rate_limited: tool.rate_limited(),
            })
            .collect()
    }

    /// Returns the definitions sent to the model.
    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.descriptors()
            .iter()
            .map(ToolDescriptor::to_model_tool)
            .collect()
    }

    /// Returns `true` if any registered tool is rate-sensitive.
    #[inline]
    pub fn has_rate_limited_tool(&self) -> bool {
        self.tools.iter().any(|tool| tool.rate_limited())
    }

    /// Runs the tool a model asked for.
    ///
    /// Unknown tools and undecodable arguments resolve to an error instead
    /// of panicking, so the model can be told what went wrong. Failures are
    /// never retried here.
    pub fn run(
        &self,
        req: &ToolCallRequest,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let Some(tool) = self.tools.iter().find(|t| t.name() == req.name) else {
            warn!("tool not found: {}", req.name);
            let reason = format!(
                "`{}` is not a valid tool, try one of [{}]",
                req.name,
                self.names().join(", ")
            );
            let err = Error::unknown_tool().with_reason(reason);
            return Box::pin(ready(Err(err)));
        };
        trace!("running tool ({}) with args: {:?}", req.id, req.arguments);
        tool.execute(req.arguments.clone())
    }
}
