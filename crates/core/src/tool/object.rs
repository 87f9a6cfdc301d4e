use std::pin::Pin;

use serde_json::Value;
use tracing::Instrument;

use super::{Error, ResultLimits, Tool, ToolResult};

/// Type-erased view of a [`Tool`], so tools with different inputs can live
/// in one registry.
pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn limits(&self) -> ResultLimits;

    fn rate_limited(&self) -> bool;

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn limits(&self) -> ResultLimits {
        self.0.limits()
    }

    #[inline]
    fn rate_limited(&self) -> bool {
        self.0.rate_limited()
    }

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };

        let limits = self.0.limits();
        let fut = self.0.execute(input);
        Box::pin(
            async move {
                // Output never exceeds the tool's character bound.
                fut.await.map(|output| limits.truncate(output))
            }
            .instrument(debug_span!("tool execute", tool = self.0.name())),
        )
    }
}
