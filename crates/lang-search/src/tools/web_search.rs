use std::sync::LazyLock;

use lang_search_core::tool::{
    Error as ToolError, ResultLimits, Tool, ToolResult,
};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

use super::{
    QueryParameters, decode_error, fetch_text, html_to_text, query_schema,
};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)
        .unwrap()
});

/// Searches the web through DuckDuckGo.
///
/// DuckDuckGo throttles clients that query too often, so this tool is
/// marked as rate-sensitive.
pub struct WebSearchTool {
    client: Client,
    limits: ResultLimits,
    parameter_schema: Value,
}

impl WebSearchTool {
    /// Creates the tool with the default limits.
    #[inline]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            limits: ResultLimits::default(),
            parameter_schema: query_schema(),
        }
    }

    /// Overrides the result limits.
    #[inline]
    pub fn with_limits(mut self, limits: ResultLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Searches the web for `query` and returns the result snippets.
    pub fn run(
        &self,
        query: &str,
    ) -> impl Future<Output = ToolResult> + Send + use<> {
        let client = self.client.clone();
        let limits = self.limits;
        let url = format!("{SEARCH_URL}?q={}", urlencoding::encode(query));
        async move {
            let body = fetch_text(&client, &url).await?;
            let snippets = parse_results(&body)?;
            if snippets.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }
            Ok(limits.apply(snippets))
        }
    }
}

impl Tool for WebSearchTool {
    type Input = QueryParameters;

    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to \
        answer questions about current events. Input should be a search \
        query."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn limits(&self) -> ResultLimits {
        self.limits
    }

    fn rate_limited(&self) -> bool {
        true
    }

    fn execute(
        &self,
        input: QueryParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        self.run(input.query())
    }
}

/// Extracts the plain-text snippets from a result page.
fn parse_results(html: &str) -> Result<Vec<String>, ToolError> {
    // Served instead of results when the client is throttled.
    if html.contains("anomaly-modal") {
        return Err(decode_error("DuckDuckGo rejected the request"));
    }

    Ok(SNIPPET_RE
        .captures_iter(html)
        .map(|caps| html_to_text(&caps[1]))
        .filter(|snippet| !snippet.is_empty())
        .collect())
}
