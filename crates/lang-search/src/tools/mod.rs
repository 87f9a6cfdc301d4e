//! The lookup tools the assistant can use.

mod arxiv;
mod web_search;
mod wikipedia;

use std::borrow::Cow;
use std::fmt::Display;
use std::sync::LazyLock;
use std::time::Duration;

use lang_search_core::tool::Error as ToolError;
use regex::Regex;
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

pub use arxiv::ArxivTool;
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

const USER_AGENT: &str = concat!(
    "lang-search/",
    env!("CARGO_PKG_VERSION"),
    " (conversational search assistant)"
);

/// The input shared by every lookup tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryParameters {
    #[schemars(description = "The search query.")]
    query: String,
}

impl QueryParameters {
    /// Returns the search query.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }
}

fn query_schema() -> Value {
    schema_for!(QueryParameters).to_value()
}

/// Creates the HTTP client shared by the lookup tools.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
}

/// Fetches `url` and returns the response body as text.
async fn fetch_text(client: &Client, url: &str) -> Result<String, ToolError> {
    trace!("GET {url}");
    let resp = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(request_error)?;
    resp.text().await.map_err(request_error)
}

fn request_error(err: reqwest::Error) -> ToolError {
    warn!("lookup request failed: {err}");
    ToolError::execution_error().with_reason(err.to_string())
}

fn decode_error(err: impl Display) -> ToolError {
    warn!("unexpected lookup response: {err}");
    ToolError::execution_error()
        .with_reason(format!("unexpected response: {err}"))
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap()
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Removes HTML tags, keeping their text content.
pub(crate) fn strip_tags(html: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(html, "")
}

/// Decodes numeric and the common named HTML entities. Unknown entities are
/// left as they are.
pub(crate) fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse().ok().and_then(char::from_u32)
        } else {
            match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => None,
            }
        };
        match decoded {
            Some(ch) => ch.to_string(),
            None => caps[0].to_owned(),
        }
    })
}

/// Collapses runs of whitespace into a single space and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Turns an HTML fragment into plain text.
pub(crate) fn html_to_text(html: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_tags(html)))
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;

    use lang_search_core::tool::{Tool, ToolResult};

    use super::*;

    type PendingLookup = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

    fn input(query: &str) -> QueryParameters {
        QueryParameters {
            query: query.to_owned(),
        }
    }

    #[test]
    fn test_lookups_own_their_input() {
        let client = Client::new();
        let pending: Vec<PendingLookup> = {
            let wikipedia = WikipediaTool::new(client.clone());
            let arxiv = ArxivTool::new(client.clone());
            let web_search = WebSearchTool::new(client);
            vec![
                Box::pin(wikipedia.execute(input("rust"))),
                Box::pin(arxiv.execute(input("attention"))),
                Box::pin(web_search.execute(input("tokio"))),
            ]
        };
        // The tools and inputs are gone, the lookups are not.
        assert_eq!(pending.len(), 3);
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("  <b>Rust</b> is a\n  <i>systems</i> language  "),
            "Rust is a systems language"
        );
        assert_eq!(
            html_to_text("Tom &amp; Jerry &#39;s &#x41;"),
            "Tom & Jerry 's A"
        );
        assert_eq!(decode_entities("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
    }

    #[test]
    fn test_query_schema() {
        let schema = query_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["query"]));
        assert_eq!(
            schema["properties"]["query"]["description"],
            "The search query."
        );
    }
}
