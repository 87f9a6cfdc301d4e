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

const API_URL: &str = "https://export.arxiv.org/api/query";
const NO_RESULT: &str = "No good Arxiv Result was found";
/// Longer queries are cut, the API rejects very long search strings.
const MAX_QUERY_CHARS: usize = 300;

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap());
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").unwrap()
});

/// Looks up scientific preprints on arXiv.
pub struct ArxivTool {
    client: Client,
    limits: ResultLimits,
    parameter_schema: Value,
}

impl ArxivTool {
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

    /// Searches arXiv for `query` and returns the metadata and abstracts of
    /// the top papers.
    pub fn run(
        &self,
        query: &str,
    ) -> impl Future<Output = ToolResult> + Send + use<> {
        let client = self.client.clone();
        let limits = self.limits;
        let url = query_url(query, limits.max_results);
        async move {
            let body = fetch_text(&client, &url).await?;
            let docs = parse_feed(&body)?;
            if docs.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }
            Ok(limits.apply(docs))
        }
    }
}

impl Tool for ArxivTool {
    type Input = QueryParameters;

    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "A wrapper around Arxiv.org. Useful for when you need to answer \
        questions about Physics, Mathematics, Computer Science, Quantitative \
        Biology, Quantitative Finance, Statistics, Electrical Engineering, \
        and Economics from scientific articles on arxiv.org. Input should be \
        a search query."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn limits(&self) -> ResultLimits {
        self.limits
    }

    fn execute(
        &self,
        input: QueryParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        self.run(input.query())
    }
}

fn query_url(query: &str, limit: usize) -> String {
    let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
    format!(
        "{API_URL}?search_query=all:{}&start=0&max_results={limit}",
        urlencoding::encode(&query)
    )
}

/// Extracts the text of the first `<tag>` element in `xml`.
fn element<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = xml.find(&format!("<{tag}"))?;
    let content = open + xml[open..].find('>')? + 1;
    let len = xml[content..].find(&format!("</{tag}>"))?;
    Some(&xml[content..content + len])
}

/// Parses an Atom feed from the arXiv API into one document per entry.
fn parse_feed(body: &str) -> Result<Vec<String>, ToolError> {
    if !body.contains("<feed") {
        return Err(decode_error("not an Atom feed"));
    }

    let mut docs = vec![];
    for caps in ENTRY_RE.captures_iter(body) {
        let entry = &caps[1];

        // Invalid queries come back as a single entry describing the error.
        if element(entry, "id").is_some_and(|id| id.contains("/api/errors")) {
            let reason = element(entry, "summary").unwrap_or("unknown error");
            return Err(decode_error(html_to_text(reason)));
        }

        let date = element(entry, "updated")
            .or_else(|| element(entry, "published"))
            .map(|date| date.trim().get(..10).unwrap_or(date).to_owned())
            .unwrap_or_default();
        let title = element(entry, "title").map(html_to_text);
        let summary = element(entry, "summary").map(html_to_text);
        let authors: Vec<_> = AUTHOR_RE
            .captures_iter(entry)
            .map(|caps| html_to_text(&caps[1]))
            .collect();

        let (Some(title), Some(summary)) = (title, summary) else {
            debug!("skipping malformed arxiv entry");
            continue;
        };
        docs.push(format!(
            "Published: {date}\nTitle: {title}\nAuthors: {}\nSummary: {summary}",
            authors.join(", ")
        ));
    }
    Ok(docs)
}
