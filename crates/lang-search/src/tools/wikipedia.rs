use lang_search_core::tool::{
    Error as ToolError, ResultLimits, Tool, ToolResult,
};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{QueryParameters, decode_error, fetch_text, query_schema};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Looks up encyclopedia articles on Wikipedia.
pub struct WikipediaTool {
    client: Client,
    limits: ResultLimits,
    parameter_schema: Value,
}

impl WikipediaTool {
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

    /// Searches for `query` and returns the intros of the best matching
    /// articles.
    pub fn run(
        &self,
        query: &str,
    ) -> impl Future<Output = ToolResult> + Send + use<> {
        let client = self.client.clone();
        let limits = self.limits;
        let search_url = search_url(query, limits.max_results);
        async move {
            let body = fetch_text(&client, &search_url).await?;
            let titles = parse_search(&body)?;
            if titles.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }

            let body = fetch_text(&client, &extracts_url(&titles)).await?;
            let docs = parse_extracts(&body, &titles)?;
            if docs.is_empty() {
                return Ok(NO_RESULT.to_owned());
            }
            Ok(limits.apply(docs))
        }
    }
}

impl Tool for WikipediaTool {
    type Input = QueryParameters;

    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer \
        general questions about people, places, companies, facts, historical \
        events, or other subjects. Input should be a search query."
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

#[derive(Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    info: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    extract: Option<String>,
}

fn search_url(query: &str, limit: usize) -> String {
    format!(
        "{API_URL}?action=query&list=search&srsearch={}&srlimit={limit}\
        &format=json&formatversion=2",
        urlencoding::encode(query)
    )
}

fn extracts_url(titles: &[String]) -> String {
    format!(
        "{API_URL}?action=query&prop=extracts&exintro=1&explaintext=1\
        &exlimit=max&titles={}&format=json&formatversion=2",
        urlencoding::encode(&titles.join("|"))
    )
}

fn parse_response<T>(body: &str) -> Result<Option<T>, ToolError>
where
    T: DeserializeOwned,
{
    let resp: ApiResponse<T> =
        serde_json::from_str(body).map_err(decode_error)?;
    if let Some(error) = resp.error {
        return Err(decode_error(error.info));
    }
    Ok(resp.query)
}

fn parse_search(body: &str) -> Result<Vec<String>, ToolError> {
    let query: Option<SearchQuery> = parse_response(body)?;
    Ok(query
        .map(|query| query.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

/// Returns one document per page with a non-empty extract, in the order of
/// `titles`.
fn parse_extracts(
    body: &str,
    titles: &[String],
) -> Result<Vec<String>, ToolError> {
    let query: Option<PagesQuery> = parse_response(body)?;
    let mut pages = query.map(|query| query.pages).unwrap_or_default();
    pages.sort_by_key(|page| {
        titles
            .iter()
            .position(|title| *title == page.title)
            .unwrap_or(usize::MAX)
    });

    Ok(pages
        .into_iter()
        .filter_map(|page| {
            let extract = page.extract?;
            let extract = extract.trim();
            if extract.is_empty() {
                return None;
            }
            Some(format!("Page: {}\nSummary: {extract}", page.title))
        })
        .collect())
}
