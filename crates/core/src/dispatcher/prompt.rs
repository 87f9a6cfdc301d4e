const INSTRUCTIONS: &str = "Provide a well-structured, informative, and \
detailed response to the following query. Ensure clarity, use real-world \
examples, and explain step by step when necessary. Whenever possible, ensure \
that the response is at least 250 words long to provide comprehensive \
insights. If the topic is restricted, offer general knowledge with enough \
depth to reach the desired length";

/// Wraps a raw user query in the fixed instruction template that asks for a
/// structured, detailed answer.
///
/// The query is embedded verbatim at the end of the prompt.
pub fn augment_query(query: &str) -> String {
    format!("{INSTRUCTIONS}: {query}")
}
