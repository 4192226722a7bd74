//! Wikipedia docstore: page search over the MediaWiki API.
//!
//! A query is first resolved as an exact page title (following redirects).
//! On a miss, `opensearch` supplies similar titles for the model to retry
//! with.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use trialmind_core::docstore::{Docstore, Document, SearchOutcome};
use trialmind_core::error::ToolError;

pub struct WikipediaDocstore {
    api_url: String,
    client: reqwest::Client,
}

impl WikipediaDocstore {
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("trialmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_url: api_url.into(),
            client,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, ToolError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| ToolError::DocstoreUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::DocstoreUnavailable(format!(
                "wikipedia returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::DocstoreUnavailable(format!("bad wikipedia response: {e}")))
    }

    async fn fetch_page(&self, title: &str) -> Result<Option<Document>, ToolError> {
        let body: QueryResponse = self
            .get_json(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        let page = body
            .query
            .and_then(|q| q.pages.into_values().find(|p| p.missing.is_none()));

        Ok(page.and_then(|p| {
            let content = normalize_extract(p.extract.as_deref().unwrap_or(""));
            (!content.is_empty()).then(|| Document::new(p.title, content))
        }))
    }

    async fn similar(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let body: serde_json::Value = self
            .get_json(&[
                ("action", "opensearch"),
                ("format", "json"),
                ("limit", "5"),
                ("search", query),
            ])
            .await?;
        Ok(opensearch_titles(&body))
    }
}

#[async_trait]
impl Docstore for WikipediaDocstore {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome, ToolError> {
        debug!(query, "Wikipedia search");

        if let Some(doc) = self.fetch_page(query).await? {
            return Ok(SearchOutcome::Found(doc));
        }

        let titles = self.similar(query).await?;
        if titles.is_empty() {
            Ok(SearchOutcome::NotFound)
        } else {
            Ok(SearchOutcome::Similar { titles })
        }
    }
}

/// Turn a plain-text extract into blank-line separated paragraphs,
/// dropping section headings.
fn normalize_extract(extract: &str) -> String {
    extract
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !(l.starts_with("==") && l.ends_with("==")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// opensearch answers with `[query, [titles], [descriptions], [urls]]`.
fn opensearch_titles(body: &serde_json::Value) -> Vec<String> {
    body.get(1)
        .and_then(|t| t.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_drops_headings_and_blank_lines() {
        let raw = "Rust is a language.\nIt is fast.\n\n\n== History ==\nStarted in 2006.\n";
        assert_eq!(
            normalize_extract(raw),
            "Rust is a language.\n\nIt is fast.\n\nStarted in 2006."
        );
    }

    #[test]
    fn parses_found_page() {
        let data = r#"{"query": {"pages": {"123": {"pageid": 123, "title": "Rust", "extract": "Rust is a language."}}}}"#;
        let parsed: QueryResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_values().next().unwrap();
        assert_eq!(page.title, "Rust");
        assert!(page.missing.is_none());
    }

    #[test]
    fn parses_missing_page() {
        let data = r#"{"query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}}"#;
        let parsed: QueryResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_values().next().unwrap();
        assert!(page.missing.is_some());
    }

    #[test]
    fn opensearch_titles_from_second_element() {
        let body = serde_json::json!(["rust", ["Rust", "Rust Belt"], ["", ""], ["u1", "u2"]]);
        assert_eq!(opensearch_titles(&body), vec!["Rust", "Rust Belt"]);
        assert!(opensearch_titles(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn docstore_name() {
        let store = WikipediaDocstore::new("https://en.wikipedia.org/w/api.php");
        assert_eq!(store.name(), "wikipedia");
    }
}
