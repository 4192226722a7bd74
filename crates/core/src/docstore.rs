//! Docstore trait: the search boundary used by the QA agents.
//!
//! A docstore resolves a free-text query to a page. The agent-side
//! explorer (in `trialmind-tools`) keeps the last page around so that
//! `Lookup[keyword]` can walk its paragraphs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;

/// A page returned by a docstore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Page title
    pub title: String,

    /// Full page text; paragraphs are separated by blank lines
    pub content: String,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Non-empty paragraphs of the page, in order.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// The first paragraph, used as the search observation.
    pub fn summary(&self) -> &str {
        self.paragraphs().first().copied().unwrap_or("")
    }
}

/// What a docstore search produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// An exact page match.
    Found(Document),
    /// No exact page, but these titles are close.
    Similar { titles: Vec<String> },
    /// Nothing matched.
    NotFound,
}

/// The core Docstore trait.
#[async_trait]
pub trait Docstore: Send + Sync {
    /// A short name used in logs (e.g. "wikipedia").
    fn name(&self) -> &str;

    /// Resolve a query to a page.
    async fn search(&self, query: &str) -> std::result::Result<SearchOutcome, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_skip_blank_blocks() {
        let doc = Document::new("Rust", "First para.\n\n\n\nSecond para.\n\n  ");
        assert_eq!(doc.paragraphs(), vec!["First para.", "Second para."]);
        assert_eq!(doc.summary(), "First para.");
    }

    #[test]
    fn empty_document_has_empty_summary() {
        let doc = Document::new("Empty", "");
        assert!(doc.paragraphs().is_empty());
        assert_eq!(doc.summary(), "");
    }

    #[test]
    fn search_outcome_serialization() {
        let outcome = SearchOutcome::Similar {
            titles: vec!["Rust (language)".into()],
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("similar"));
        assert!(json.contains("Rust (language)"));
    }
}
