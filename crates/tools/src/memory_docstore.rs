//! In-memory docstore: a fixed set of pages, searched by title.
//!
//! Useful for offline runs and tests. Pages can be loaded from a JSON
//! array of `{ "title": ..., "content": ... }` objects.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use trialmind_core::docstore::{Docstore, Document, SearchOutcome};
use trialmind_core::error::ToolError;

/// Maximum number of similar titles reported for a miss.
const MAX_SIMILAR: usize = 5;

pub struct InMemoryDocstore {
    /// Lowercased title → page
    pages: BTreeMap<String, Document>,
}

impl InMemoryDocstore {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        let pages = documents
            .into_iter()
            .map(|d| (d.title.to_lowercase(), d))
            .collect();
        Self { pages }
    }

    /// Load pages from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ToolError::DocstoreUnavailable(format!("{}: {e}", path.display()))
        })?;
        let documents: Vec<Document> = serde_json::from_str(&content).map_err(|e| {
            ToolError::DocstoreUnavailable(format!("{}: {e}", path.display()))
        })?;
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn similar_titles(&self, query: &str) -> Vec<String> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() >= 3)
            .collect();

        self.pages
            .iter()
            .filter(|(key, _)| words.iter().any(|w| key.contains(w.as_str())))
            .map(|(_, doc)| doc.title.clone())
            .take(MAX_SIMILAR)
            .collect()
    }
}

#[async_trait]
impl Docstore for InMemoryDocstore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome, ToolError> {
        let key = query.trim().to_lowercase();
        if let Some(doc) = self.pages.get(&key) {
            return Ok(SearchOutcome::Found(doc.clone()));
        }

        let titles = self.similar_titles(query);
        if titles.is_empty() {
            Ok(SearchOutcome::NotFound)
        } else {
            Ok(SearchOutcome::Similar { titles })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store() -> InMemoryDocstore {
        InMemoryDocstore::new(vec![
            Document::new("Rust (programming language)", "Rust is fast.\n\nIt has a borrow checker."),
            Document::new("Rust Belt", "The Rust Belt is a region."),
            Document::new("Python", "Python is dynamic."),
        ])
    }

    #[tokio::test]
    async fn exact_title_is_case_insensitive() {
        let outcome = store().search("python").await.unwrap();
        match outcome {
            SearchOutcome::Found(doc) => assert_eq!(doc.title, "Python"),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn partial_title_returns_similar() {
        let outcome = store().search("Rust").await.unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Similar {
                titles: vec!["Rust (programming language)".into(), "Rust Belt".into()]
            }
        );
    }

    #[tokio::test]
    async fn unknown_query_is_not_found() {
        let outcome = store().search("Haskell").await.unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title": "A", "content": "a"}}, {{"title": "B", "content": "b"}}]"#).unwrap();
        let store = InMemoryDocstore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn bad_json_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = InMemoryDocstore::from_json_file(file.path()).err().unwrap();
        assert!(matches!(err, ToolError::DocstoreUnavailable(_)));
    }
}
