//! Docstore explorer: the stateful Search/Lookup pair behind the QA agents.
//!
//! `Search[entity]` loads a page and answers with its first paragraph.
//! `Lookup[keyword]` then walks the paragraphs of that page that mention
//! the keyword, one result per call. A new keyword restarts the walk.

use std::sync::Arc;
use tracing::debug;
use trialmind_core::docstore::{Docstore, Document, SearchOutcome};
use trialmind_core::error::ToolError;

pub struct DocstoreExplorer {
    docstore: Arc<dyn Docstore>,
    document: Option<Document>,
    lookup_keyword: Option<String>,
    lookup_index: usize,
}

impl DocstoreExplorer {
    pub fn new(docstore: Arc<dyn Docstore>) -> Self {
        Self {
            docstore,
            document: None,
            lookup_keyword: None,
            lookup_index: 0,
        }
    }

    /// The page loaded by the last successful search.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Forget the current page and lookup position.
    pub fn reset(&mut self) {
        self.document = None;
        self.lookup_keyword = None;
        self.lookup_index = 0;
    }

    /// Search the docstore and render the result as an observation.
    pub async fn search(&mut self, query: &str) -> Result<String, ToolError> {
        let outcome = self.docstore.search(query).await?;
        debug!(docstore = self.docstore.name(), query, "Docstore search");

        match outcome {
            SearchOutcome::Found(doc) => {
                let summary = doc.summary().to_string();
                self.document = Some(doc);
                self.lookup_keyword = None;
                self.lookup_index = 0;
                Ok(summary)
            }
            SearchOutcome::Similar { titles } => {
                self.reset();
                let quoted: Vec<String> = titles.iter().map(|t| format!("'{t}'")).collect();
                Ok(format!(
                    "Could not find [{query}]. Similar: [{}]",
                    quoted.join(", ")
                ))
            }
            SearchOutcome::NotFound => {
                self.reset();
                Ok(format!("Could not find [{query}]."))
            }
        }
    }

    /// Next paragraph of the current page mentioning `keyword`.
    pub fn lookup(&mut self, keyword: &str) -> Result<String, ToolError> {
        let doc = self.document.as_ref().ok_or(ToolError::NoDocument)?;
        let needle = keyword.to_lowercase();

        if self.lookup_keyword.as_deref() != Some(needle.as_str()) {
            self.lookup_keyword = Some(needle.clone());
            self.lookup_index = 0;
        }

        let hits: Vec<&str> = doc
            .paragraphs()
            .into_iter()
            .filter(|p| p.to_lowercase().contains(&needle))
            .collect();

        if hits.is_empty() {
            return Ok("No Results".into());
        }
        if self.lookup_index >= hits.len() {
            return Ok("No More Results".into());
        }

        let result = format!(
            "(Result {}/{}) {}",
            self.lookup_index + 1,
            hits.len(),
            hits[self.lookup_index]
        );
        self.lookup_index += 1;
        Ok(result)
    }
}
