//! Shared test helpers for agent tests.

use std::sync::{Arc, Mutex};
use trialmind_core::docstore::{Docstore, Document};
use trialmind_core::error::{ProviderError, ToolError};
use trialmind_core::executor::{CodeExecutor, Execution};
use trialmind_core::message::Message;
use trialmind_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use trialmind_tools::InMemoryDocstore;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Scripted text completions, each with usage 10/5/15.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The prompt text of every call so far.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.messages.last().map(|m| m.content.clone()).unwrap_or_default())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "ScriptedProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A mock executor returning scripted executions in order, recording the code.
pub struct ScriptedExecutor {
    results: Mutex<Vec<Result<Execution, ToolError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(executions: Vec<Execution>) -> Self {
        Self {
            results: Mutex::new(executions.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An executor whose every run times out.
    pub fn timing_out() -> Self {
        let timeout = || ToolError::Timeout {
            tool_name: "python3".into(),
            timeout_secs: 10,
        };
        Self {
            results: Mutex::new((0..8).map(|_| Err(timeout())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CodeExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted_executor"
    }

    async fn execute(&self, code: &str) -> Result<Execution, ToolError> {
        let mut calls = self.calls.lock().unwrap();
        let results = self.results.lock().unwrap();
        let count = calls.len();

        if count >= results.len() {
            panic!(
                "ScriptedExecutor: no more executions (call #{}, have {})",
                count,
                results.len()
            );
        }

        calls.push(code.to_string());
        results[count].clone()
    }
}

/// A small docstore with the pages used across the QA tests.
pub fn qa_docstore() -> Arc<dyn Docstore> {
    Arc::new(InMemoryDocstore::new(vec![
        Document::new(
            "Colorado orogeny",
            "The Colorado orogeny was an episode of mountain building in Colorado.\n\n\
             The eastern sector extends into the High Plains.",
        ),
        Document::new(
            "High Plains",
            "The High Plains are a subregion of the Great Plains.\n\n\
             The High Plains rise in elevation from around 1,800 to 7,000 ft.",
        ),
    ]))
}
