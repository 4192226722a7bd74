//! CodeExecutor trait: the code-execution boundary used by the math and
//! code agents.
//!
//! Source text goes in; an execution status comes out. A status of
//! [`STATUS_DONE`] means the program ran to completion. Any other status is
//! the error reported by the runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;

/// Status reported for a successful execution.
pub const STATUS_DONE: &str = "Done";

/// The result of running a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// "Done" or the runtime's error message
    pub status: String,

    /// The value bound to `answer` when the snippet finished, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl Execution {
    /// A successful run with an optional `answer` value.
    pub fn done(answer: Option<String>) -> Self {
        Self {
            status: STATUS_DONE.to_string(),
            answer,
        }
    }

    /// A failed run.
    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            answer: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == STATUS_DONE
    }
}

/// The core CodeExecutor trait.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// A short name used in logs (e.g. "python3").
    fn name(&self) -> &str;

    /// Run the snippet and report its status.
    ///
    /// Program errors are reported in `Execution::status`; `Err` is reserved
    /// for failures of the executor itself (missing interpreter, timeout).
    async fn execute(&self, code: &str) -> std::result::Result<Execution, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_and_failed() {
        assert!(Execution::done(Some("4".into())).is_done());
        let failed = Execution::failed("NameError: name 'x' is not defined");
        assert!(!failed.is_done());
        assert!(failed.answer.is_none());
    }
}
