//! Python executor: runs Calculate/Implement/Test snippets.
//!
//! The snippet runs in a fresh `python3 -c` process with a wall-clock
//! timeout. After the snippet, a short epilogue prints the value bound to
//! `answer` (if any) behind a marker line, which becomes
//! [`Execution::answer`]. A non-zero exit is reported as the last line of
//! stderr, which for Python is the exception summary.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use trialmind_core::error::ToolError;
use trialmind_core::executor::{CodeExecutor, Execution};

const ANSWER_MARKER: &str = "__TRIALMIND_ANSWER__=";

/// Execute python snippets in a subprocess.
pub struct PythonExecutor {
    python_bin: String,
    timeout: Duration,
}

impl PythonExecutor {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new("python3", Duration::from_secs(10))
    }
}

/// The program actually handed to the interpreter.
fn wrap_snippet(code: &str) -> String {
    format!(
        "{code}\n\ntry:\n    print(\"{ANSWER_MARKER}\" + str(answer))\nexcept NameError:\n    pass\n"
    )
}

/// Pull the `answer` value out of stdout.
fn extract_answer(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(ANSWER_MARKER))
        .map(|v| v.trim().to_string())
}

/// The status line for a failed run.
fn failure_status(stderr: &str, code: Option<i32>) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Process exited with code {}", code.unwrap_or(-1)))
}

#[async_trait]
impl CodeExecutor for PythonExecutor {
    fn name(&self) -> &str {
        &self.python_bin
    }

    async fn execute(&self, code: &str) -> Result<Execution, ToolError> {
        debug!(bytes = code.len(), "Executing python snippet");

        let child = Command::new(&self.python_bin)
            .args(["-c", &wrap_snippet(code)])
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: self.python_bin.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Python snippet timed out");
                return Err(ToolError::Timeout {
                    tool_name: self.python_bin.clone(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            Ok(Execution::done(extract_answer(&stdout)))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = failure_status(&stderr, output.status.code());
            debug!(%status, "Python snippet failed");
            Ok(Execution::failed(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn python_available() -> bool {
        Command::new("python3")
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn wrapped_snippet_prints_answer() {
        let program = wrap_snippet("answer = 2 + 2");
        assert!(program.starts_with("answer = 2 + 2\n"));
        assert!(program.contains(ANSWER_MARKER));
        assert!(program.contains("except NameError"));
    }

    #[test]
    fn answer_extracted_from_last_marker() {
        let stdout = format!("debug line\n{ANSWER_MARKER}41\n{ANSWER_MARKER}42\n");
        assert_eq!(extract_answer(&stdout).as_deref(), Some("42"));
        assert_eq!(extract_answer("no marker here"), None);
    }

    #[test]
    fn failure_status_is_last_stderr_line() {
        let stderr = "Traceback (most recent call last):\n  File \"<string>\", line 1\nZeroDivisionError: division by zero\n\n";
        assert_eq!(failure_status(stderr, Some(1)), "ZeroDivisionError: division by zero");
        assert_eq!(failure_status("", Some(3)), "Process exited with code 3");
    }

    #[tokio::test]
    async fn missing_interpreter_is_tool_error() {
        let exec = PythonExecutor::new("definitely-not-a-python-binary", Duration::from_secs(1));
        let err = exec.execute("answer = 1").await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn runs_snippet_when_python_present() {
        if !python_available().await {
            return;
        }
        let exec = PythonExecutor::default();

        let ok = exec.execute("x = 20\nanswer = x * 2 + 2").await.unwrap();
        assert!(ok.is_done());
        assert_eq!(ok.answer.as_deref(), Some("42"));

        let no_answer = exec.execute("def f():\n    return 1").await.unwrap();
        assert!(no_answer.is_done());
        assert!(no_answer.answer.is_none());

        let failed = exec.execute("assert 1 == 2").await.unwrap();
        assert!(!failed.is_done());
        assert!(failed.status.contains("AssertionError"));
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        if !python_available().await {
            return;
        }
        let exec = PythonExecutor::new("python3", Duration::from_millis(200));
        let err = exec.execute("while True:\n    pass").await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }
}
