//! Answer checking against a reference key.
//!
//! - QA answers compare by exact match after normalisation.
//! - Math answers are programs; they are run and their `answer` value is
//!   compared to the key numerically.
//! - Code answers are run together with the key (the test suite).

use trialmind_core::error::{Result, ToolError};
use trialmind_core::executor::{CodeExecutor, Execution};

use crate::benchmark::TaskFamily;

const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Lowercase, drop punctuation and the articles a/an/the, collapse whitespace.
pub fn normalize_answer(text: &str) -> String {
    let lower = text.to_lowercase();
    let no_punct: String = lower.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    no_punct
        .split_whitespace()
        .filter(|w| !matches!(*w, "a" | "an" | "the"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact match after [`normalize_answer`].
pub fn exact_match(answer: &str, key: &str) -> bool {
    normalize_answer(answer) == normalize_answer(key)
}

/// Numeric comparison when both sides parse as numbers, otherwise exact match.
pub fn numeric_match(answer: &str, key: &str) -> bool {
    let parse = |s: &str| s.trim().replace(',', "").parse::<f64>().ok();
    match (parse(answer), parse(key)) {
        (Some(a), Some(b)) => (a - b).abs() < NUMERIC_TOLERANCE,
        _ => exact_match(answer, key),
    }
}

/// Run code, reporting an executor timeout as a failed `TimeoutError`
/// execution that the loop shows to the model like any other error.
pub async fn run_code(executor: &dyn CodeExecutor, code: &str) -> Result<Execution> {
    match executor.execute(code).await {
        Ok(execution) => Ok(execution),
        Err(ToolError::Timeout { timeout_secs, .. }) => Ok(Execution::failed(format!(
            "TimeoutError: execution exceeded {timeout_secs}s"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Whether `answer` is correct for `key` in the given task family.
pub async fn check_answer(
    family: TaskFamily,
    answer: &str,
    key: &str,
    executor: Option<&dyn CodeExecutor>,
) -> Result<bool> {
    match family {
        TaskFamily::Qa => Ok(exact_match(answer, key)),
        TaskFamily::Math => {
            let Some(executor) = executor else {
                return Ok(numeric_match(answer, key));
            };
            if answer.trim().is_empty() {
                return Ok(false);
            }
            let execution = run_code(executor, answer).await?;
            Ok(match execution.answer {
                Some(value) if execution.is_done() => numeric_match(&value, key),
                _ => false,
            })
        }
        TaskFamily::Code => {
            let Some(executor) = executor else {
                return Err(trialmind_core::Error::config(
                    "checking code answers needs a code executor",
                ));
            };
            if answer.trim().is_empty() {
                return Ok(false);
            }
            let execution = run_code(executor, &format!("{answer}\n\n{key}")).await?;
            Ok(execution.is_done())
        }
    }
}
