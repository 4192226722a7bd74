//! Reflector: turns a failed trial into context for the next one.
//!
//! Three strategies:
//!
//! - **last_attempt**: show the previous trial's scratchpad (truncated).
//! - **reflexion**: ask the model for a self-critique and keep a rolling
//!   list of the most recent ones.
//! - **last_attempt_and_reflexion**: both, last attempt first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use trialmind_core::error::Result;

use crate::context::scratchpad::truncate_scratchpad;
use crate::llm::{Llm, Response};
use crate::prompts;

pub const REFLECTION_HEADER: &str = "You have attempted to answer following question before and failed. The following reflection(s) give a plan to avoid failing to answer the question in the same way you did previously. Use them to improve your strategy of correctly answering the given question.\n";

pub const LAST_TRIAL_HEADER: &str = "You have attempted to answer the following question before and failed. Below is the last trial you attempted to answer the question.\n";

pub const REFLECTION_AFTER_LAST_TRIAL_HEADER: &str = "The following reflection(s) give a plan to avoid failing to answer the question in the same way you did previously. Use them to improve your strategy of correctly answering the given question.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectStrategy {
    LastAttempt,
    Reflexion,
    LastAttemptAndReflexion,
}

impl ReflectStrategy {
    /// Parse a configured strategy name; `"none"` means no reflection.
    pub fn parse_optional(name: &str) -> std::result::Result<Option<Self>, String> {
        match name.trim() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastAttempt => "last_attempt",
            Self::Reflexion => "reflexion",
            Self::LastAttemptAndReflexion => "last_attempt_and_reflexion",
        }
    }
}

impl fmt::Display for ReflectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReflectStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "last_attempt" => Ok(Self::LastAttempt),
            "reflexion" => Ok(Self::Reflexion),
            "last_attempt_and_reflexion" => Ok(Self::LastAttemptAndReflexion),
            other => Err(format!("unknown reflection strategy '{other}'")),
        }
    }
}

/// Render reflections as a bulleted list under `header`. Empty in, empty out.
pub fn format_reflections(reflections: &[String], header: &str) -> String {
    if reflections.is_empty() {
        return String::new();
    }
    let bullets: Vec<&str> = reflections.iter().map(|r| r.trim()).collect();
    format!("{header}Reflections:\n- {}", bullets.join("\n- "))
}

/// Render the previous trial under `header`, truncated to `max_tokens`.
pub fn format_last_attempt(
    question: &str,
    scratchpad: &str,
    header: &str,
    max_tokens: usize,
) -> String {
    format!(
        "{header}Question: {question}\n{}\n(END PREVIOUS TRIAL)\n",
        truncate_scratchpad(scratchpad, max_tokens).trim()
    )
}

/// What one reflection produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionOutput {
    pub reflections: Vec<String>,
    pub reflections_str: String,
    /// The self-critique call, for strategies that make one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
}

/// Holds the reflections of one episode. Create one per question.
pub struct Reflector {
    strategy: ReflectStrategy,
    max_reflections: usize,
    last_attempt_tokens: usize,
    reflections: Vec<String>,
    reflections_str: String,
}

impl Reflector {
    pub fn new(strategy: ReflectStrategy, max_reflections: usize, last_attempt_tokens: usize) -> Self {
        Self {
            strategy,
            max_reflections,
            last_attempt_tokens,
            reflections: Vec::new(),
            reflections_str: String::new(),
        }
    }

    pub fn strategy(&self) -> ReflectStrategy {
        self.strategy
    }

    pub fn reflections(&self) -> &[String] {
        &self.reflections
    }

    /// The rendered context for the next trial's prompt.
    pub fn reflections_str(&self) -> &str {
        &self.reflections_str
    }

    /// Reflect on a failed trial.
    pub async fn reflect(
        &mut self,
        llm: &Llm,
        question: &str,
        examples: &str,
        scratchpad: &str,
    ) -> Result<ReflectionOutput> {
        let mut response = None;

        match self.strategy {
            ReflectStrategy::LastAttempt => {
                self.reflections = vec![scratchpad.to_string()];
                self.reflections_str = format_last_attempt(
                    question,
                    scratchpad,
                    LAST_TRIAL_HEADER,
                    self.last_attempt_tokens,
                );
            }
            ReflectStrategy::Reflexion => {
                response = Some(self.self_critique(llm, question, examples, scratchpad).await?);
                self.reflections_str = format_reflections(&self.reflections, REFLECTION_HEADER);
            }
            ReflectStrategy::LastAttemptAndReflexion => {
                response = Some(self.self_critique(llm, question, examples, scratchpad).await?);
                self.reflections_str = format!(
                    "{}\n{}",
                    format_last_attempt(
                        question,
                        scratchpad,
                        LAST_TRIAL_HEADER,
                        self.last_attempt_tokens
                    ),
                    format_reflections(&self.reflections, REFLECTION_AFTER_LAST_TRIAL_HEADER)
                );
            }
        }

        debug!(
            strategy = %self.strategy,
            reflections = self.reflections.len(),
            "Reflected on failed trial"
        );

        Ok(ReflectionOutput {
            reflections: self.reflections.clone(),
            reflections_str: self.reflections_str.clone(),
            response,
        })
    }

    /// Ask the model for a self-critique and push it onto the capped list.
    async fn self_critique(
        &mut self,
        llm: &Llm,
        question: &str,
        examples: &str,
        scratchpad: &str,
    ) -> Result<Response> {
        let prompt = prompts::reflect_prompt(question, examples, scratchpad);
        let response = llm.generate(&prompt, &[]).await?;

        self.reflections.push(response.output_text.trim().to_string());
        if self.reflections.len() > self.max_reflections {
            let excess = self.reflections.len() - self.max_reflections;
            self.reflections.drain(..excess);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use std::sync::Arc;

    fn llm(texts: &[&str]) -> Llm {
        Llm::new(Arc::new(ScriptedProvider::texts(texts)), "mock-model")
    }

    #[test]
    fn strategy_names() {
        assert_eq!(ReflectStrategy::parse_optional("none").unwrap(), None);
        assert_eq!(
            ReflectStrategy::parse_optional("last_attempt_and_reflexion").unwrap(),
            Some(ReflectStrategy::LastAttemptAndReflexion)
        );
        assert!(ReflectStrategy::parse_optional("bogus").is_err());
        assert_eq!(ReflectStrategy::Reflexion.to_string(), "reflexion");
    }

    #[test]
    fn reflections_format() {
        assert_eq!(format_reflections(&[], REFLECTION_HEADER), "");
        let out = format_reflections(&[" first ".into(), "second".into()], "H\n");
        assert_eq!(out, "H\nReflections:\n- first\n- second");
    }

    #[test]
    fn last_attempt_format() {
        let out = format_last_attempt("Q?", "\nThought 1: x\n", "H\n", 1600);
        assert_eq!(out, "H\nQuestion: Q?\nThought 1: x\n(END PREVIOUS TRIAL)\n");
    }

    #[tokio::test]
    async fn last_attempt_makes_no_llm_call() {
        let llm = llm(&[]);
        let mut r = Reflector::new(ReflectStrategy::LastAttempt, 3, 1600);
        let out = r.reflect(&llm, "Q?", "", "\nThought 1: x").await.unwrap();
        assert!(out.response.is_none());
        assert_eq!(out.reflections, vec!["\nThought 1: x".to_string()]);
        assert!(out.reflections_str.starts_with(LAST_TRIAL_HEADER));
    }

    #[tokio::test]
    async fn reflexion_caps_list_oldest_first() {
        let llm = llm(&["one", "two", "three"]);
        let mut r = Reflector::new(ReflectStrategy::Reflexion, 2, 1600);
        for _ in 0..3 {
            r.reflect(&llm, "Q?", "", "\nThought: x").await.unwrap();
        }
        assert_eq!(r.reflections(), &["two".to_string(), "three".to_string()]);
        assert_eq!(
            r.reflections_str(),
            format!("{REFLECTION_HEADER}Reflections:\n- two\n- three")
        );
    }

    #[tokio::test]
    async fn combined_strategy_renders_both() {
        let llm = llm(&["Search the other page."]);
        let mut r = Reflector::new(ReflectStrategy::LastAttemptAndReflexion, 3, 1600);
        let out = r.reflect(&llm, "Q?", "", "\nThought 1: x").await.unwrap();

        assert!(out.response.is_some());
        assert!(out.reflections_str.starts_with(LAST_TRIAL_HEADER));
        assert!(out.reflections_str.contains("(END PREVIOUS TRIAL)\n\n"));
        assert!(out.reflections_str.ends_with(&format!(
            "{REFLECTION_AFTER_LAST_TRIAL_HEADER}Reflections:\n- Search the other page."
        )));
    }
}
