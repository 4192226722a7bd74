//! The ReAct trial loop, shared by the ReAct and Reflexion-ReAct agents.
//!
//! Each step prompts the model twice (a thought, then an action), parses
//! the action, runs it in the environment, and appends the observation to
//! the scratchpad. The loop checks the halting condition before every step
//! against the prompt it is about to send.

use tracing::{debug, info};
use trialmind_core::error::Result;

use crate::benchmark::TaskFamily;
use crate::context::scratchpad::{Scratchpad, Turn};
use crate::context::token::estimate_tokens;
use crate::environment::Environment;
use crate::halting::{PromptBudget, halting_condition};
use crate::llm::Llm;
use crate::output::ReactStepOutput;
use crate::parse::{clean_action, clean_thought, parse_action};
use crate::prompts;

const THOUGHT_STOP: &[&str] = &["Action"];
const ACTION_STOP: &[&str] = &["Observation"];

/// How a trial ended. `run_trial` only returns once the halting
/// condition fires, so every outcome is a halted trial.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub answer: String,
    /// The task signalled Finish.
    pub finished: bool,
    pub steps: Vec<ReactStepOutput>,
    pub scratchpad: Scratchpad,
}

/// Budgets and prompt inputs for ReAct trials.
pub struct ReactLoop<'a> {
    llm: &'a Llm,
    family: TaskFamily,
    examples: &'a str,
    max_steps: usize,
    max_tokens: usize,
}

impl<'a> ReactLoop<'a> {
    pub fn new(
        llm: &'a Llm,
        family: TaskFamily,
        examples: &'a str,
        max_steps: usize,
        max_tokens: usize,
    ) -> Self {
        Self {
            llm,
            family,
            examples,
            max_steps,
            max_tokens,
        }
    }

    fn prompt(&self, question: &str, reflections: &str, scratchpad: &Scratchpad) -> String {
        prompts::react_prompt(
            self.family,
            question,
            self.examples,
            reflections,
            scratchpad.as_str(),
        )
    }

    /// Run one trial from an empty scratchpad.
    ///
    /// `reflections` is the rendered reflection context, empty for plain ReAct.
    pub async fn run_trial(
        &self,
        env: &mut Environment,
        question: &str,
        reflections: &str,
        trial: usize,
    ) -> Result<TrialOutcome> {
        let mut scratchpad = Scratchpad::new();
        let mut steps = Vec::new();
        let mut step = 1;

        loop {
            let prompt_tokens = estimate_tokens(&self.prompt(question, reflections, &scratchpad));
            let budget = PromptBudget {
                prompt_tokens,
                max_tokens: self.max_tokens,
            };
            if halting_condition(env.is_finished(), step, self.max_steps, Some(budget)) {
                break;
            }

            // Thought
            scratchpad.begin(Turn::Thought, Some(step));
            let thought_response = self
                .llm
                .generate(&self.prompt(question, reflections, &scratchpad), THOUGHT_STOP)
                .await?;
            let thought = clean_thought(&thought_response.output_text);
            scratchpad.push(&thought);

            // Action
            scratchpad.begin(Turn::Action, Some(step));
            let action_response = self
                .llm
                .generate(&self.prompt(question, reflections, &scratchpad), ACTION_STOP)
                .await?;
            let action_text = clean_action(&action_response.output_text);
            let action = parse_action(self.family, &action_text);
            scratchpad.push(&action_text);

            // Observation
            let observation = env.step(&action).await?;
            scratchpad.record(Turn::Observation, Some(step), &observation.text);

            info!(
                trial,
                step,
                action = %action.action_type,
                prompt_tokens,
                "ReAct step"
            );
            debug!(thought = %thought, query = %action.query, "ReAct step detail");

            steps.push(ReactStepOutput {
                step,
                thought,
                action_type: action.action_type,
                query: action.query,
                observation: observation.text,
                answer: env.answer().to_string(),
                external_tool_info: observation.external_tool_info,
                is_correct: None,
                thought_response,
                action_response,
            });

            step += 1;
        }

        if !env.is_finished() {
            info!(trial, steps = steps.len(), "ReAct trial halted without Finish");
        }

        Ok(TrialOutcome {
            answer: env.answer().to_string(),
            finished: env.is_finished(),
            steps,
            scratchpad,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Toolbox;
    use crate::test_helpers::{ScriptedProvider, qa_docstore};
    use std::sync::Arc;

    fn env() -> Environment {
        Environment::new(TaskFamily::Qa, &Toolbox::new().with_docstore(qa_docstore())).unwrap()
    }

    #[tokio::test]
    async fn search_then_finish() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "I need to search High Plains.",
            "Search[High Plains]",
            "The elevation is 1,800 to 7,000 ft.",
            "Finish[1,800 to 7,000 ft]",
        ]));
        let llm = Llm::new(provider.clone(), "mock-model");
        let runner = ReactLoop::new(&llm, TaskFamily::Qa, "", 6, 5000);

        let mut env = env();
        let outcome = runner.run_trial(&mut env, "What elevation?", "", 0).await.unwrap();

        assert!(outcome.finished);
        assert_eq!(outcome.answer, "1,800 to 7,000 ft");
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].action_type, "Search");
        assert!(outcome.steps[0].observation.starts_with("The High Plains are"));
        assert_eq!(provider.call_count(), 4);

        // Stop sequences: thought stops at Action, action at Observation.
        let requests = provider.requests();
        assert_eq!(requests[0].stop, vec!["Action".to_string()]);
        assert_eq!(requests[1].stop, vec!["Observation".to_string()]);

        // The action prompt carries the open action turn.
        assert!(provider.prompts()[1].ends_with("\nThought 1: I need to search High Plains.\nAction 1: "));

        let pad = outcome.scratchpad.as_str();
        assert!(pad.starts_with("\nThought 1: I need to search High Plains.\nAction 1: Search[High Plains]\nObservation 1: "));
        assert!(pad.ends_with("\nAction 2: Finish[1,800 to 7,000 ft]\nObservation 2: 1,800 to 7,000 ft"));
    }

    #[tokio::test]
    async fn stops_at_step_budget() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Think.", "Search[Nowhere]", "Think again.", "bad action",
        ]));
        let llm = Llm::new(provider.clone(), "mock-model");
        let runner = ReactLoop::new(&llm, TaskFamily::Qa, "", 2, 5000);

        let mut env = env();
        let outcome = runner.run_trial(&mut env, "Q?", "", 0).await.unwrap();

        assert!(!outcome.finished);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].observation, "Could not find [Nowhere].");
        assert!(outcome.steps[1].observation.starts_with("Invalid Action."));
        assert_eq!(outcome.answer, "");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn token_budget_halts_before_first_call() {
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let llm = Llm::new(provider.clone(), "mock-model");
        let runner = ReactLoop::new(&llm, TaskFamily::Qa, "", 6, 10);

        let mut env = env();
        let outcome = runner.run_trial(&mut env, "Q?", "", 0).await.unwrap();

        assert!(outcome.steps.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn reflections_reach_the_prompt() {
        let provider = Arc::new(ScriptedProvider::texts(&["Done.", "Finish[x]"]));
        let llm = Llm::new(provider.clone(), "mock-model");
        let runner = ReactLoop::new(&llm, TaskFamily::Qa, "", 6, 5000);

        let mut env = env();
        runner
            .run_trial(&mut env, "Q?", "Reflections:\n- search first", 1)
            .await
            .unwrap();
        assert!(provider.prompts()[0].contains("Reflections:\n- search first\nQuestion: Q?"));
    }
}
