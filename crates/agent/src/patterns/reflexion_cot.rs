//! Reflexion-CoT: chain-of-thought answers with self-reflection between trials.
//!
//! Each trial is one thought and one Finish action, graded against the
//! key. A wrong answer triggers a reflection before the next trial.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info};
use trialmind_config::AgentSettings;
use trialmind_core::error::Result;

use super::{Agent, AgentContext, reflect_strategy, require_key};
use crate::answer::check_answer;
use crate::context::scratchpad::{Scratchpad, Turn};
use crate::halting::{TrialTracker, reflect_condition};
use crate::output::{AgentOutput, AgentSteps, CotStepOutput, ReflexionTrial};
use crate::parse::{Action, clean_action, clean_thought, parse_bracket_action, parse_fenced_action};
use crate::prompts;
use crate::reflect::{ReflectStrategy, Reflector};

const ANSWER_CORRECT: &str = "Answer is CORRECT";
const ANSWER_INCORRECT: &str = "Answer is INCORRECT";
const INVALID_ACTION: &str = "Invalid action type, please try again.";

pub struct ReflexionCotAgent {
    ctx: AgentContext,
    settings: AgentSettings,
    strategy: Option<ReflectStrategy>,
}

impl ReflexionCotAgent {
    pub fn new(ctx: AgentContext, settings: &AgentSettings) -> Result<Self> {
        if ctx.family().uses_code() {
            ctx.toolbox.require_executor("grading code answers")?;
        }
        Ok(Self {
            strategy: reflect_strategy(settings)?,
            settings: settings.clone(),
            ctx,
        })
    }

    fn parse(&self, text: &str) -> Action {
        if self.ctx.family().uses_code() {
            parse_fenced_action(text, &["Finish"])
        } else {
            parse_bracket_action(text)
        }
    }

    fn prompt(&self, question: &str, reflections: &str, scratchpad: &Scratchpad) -> String {
        prompts::cot_prompt(
            self.ctx.family(),
            question,
            &self.ctx.examples,
            reflections,
            scratchpad.as_str(),
        )
    }

    /// One thought, one action, graded.
    async fn run_trial(
        &self,
        question: &str,
        key: &str,
        reflections: &str,
        scratchpad: &mut Scratchpad,
    ) -> Result<CotStepOutput> {
        let llm = &self.ctx.llm;

        scratchpad.begin(Turn::Thought, None);
        let thought_response = llm
            .generate(&self.prompt(question, reflections, scratchpad), &["Action"])
            .await?;
        let thought = clean_thought(&thought_response.output_text);
        scratchpad.push(&thought);

        scratchpad.begin(Turn::Action, None);
        let action_response = llm
            .generate(&self.prompt(question, reflections, scratchpad), &["Observation"])
            .await?;
        let action_text = clean_action(&action_response.output_text);
        let action = self.parse(&action_text);
        scratchpad.push(&action_text);

        let (answer, is_correct, observation) = if action.action_type == "Finish" {
            let correct = check_answer(
                self.ctx.family(),
                &action.query,
                key,
                self.ctx.toolbox.executor(),
            )
            .await?;
            let obs = if correct { ANSWER_CORRECT } else { ANSWER_INCORRECT };
            (action.query.clone(), correct, obs)
        } else {
            debug!(action = %action_text, "Reflexion-CoT action was not Finish");
            (String::new(), false, INVALID_ACTION)
        };
        scratchpad.record(Turn::Observation, None, observation);

        Ok(CotStepOutput {
            thought,
            action_type: action.action_type,
            query: action.query,
            observation: observation.to_string(),
            answer,
            is_correct,
            thought_response,
            action_response,
        })
    }
}

#[async_trait]
impl Agent for ReflexionCotAgent {
    fn name(&self) -> &str {
        "reflexion-cot"
    }

    async fn generate(&self, question: &str, key: Option<&str>) -> Result<AgentOutput> {
        let key = require_key(self.name(), key)?;
        let start = Instant::now();

        info!(
            benchmark = %self.ctx.benchmark,
            max_trials = self.settings.max_trials,
            strategy = ?self.strategy,
            "Reflexion-CoT starting"
        );

        let mut reflector = self.strategy.map(|s| {
            Reflector::new(s, self.settings.max_reflections, self.settings.last_attempt_tokens)
        });
        let mut tracker =
            TrialTracker::new(self.settings.max_trials, self.settings.effective_patience());
        let mut scratchpad = Scratchpad::new();
        let mut trials = Vec::new();
        let mut answer = String::new();

        while !tracker.is_done() {
            let trial = tracker.trial_idx();

            // Each trial is a single step, so a finished trial has always halted.
            let mut reflection = None;
            if let Some(reflector) = reflector.as_mut() {
                if reflect_condition(trial, Some(reflector.strategy()), true, tracker.last_correct()) {
                    reflection = Some(
                        reflector
                            .reflect(
                                &self.ctx.llm,
                                question,
                                &self.ctx.reflect_examples,
                                scratchpad.as_str(),
                            )
                            .await?,
                    );
                }
            }
            let reflections = reflector.as_ref().map(|r| r.reflections_str()).unwrap_or("");

            scratchpad.clear();
            let step = self.run_trial(question, key, reflections, &mut scratchpad).await?;

            info!(trial, correct = step.is_correct, answer = %step.answer, "Reflexion-CoT trial complete");

            tracker.record(&step.answer, step.is_correct);
            answer = step.answer.clone();
            trials.push(ReflexionTrial {
                trial,
                reflection,
                steps: vec![step],
            });
        }

        Ok(AgentOutput::new(
            question,
            answer,
            Some(tracker.last_correct()),
            AgentSteps::ReflexionCot(trials),
            start.elapsed().as_secs_f64(),
        ))
    }
}
