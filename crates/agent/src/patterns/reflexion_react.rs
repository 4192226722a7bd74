//! Reflexion-ReAct: ReAct trials with self-reflection between them.
//!
//! Each trial is a full ReAct loop. After a trial ends with a wrong answer
//! the reflector summarises what went wrong, and the next trial runs from a
//! fresh scratchpad with the reflections in its prompt.

use async_trait::async_trait;
use std::time::Instant;
use tracing::info;
use trialmind_config::AgentSettings;
use trialmind_core::error::Result;

use super::{Agent, AgentContext, reflect_strategy, require_key};
use crate::answer::check_answer;
use crate::environment::Environment;
use crate::halting::{TrialTracker, reflect_condition};
use crate::loop_runner::{ReactLoop, TrialOutcome};
use crate::output::{AgentOutput, AgentSteps, ReflexionTrial};
use crate::reflect::{ReflectStrategy, Reflector};

pub struct ReflexionReactAgent {
    ctx: AgentContext,
    settings: AgentSettings,
    strategy: Option<ReflectStrategy>,
}

impl ReflexionReactAgent {
    pub fn new(ctx: AgentContext, settings: &AgentSettings) -> Result<Self> {
        Environment::new(ctx.family(), &ctx.toolbox)?;
        Ok(Self {
            strategy: reflect_strategy(settings)?,
            settings: settings.clone(),
            ctx,
        })
    }
}

#[async_trait]
impl Agent for ReflexionReactAgent {
    fn name(&self) -> &str {
        "reflexion-react"
    }

    async fn generate(&self, question: &str, key: Option<&str>) -> Result<AgentOutput> {
        let key = require_key(self.name(), key)?;
        let start = Instant::now();
        let family = self.ctx.family();

        info!(
            benchmark = %self.ctx.benchmark,
            max_trials = self.settings.max_trials,
            strategy = ?self.strategy,
            "Reflexion-ReAct starting"
        );

        let mut env = Environment::new(family, &self.ctx.toolbox)?;
        let runner = ReactLoop::new(
            &self.ctx.llm,
            family,
            &self.ctx.examples,
            self.settings.max_steps,
            self.settings.max_tokens,
        );
        let mut reflector = self.strategy.map(|s| {
            Reflector::new(s, self.settings.max_reflections, self.settings.last_attempt_tokens)
        });
        let mut tracker =
            TrialTracker::new(self.settings.max_trials, self.settings.effective_patience());

        let mut trials = Vec::new();
        let mut previous: Option<TrialOutcome> = None;

        while !tracker.is_done() {
            let trial = tracker.trial_idx();

            // A returned trial has always halted.
            let mut reflection = None;
            if let (Some(prev), Some(reflector)) = (&previous, reflector.as_mut()) {
                if reflect_condition(trial, Some(reflector.strategy()), true, tracker.last_correct()) {
                    reflection = Some(
                        reflector
                            .reflect(
                                &self.ctx.llm,
                                question,
                                &self.ctx.reflect_examples,
                                prev.scratchpad.as_str(),
                            )
                            .await?,
                    );
                }
            }
            let reflections = reflector.as_ref().map(|r| r.reflections_str()).unwrap_or("");

            env.reset();
            let mut outcome = runner.run_trial(&mut env, question, reflections, trial).await?;

            let correct =
                check_answer(family, &outcome.answer, key, self.ctx.toolbox.executor()).await?;
            if outcome.finished {
                if let Some(last) = outcome.steps.last_mut() {
                    last.is_correct = Some(correct);
                }
            }
            tracker.record(&outcome.answer, correct);

            info!(trial, correct, answer = %outcome.answer, "Reflexion-ReAct trial complete");

            trials.push(ReflexionTrial {
                trial,
                reflection,
                steps: std::mem::take(&mut outcome.steps),
            });
            previous = Some(outcome);
        }

        if tracker.out_of_patience() {
            info!("Reflexion-ReAct stopped: same wrong answer repeated");
        }

        let answer = previous.map(|p| p.answer).unwrap_or_default();
        Ok(AgentOutput::new(
            question,
            answer,
            Some(tracker.last_correct()),
            AgentSteps::ReflexionReact(trials),
            start.elapsed().as_secs_f64(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Benchmark;
    use crate::environment::Toolbox;
    use crate::llm::Llm;
    use crate::test_helpers::{ScriptedProvider, qa_docstore};
    use std::sync::Arc;

    fn agent(provider: Arc<ScriptedProvider>, settings: AgentSettings) -> ReflexionReactAgent {
        let ctx = AgentContext::new(
            Llm::new(provider, "mock-model"),
            Benchmark::HotpotQa,
            Toolbox::new().with_docstore(qa_docstore()),
        );
        ReflexionReactAgent::new(ctx, &settings).unwrap()
    }

    #[tokio::test]
    async fn correct_first_trial_never_reflects() {
        let provider = Arc::new(ScriptedProvider::texts(&["Easy.", "Finish[High Plains]"]));
        let agent = agent(provider.clone(), AgentSettings::default());

        let out = agent.generate("Q?", Some("the High Plains")).await.unwrap();
        assert_eq!(out.is_correct, Some(true));
        assert_eq!(provider.call_count(), 2);

        let AgentSteps::ReflexionReact(trials) = out.steps else {
            panic!("expected reflexion-react steps");
        };
        assert_eq!(trials.len(), 1);
        assert!(trials[0].reflection.is_none());
        assert_eq!(trials[0].steps[0].is_correct, Some(true));
    }

    #[tokio::test]
    async fn failed_trial_reflects_then_retries() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            // trial 0
            "Guess.",
            "Finish[Great Plains]",
            // reflection
            "I guessed without searching. Search first.",
            // trial 1
            "Search this time.",
            "Finish[High Plains]",
        ]));
        let agent = agent(provider.clone(), AgentSettings::default());

        let out = agent.generate("Q?", Some("High Plains")).await.unwrap();
        assert_eq!(out.is_correct, Some(true));
        assert_eq!(out.answer, "High Plains");

        let prompts = provider.prompts();
        assert!(prompts[2].contains("Previous trial:\nQuestion: Q?"));
        assert!(prompts[3].contains("Reflections:\n- I guessed without searching. Search first."));

        let AgentSteps::ReflexionReact(trials) = &out.steps else {
            panic!("expected reflexion-react steps");
        };
        assert_eq!(trials.len(), 2);
        assert!(trials[1].reflection.is_some());
        // 5 calls, reflection included
        assert_eq!(out.totals.total_prompt_tokens, 50);
    }

    #[tokio::test]
    async fn no_strategy_retries_without_reflection() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Guess.", "Finish[a]", "Guess.", "Finish[b]",
        ]));
        let settings = AgentSettings {
            max_trials: 2,
            reflect_strategy: "none".into(),
            ..Default::default()
        };
        let out = agent(provider.clone(), settings)
            .generate("Q?", Some("c"))
            .await
            .unwrap();

        assert_eq!(out.is_correct, Some(false));
        assert_eq!(out.answer, "b");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn patience_stops_repeated_wrong_answer() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Guess.", "Finish[a]", "Guess.", "Finish[a]",
        ]));
        let settings = AgentSettings {
            max_trials: 5,
            patience: Some(2),
            reflect_strategy: "last_attempt".into(),
            ..Default::default()
        };
        let out = agent(provider.clone(), settings)
            .generate("Q?", Some("b"))
            .await
            .unwrap();

        assert_eq!(out.is_correct, Some(false));
        // last_attempt needs no LLM call; two trials of two calls each
        assert_eq!(provider.call_count(), 4);
        assert!(provider.prompts()[2].contains("Below is the last trial you attempted"));
    }

    #[tokio::test]
    async fn key_is_required() {
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let err = agent(provider, AgentSettings::default())
            .generate("Q?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, trialmind_core::Error::Config { .. }));
    }
}
