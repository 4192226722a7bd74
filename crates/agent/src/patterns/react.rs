//! ReAct pattern: Thought → Action → Observation loop.
//!
//! A single trial bounded by `max_steps` and the prompt-token budget. The
//! answer is whatever the model passed to Finish (empty if it never did);
//! it is not graded.

use async_trait::async_trait;
use std::time::Instant;
use tracing::info;
use trialmind_config::AgentSettings;
use trialmind_core::error::Result;

use super::{Agent, AgentContext};
use crate::environment::Environment;
use crate::loop_runner::ReactLoop;
use crate::output::{AgentOutput, AgentSteps};

pub struct ReactAgent {
    ctx: AgentContext,
    max_steps: usize,
    max_tokens: usize,
}

impl ReactAgent {
    pub fn new(ctx: AgentContext, settings: &AgentSettings) -> Result<Self> {
        // Fail on a missing tool now rather than on the first question.
        Environment::new(ctx.family(), &ctx.toolbox)?;
        Ok(Self {
            ctx,
            max_steps: settings.max_steps,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl Agent for ReactAgent {
    fn name(&self) -> &str {
        "react"
    }

    async fn generate(&self, question: &str, _key: Option<&str>) -> Result<AgentOutput> {
        let start = Instant::now();
        let family = self.ctx.family();

        info!(
            benchmark = %self.ctx.benchmark,
            model = %self.ctx.llm.model(),
            max_steps = self.max_steps,
            "ReAct starting"
        );

        let mut env = Environment::new(family, &self.ctx.toolbox)?;
        let runner = ReactLoop::new(
            &self.ctx.llm,
            family,
            &self.ctx.examples,
            self.max_steps,
            self.max_tokens,
        );
        let outcome = runner.run_trial(&mut env, question, "", 0).await?;

        info!(
            steps = outcome.steps.len(),
            finished = outcome.finished,
            "ReAct complete"
        );

        Ok(AgentOutput::new(
            question,
            outcome.answer,
            None,
            AgentSteps::React(outcome.steps),
            start.elapsed().as_secs_f64(),
        ))
    }
}
