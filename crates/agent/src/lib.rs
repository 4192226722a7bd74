//! The agent reasoning loops of trialmind.
//!
//! Four strategies answer a question with a language model and, depending
//! on the benchmark, a docstore or a code executor:
//!
//! 1. **ReAct**: Thought → Action → Observation until Finish or a budget runs out
//! 2. **Reflexion-CoT**: think once, answer, reflect on a wrong answer, retry
//! 3. **Reflexion-ReAct**: ReAct trials with reflections between them
//! 4. **CRITIC**: answer, then critique and revise with tool feedback
//!
//! Every model call is metered; an [`AgentOutput`] carries the per-step
//! records together with token, cost and time totals.

pub mod answer;
pub mod benchmark;
pub mod context;
pub mod environment;
pub mod halting;
pub mod llm;
pub mod loop_runner;
pub mod output;
pub mod parse;
pub mod patterns;
pub mod prompts;
pub mod reflect;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use benchmark::{Benchmark, TaskFamily};
pub use environment::{Environment, Observation, Toolbox};
pub use halting::{PromptBudget, TrialTracker, halting_condition, reflect_condition};
pub use llm::{Llm, Response};
pub use loop_runner::{ReactLoop, TrialOutcome};
pub use output::{AgentOutput, AgentSteps};
pub use parse::Action;
pub use patterns::{
    Agent, AgentContext, AgentKind, CriticAgent, ReactAgent, ReflexionCotAgent,
    ReflexionReactAgent, build_agent,
};
pub use reflect::{ReflectStrategy, Reflector};
