//! Agent patterns: the four reasoning strategies.
//!
//! 1. **ReAct**: Thought → Action → Observation loop, single trial
//! 2. **Reflexion-CoT**: one thought and answer per trial, reflecting on failures
//! 3. **Reflexion-ReAct**: ReAct trials, reflecting on failures
//! 4. **CRITIC**: answer once, then critique and revise with tool feedback
//!
//! Every agent is built from an [`AgentContext`] and the `[agent]` config
//! section, and answers one question per [`Agent::generate`] call. No
//! state survives between calls.

pub mod critic;
pub mod react;
pub mod reflexion_cot;
pub mod reflexion_react;

pub use critic::CriticAgent;
pub use react::ReactAgent;
pub use reflexion_cot::ReflexionCotAgent;
pub use reflexion_react::ReflexionReactAgent;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trialmind_config::AgentSettings;
use trialmind_core::error::Result;

use crate::benchmark::{Benchmark, TaskFamily};
use crate::environment::Toolbox;
use crate::llm::Llm;
use crate::output::AgentOutput;
use crate::reflect::ReflectStrategy;

/// Everything an agent needs besides its budgets.
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Llm,
    pub benchmark: Benchmark,
    pub toolbox: Toolbox,
    /// Few-shot examples for the main prompt.
    pub examples: String,
    /// Few-shot examples for the reflection prompt.
    pub reflect_examples: String,
}

impl AgentContext {
    pub fn new(llm: Llm, benchmark: Benchmark, toolbox: Toolbox) -> Self {
        Self {
            llm,
            benchmark,
            toolbox,
            examples: String::new(),
            reflect_examples: String::new(),
        }
    }

    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.examples = examples.into();
        self
    }

    pub fn with_reflect_examples(mut self, examples: impl Into<String>) -> Self {
        self.reflect_examples = examples.into();
        self
    }

    pub fn family(&self) -> TaskFamily {
        self.benchmark.family()
    }
}

/// An agent answers one question per call.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Answer `question`. Agents that check their answers need `key`.
    async fn generate(&self, question: &str, key: Option<&str>) -> Result<AgentOutput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    React,
    ReflexionCot,
    ReflexionReact,
    Critic,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        Self::React,
        Self::ReflexionCot,
        Self::ReflexionReact,
        Self::Critic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::ReflexionCot => "reflexion-cot",
            Self::ReflexionReact => "reflexion-react",
            Self::Critic => "critic",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown agent '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Build an agent of `kind`, checking its required tools up front.
pub fn build_agent(
    kind: AgentKind,
    ctx: AgentContext,
    settings: &AgentSettings,
) -> Result<Box<dyn Agent>> {
    Ok(match kind {
        AgentKind::React => Box::new(ReactAgent::new(ctx, settings)?),
        AgentKind::ReflexionCot => Box::new(ReflexionCotAgent::new(ctx, settings)?),
        AgentKind::ReflexionReact => Box::new(ReflexionReactAgent::new(ctx, settings)?),
        AgentKind::Critic => Box::new(CriticAgent::new(ctx, settings)?),
    })
}

/// The configured reflection strategy, `None` for "none".
pub(crate) fn reflect_strategy(settings: &AgentSettings) -> Result<Option<ReflectStrategy>> {
    ReflectStrategy::parse_optional(&settings.reflect_strategy).map_err(trialmind_core::Error::config)
}

/// Reflexion agents grade every trial, so they cannot run without a key.
pub(crate) fn require_key<'k>(agent: &str, key: Option<&'k str>) -> Result<&'k str> {
    key.ok_or_else(|| trialmind_core::Error::config(format!("{agent} needs an answer key")))
}
