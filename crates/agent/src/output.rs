//! Agent outputs: per-step records and run totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trialmind_telemetry::{CallMetrics, RunTotals};
use uuid::Uuid;

use crate::llm::Response;
use crate::reflect::ReflectionOutput;

/// One Thought/Action/Observation iteration of a ReAct trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactStepOutput {
    pub step: usize,
    pub thought: String,
    pub action_type: String,
    pub query: String,
    pub observation: String,
    /// The answer held by the environment after this step.
    pub answer: String,
    /// Extra output of the tool (e.g. execution status), when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_tool_info: Option<String>,
    /// Set on Finish steps of Reflexion trials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub thought_response: Response,
    pub action_response: Response,
}

/// One trial of Reflexion-CoT: a single thought and action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CotStepOutput {
    pub thought: String,
    pub action_type: String,
    pub query: String,
    pub observation: String,
    pub answer: String,
    pub is_correct: bool,
    pub thought_response: Response,
    pub action_response: Response,
}

/// A Reflexion trial: the reflection made before it (if any) and its steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflexionTrial<S> {
    pub trial: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<ReflectionOutput>,
    pub steps: Vec<S>,
}

/// One CRITIC round: the initial answer (round 0) or a critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticStepOutput {
    pub round: usize,
    pub answer: String,
    pub critique: String,
    /// Evidence or execution result gathered for this round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_tool_info: Option<String>,
    pub response: Response,
}

/// Family-specific step records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent", content = "steps", rename_all = "snake_case")]
pub enum AgentSteps {
    React(Vec<ReactStepOutput>),
    ReflexionCot(Vec<ReflexionTrial<CotStepOutput>>),
    ReflexionReact(Vec<ReflexionTrial<ReactStepOutput>>),
    Critic(Vec<CriticStepOutput>),
}

impl AgentSteps {
    /// Every LLM call made, in order.
    pub fn responses(&self) -> Vec<&Response> {
        let mut out = Vec::new();
        match self {
            Self::React(steps) => {
                for s in steps {
                    out.push(&s.thought_response);
                    out.push(&s.action_response);
                }
            }
            Self::ReflexionCot(trials) => {
                for t in trials {
                    out.extend(reflection_response(&t.reflection));
                    for s in &t.steps {
                        out.push(&s.thought_response);
                        out.push(&s.action_response);
                    }
                }
            }
            Self::ReflexionReact(trials) => {
                for t in trials {
                    out.extend(reflection_response(&t.reflection));
                    for s in &t.steps {
                        out.push(&s.thought_response);
                        out.push(&s.action_response);
                    }
                }
            }
            Self::Critic(steps) => out.extend(steps.iter().map(|s| &s.response)),
        }
        out
    }

    /// Summed metrics over every call, `total_time` left at zero.
    pub fn totals(&self) -> RunTotals {
        let calls: Vec<CallMetrics> = self.responses().iter().map(|r| r.metrics).collect();
        RunTotals::from_calls(&calls)
    }
}

fn reflection_response(reflection: &Option<ReflectionOutput>) -> Option<&Response> {
    reflection.as_ref().and_then(|r| r.response.as_ref())
}

/// The result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    /// Known only when the agent was given a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(flatten)]
    pub totals: RunTotals,
    pub steps: AgentSteps,
}

impl AgentOutput {
    /// Build the output, totalling every call in `steps`.
    ///
    /// `started_at` is back-dated by `total_time`.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        is_correct: Option<bool>,
        steps: AgentSteps,
        total_time: f64,
    ) -> Self {
        let elapsed = chrono::Duration::milliseconds((total_time * 1000.0) as i64);
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now() - elapsed,
            question: question.into(),
            answer: answer.into(),
            is_correct,
            totals: steps.totals().with_total_time(total_time),
            steps,
        }
    }
}
