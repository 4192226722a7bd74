//! CRITIC: answer, then verify and revise with tool-interactive critiques.
//!
//! Round 0 produces an initial answer. Each following round asks the model
//! to critique the current answer:
//!
//! - **QA**: the critique may issue `> Search Query: <q>`; the docstore
//!   result is appended as `> Evidence:` for the next round. A critique that
//!   ends in `most possible answer: <a>` revises the answer, and repeating
//!   the current answer accepts it.
//! - **Math/Code**: the current code is executed first and its result shown
//!   to the model. A critique saying "it is correct" accepts the answer;
//!   otherwise the first python block in the critique becomes the new answer.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info};
use trialmind_config::AgentSettings;
use trialmind_core::error::Result;
use trialmind_tools::DocstoreExplorer;

use super::{Agent, AgentContext};
use crate::answer::{exact_match, run_code};
use crate::benchmark::TaskFamily;
use crate::environment::SEARCH_FAILED;
use crate::llm::Response;
use crate::output::{AgentOutput, AgentSteps, CriticStepOutput};
use crate::parse::{critique_accepts, first_python_block, parse_revised_answer, parse_search_query};
use crate::prompts;

const EVIDENCE_STOP: &str = "> Evidence:";

pub struct CriticAgent {
    ctx: AgentContext,
    max_interactions: usize,
    use_tool: bool,
}

/// What a critique round decided.
enum Verdict {
    /// The current answer stands; stop.
    Accept,
    /// Replace the answer and critique again.
    Revise(String),
    /// Evidence was gathered; critique again with it.
    Continue,
    /// Nothing actionable in the critique; stop.
    Stall,
}

impl CriticAgent {
    pub fn new(ctx: AgentContext, settings: &AgentSettings) -> Result<Self> {
        if settings.use_tool {
            match ctx.family() {
                TaskFamily::Qa => {
                    ctx.toolbox.require_docstore("CRITIC with use_tool")?;
                }
                TaskFamily::Math | TaskFamily::Code => {
                    ctx.toolbox.require_executor("CRITIC with use_tool")?;
                }
            }
        }
        Ok(Self {
            ctx,
            max_interactions: settings.max_interactions,
            use_tool: settings.use_tool,
        })
    }

    /// The answer carried by the initial completion.
    fn initial_answer(&self, output: &str) -> String {
        if self.ctx.family().uses_code() {
            first_python_block(output).unwrap_or_else(|| output.trim().to_string())
        } else {
            output.trim().lines().next().unwrap_or_default().trim().to_string()
        }
    }

    async fn critique_qa(
        &self,
        question: &str,
        answer: &str,
        context: &mut String,
        explorer: Option<&mut DocstoreExplorer>,
    ) -> Result<(Response, Verdict, Option<String>)> {
        let prompt =
            prompts::critic_prompt(TaskFamily::Qa, question, answer, &self.ctx.examples, context);
        let stop: &[&str] = if self.use_tool { &[EVIDENCE_STOP] } else { &[] };
        let response = self.ctx.llm.generate(&prompt, stop).await?;
        let critique = response.output_text.trim().to_string();

        if let Some(revised) = parse_revised_answer(&critique) {
            let verdict = if exact_match(&revised, answer) {
                Verdict::Accept
            } else {
                context.clear();
                Verdict::Revise(revised)
            };
            return Ok((response, verdict, None));
        }

        if let (Some(query), Some(explorer)) = (parse_search_query(&critique), explorer) {
            let evidence = match explorer.search(&query).await {
                Ok(text) => text.replace('\n', " "),
                Err(e) => {
                    debug!(error = %e, "CRITIC evidence search failed");
                    SEARCH_FAILED.to_string()
                }
            };
            let info = format!("{EVIDENCE_STOP} [{query}] {evidence}");
            context.push_str(&critique);
            context.push('\n');
            context.push_str(&info);
            context.push('\n');
            return Ok((response, Verdict::Continue, Some(info)));
        }

        Ok((response, Verdict::Stall, None))
    }

    async fn critique_code(
        &self,
        question: &str,
        answer: &str,
    ) -> Result<(Response, Verdict, Option<String>)> {
        let tool_info = match self.ctx.toolbox.executor() {
            Some(executor) if self.use_tool => {
                let execution = run_code(executor, answer).await?;
                Some(format!(
                    "Execution Status: {}\nOutput: answer = {}",
                    execution.status,
                    execution.answer.unwrap_or_default()
                ))
            }
            _ => None,
        };

        let prompt = prompts::critic_prompt(
            self.ctx.family(),
            question,
            answer,
            &self.ctx.examples,
            tool_info.as_deref().unwrap_or(""),
        );
        let response = self.ctx.llm.generate(&prompt, &[]).await?;

        let verdict = if critique_accepts(&response.output_text) {
            Verdict::Accept
        } else {
            match first_python_block(&response.output_text) {
                Some(code) if code.trim() != answer.trim() => Verdict::Revise(code),
                Some(_) => Verdict::Accept,
                None => Verdict::Stall,
            }
        };

        Ok((response, verdict, tool_info))
    }
}

#[async_trait]
impl Agent for CriticAgent {
    fn name(&self) -> &str {
        "critic"
    }

    async fn generate(&self, question: &str, _key: Option<&str>) -> Result<AgentOutput> {
        let start = Instant::now();
        let family = self.ctx.family();

        info!(
            benchmark = %self.ctx.benchmark,
            max_interactions = self.max_interactions,
            use_tool = self.use_tool,
            "CRITIC starting"
        );

        let init_prompt = prompts::critic_init_prompt(family, question, &self.ctx.examples);
        let init_response = self.ctx.llm.generate(&init_prompt, &[]).await?;
        let mut answer = self.initial_answer(&init_response.output_text);

        let mut steps = vec![CriticStepOutput {
            round: 0,
            answer: answer.clone(),
            critique: String::new(),
            external_tool_info: None,
            response: init_response,
        }];

        let mut explorer = match (&self.ctx.toolbox.docstore, family) {
            (Some(docstore), TaskFamily::Qa) if self.use_tool => {
                Some(DocstoreExplorer::new(docstore.clone()))
            }
            _ => None,
        };
        let mut context = String::new();

        for round in 1..=self.max_interactions {
            let (response, verdict, tool_info) = match family {
                TaskFamily::Qa => {
                    self.critique_qa(question, &answer, &mut context, explorer.as_mut())
                        .await?
                }
                TaskFamily::Math | TaskFamily::Code => self.critique_code(question, &answer).await?,
            };

            let stop = match verdict {
                Verdict::Accept => {
                    info!(round, "CRITIC accepted answer");
                    true
                }
                Verdict::Revise(revised) => {
                    info!(round, answer = %revised, "CRITIC revised answer");
                    answer = revised;
                    false
                }
                Verdict::Continue => false,
                Verdict::Stall => {
                    info!(round, "CRITIC critique gave no revision");
                    true
                }
            };

            steps.push(CriticStepOutput {
                round,
                answer: answer.clone(),
                critique: response.output_text.trim().to_string(),
                external_tool_info: tool_info,
                response,
            });

            if stop {
                break;
            }
        }

        Ok(AgentOutput::new(
            question,
            answer,
            None,
            AgentSteps::Critic(steps),
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
    use crate::test_helpers::{ScriptedExecutor, ScriptedProvider, qa_docstore};
    use std::sync::Arc;
    use trialmind_core::executor::Execution;

    fn qa_agent(provider: Arc<ScriptedProvider>, use_tool: bool) -> CriticAgent {
        let ctx = AgentContext::new(
            Llm::new(provider, "mock-model"),
            Benchmark::HotpotQa,
            Toolbox::new().with_docstore(qa_docstore()),
        );
        let settings = AgentSettings {
            use_tool,
            ..Default::default()
        };
        CriticAgent::new(ctx, &settings).unwrap()
    }

    #[tokio::test]
    async fn qa_search_then_revise_then_accept() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Great Plains",
            "The answer may be wrong.\n> Search Query: High Plains",
            "The evidence says High Plains.\nmost possible answer: High Plains",
            "Evidence agrees.\nmost possible answer: High Plains",
        ]));
        let out = qa_agent(provider.clone(), true)
            .generate("Where does the eastern sector extend?", None)
            .await
            .unwrap();

        assert_eq!(out.answer, "High Plains");
        assert_eq!(provider.call_count(), 4);

        let requests = provider.requests();
        assert_eq!(requests[1].stop, vec![EVIDENCE_STOP.to_string()]);
        assert!(requests[2].messages[0]
            .content
            .contains("> Evidence: [High Plains] The High Plains are a subregion of the Great Plains."));

        let AgentSteps::Critic(steps) = out.steps else {
            panic!("expected critic steps");
        };
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].answer, "Great Plains");
        assert!(steps[1].external_tool_info.is_some());
        assert_eq!(steps[2].answer, "High Plains");
    }

    #[tokio::test]
    async fn qa_without_tool_ignores_search_queries() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Great Plains",
            "> Search Query: High Plains",
        ]));
        let out = qa_agent(provider.clone(), false)
            .generate("Q?", None)
            .await
            .unwrap();

        assert_eq!(out.answer, "Great Plains");
        assert_eq!(provider.call_count(), 2);
        assert!(provider.requests()[1].stop.is_empty());
    }

    #[tokio::test]
    async fn qa_use_tool_without_docstore_is_config_error() {
        let ctx = AgentContext::new(
            Llm::new(Arc::new(ScriptedProvider::texts(&[])), "mock-model"),
            Benchmark::TriviaQa,
            Toolbox::new(),
        );
        let err = CriticAgent::new(ctx, &AgentSettings::default()).err().unwrap();
        assert!(matches!(err, trialmind_core::Error::Config { .. }));
    }

    #[tokio::test]
    async fn math_critique_runs_code_and_revises() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "```python\nanswer = 3 + 4\n```",
            "The question asks for a product.\n```python\nanswer = 3 * 4\n```",
            "It is correct.",
        ]));
        let exec = Arc::new(ScriptedExecutor::new(vec![
            Execution::done(Some("7".into())),
            Execution::done(Some("12".into())),
        ]));
        let ctx = AgentContext::new(
            Llm::new(provider.clone(), "mock-model"),
            Benchmark::Gsm8k,
            Toolbox::new().with_executor(exec.clone()),
        );
        let out = CriticAgent::new(ctx, &AgentSettings::default())
            .unwrap()
            .generate("3 times 4?", None)
            .await
            .unwrap();

        assert_eq!(out.answer, "answer = 3 * 4");
        assert_eq!(exec.calls(), vec!["answer = 3 + 4".to_string(), "answer = 3 * 4".to_string()]);
        assert!(provider.prompts()[1].contains("Execution Status: Done\nOutput: answer = 7"));

        let AgentSteps::Critic(steps) = out.steps else {
            panic!("expected critic steps");
        };
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].external_tool_info.as_deref(), Some("Execution Status: Done\nOutput: answer = 12"));
    }

    #[tokio::test]
    async fn rounds_are_bounded() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "a",
            "most possible answer: b",
            "most possible answer: c",
        ]));
        let ctx = AgentContext::new(
            Llm::new(provider.clone(), "mock-model"),
            Benchmark::AmbigNq,
            Toolbox::new(),
        );
        let settings = AgentSettings {
            max_interactions: 2,
            use_tool: false,
            ..Default::default()
        };
        let out = CriticAgent::new(ctx, &settings)
            .unwrap()
            .generate("Q?", None)
            .await
            .unwrap();

        assert_eq!(out.answer, "c");
        assert_eq!(provider.call_count(), 3);
    }
}
