//! Environment: executes parsed actions against the task family's tools.
//!
//! One environment lives for one trial. It owns the docstore explorer
//! (QA) or the latest implementation (Code), and holds the current answer
//! and whether the task has finished.

use std::sync::Arc;
use tracing::debug;
use trialmind_core::docstore::Docstore;
use trialmind_core::error::{Result, ToolError};
use trialmind_core::executor::CodeExecutor;
use trialmind_tools::DocstoreExplorer;

use crate::answer::run_code;
use crate::benchmark::TaskFamily;
use crate::parse::Action;

pub const SEARCH_FAILED: &str = "Could not find that page, please try again.";

pub const LOOKUP_WITHOUT_PAGE: &str = "The last page Searched was not found, so you cannot Lookup a keyword in it. Please try one of the similar pages given.";

/// The external collaborators available to an agent.
#[derive(Clone, Default)]
pub struct Toolbox {
    pub docstore: Option<Arc<dyn Docstore>>,
    pub executor: Option<Arc<dyn CodeExecutor>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docstore(mut self, docstore: Arc<dyn Docstore>) -> Self {
        self.docstore = Some(docstore);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn executor(&self) -> Option<&dyn CodeExecutor> {
        self.executor.as_deref()
    }

    /// The docstore, or a configuration error naming who needed it.
    pub fn require_docstore(&self, purpose: &str) -> Result<Arc<dyn Docstore>> {
        self.docstore
            .clone()
            .ok_or_else(|| trialmind_core::Error::config(format!("{purpose} needs a docstore")))
    }

    /// The code executor, or a configuration error naming who needed it.
    pub fn require_executor(&self, purpose: &str) -> Result<Arc<dyn CodeExecutor>> {
        self.executor
            .clone()
            .ok_or_else(|| trialmind_core::Error::config(format!("{purpose} needs a code executor")))
    }
}

/// What one action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub text: String,
    /// Execution status or other tool output worth recording.
    pub external_tool_info: Option<String>,
}

impl Observation {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            external_tool_info: None,
        }
    }
}

enum Tools {
    Qa(DocstoreExplorer),
    Math(Arc<dyn CodeExecutor>),
    Code {
        executor: Arc<dyn CodeExecutor>,
        implementation: String,
    },
}

pub struct Environment {
    tools: Tools,
    answer: String,
    finished: bool,
}

impl Environment {
    /// Build the environment for `family`, failing if its tool is missing.
    pub fn new(family: TaskFamily, toolbox: &Toolbox) -> Result<Self> {
        let tools = match family {
            TaskFamily::Qa => Tools::Qa(DocstoreExplorer::new(
                toolbox.require_docstore("question answering")?,
            )),
            TaskFamily::Math => Tools::Math(toolbox.require_executor("math reasoning")?),
            TaskFamily::Code => Tools::Code {
                executor: toolbox.require_executor("code generation")?,
                implementation: String::new(),
            },
        };
        Ok(Self {
            tools,
            answer: String::new(),
            finished: false,
        })
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Forget everything from the previous trial.
    pub fn reset(&mut self) {
        self.answer.clear();
        self.finished = false;
        match &mut self.tools {
            Tools::Qa(explorer) => explorer.reset(),
            Tools::Math(_) => {}
            Tools::Code { implementation, .. } => implementation.clear(),
        }
    }

    /// Execute one action and describe the result to the model.
    pub async fn step(&mut self, action: &Action) -> Result<Observation> {
        debug!(action = %action.action_type, "Executing action");
        let query = action.query.as_str();

        match &mut self.tools {
            Tools::Qa(explorer) => match action.action_type.as_str() {
                "Search" => match explorer.search(query).await {
                    Ok(text) => Ok(Observation::text(text.replace('\n', ""))),
                    Err(e) => {
                        debug!(error = %e, "Search failed");
                        Ok(Observation::text(SEARCH_FAILED))
                    }
                },
                "Lookup" => match explorer.lookup(query) {
                    Ok(text) => Ok(Observation::text(text.replace('\n', ""))),
                    Err(ToolError::NoDocument) => Ok(Observation::text(LOOKUP_WITHOUT_PAGE)),
                    Err(e) => Err(e.into()),
                },
                "Finish" => {
                    self.answer = query.to_string();
                    self.finished = true;
                    Ok(Observation::text(query))
                }
                _ => Ok(Observation::text(
                    "Invalid Action. Valid Actions are Lookup[<topic>] Search[<topic>] and Finish[<answer>].",
                )),
            },

            Tools::Math(executor) => match action.action_type.as_str() {
                "Calculate" => {
                    let execution = run_code(executor.as_ref(), query).await?;
                    let value = execution.answer.clone().unwrap_or_default();
                    self.answer = query.to_string();
                    Ok(Observation {
                        text: format!(
                            "\n```python\n{query}\n```\nExecution Status: {}\nOutput: answer = {value}",
                            execution.status
                        ),
                        external_tool_info: Some(execution.status),
                    })
                }
                "Finish" => {
                    self.answer = query.to_string();
                    self.finished = true;
                    Ok(Observation::text(format!("\n```python\n{query}\n```")))
                }
                _ => Ok(Observation::text(
                    "Invalid Action. Valid Actions are Calculate[<Code>] and Finish[<Code>].",
                )),
            },

            Tools::Code {
                executor,
                implementation,
            } => match action.action_type.as_str() {
                "Implement" => {
                    *implementation = query.to_string();
                    self.answer = query.to_string();
                    let execution = run_code(executor.as_ref(), query).await?;
                    Ok(Observation {
                        text: format!(
                            "\n```python\n{query}\n```\nExecution Status: {}",
                            execution.status
                        ),
                        external_tool_info: Some(execution.status),
                    })
                }
                "Test" => {
                    let program = format!("{implementation}\n\n{query}");
                    let execution = run_code(executor.as_ref(), &program).await?;
                    Ok(Observation {
                        text: format!(
                            "\n```python\n{query}\n```\nExecution Status: {}",
                            execution.status
                        ),
                        external_tool_info: Some(execution.status),
                    })
                }
                "Finish" => {
                    self.answer = query.to_string();
                    self.finished = true;
                    Ok(Observation::text(format!("\n```python\n{query}\n```")))
                }
                _ => Ok(Observation::text(
                    "Invalid Action. Valid Actions are Implement[<Code>], Test[<Code>], and Finish[<Code>].",
                )),
            },
        }
    }
}
