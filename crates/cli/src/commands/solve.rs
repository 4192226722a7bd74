//! `trialmind solve`: answer one question with a chosen agent.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use trialmind_agent::{AgentContext, AgentKind, AgentOutput, Benchmark, Llm, TaskFamily, Toolbox, build_agent};
use trialmind_config::AppConfig;
use trialmind_tools::{InMemoryDocstore, PythonExecutor, WikipediaDocstore};

pub struct SolveArgs {
    pub agent: String,
    pub benchmark: String,
    pub question: String,
    pub key: Option<String>,
    pub model: Option<String>,
    pub json: bool,
}

pub async fn run(args: SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let model = args.model.unwrap_or_else(|| config.model().to_string());

    let kind: AgentKind = args.agent.parse()?;
    let benchmark: Benchmark = args.benchmark.parse()?;

    if !config.has_api_key() {
        tracing::warn!(
            provider = %config.default_provider,
            "No API key configured; set TRIALMIND_API_KEY or OPENAI_API_KEY unless the provider is local"
        );
    }

    let router = trialmind_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    let llm = Llm::new(provider, &model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_pricing(Arc::new(super::pricing::build_table(&config)));

    let toolbox = build_toolbox(&config, benchmark.family())?;
    let ctx = AgentContext::new(llm, benchmark, toolbox)
        .with_examples(config.prompts.load_examples(benchmark.as_str())?)
        .with_reflect_examples(config.prompts.load_reflect_examples(benchmark.as_str())?);

    let agent = build_agent(kind, ctx, &config.agent)?;
    let output = agent.generate(&args.question, args.key.as_deref()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(kind, &model, &output);
    }

    Ok(())
}

/// The docstore or code executor the benchmark's actions need.
fn build_toolbox(
    config: &AppConfig,
    family: TaskFamily,
) -> Result<Toolbox, Box<dyn std::error::Error>> {
    let tools = &config.tools;
    let toolbox = match family {
        TaskFamily::Qa => match tools.docstore.as_str() {
            "memory" => {
                let path = tools
                    .documents_path
                    .as_deref()
                    .ok_or("tools.documents_path is required for the memory docstore")?;
                let docstore = InMemoryDocstore::from_json_file(Path::new(path))?;
                tracing::debug!(pages = docstore.len(), path, "Loaded in-memory docstore");
                Toolbox::new().with_docstore(Arc::new(docstore))
            }
            _ => Toolbox::new().with_docstore(Arc::new(WikipediaDocstore::new(&tools.wikipedia_url))),
        },
        TaskFamily::Math | TaskFamily::Code => Toolbox::new().with_executor(Arc::new(
            PythonExecutor::new(&tools.python_bin, Duration::from_secs(tools.exec_timeout_secs)),
        )),
    };
    Ok(toolbox)
}

fn print_summary(kind: AgentKind, model: &str, output: &AgentOutput) {
    let totals = &output.totals;

    println!();
    println!("  Agent:     {kind}");
    println!("  Model:     {model}");
    println!("  Question:  {}", output.question);
    println!("  Answer:    {}", if output.answer.is_empty() { "(none)" } else { output.answer.as_str() });
    match output.is_correct {
        Some(true) => println!("  Correct:   yes"),
        Some(false) => println!("  Correct:   no"),
        None => {}
    }
    println!();
    println!(
        "  Tokens:    {} prompt + {} completion = {}",
        totals.total_prompt_tokens, totals.total_completion_tokens, totals.total_tokens
    );
    println!("  Cost:      ${:.6}", totals.total_cost);
    println!(
        "  Time:      {:.2}s total, {:.2}s waiting on the model",
        totals.total_time, totals.total_prompt_time
    );
    println!("  LLM calls: {}", output.steps.responses().len());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolbox_matches_family() {
        let config = AppConfig::default();

        let qa = build_toolbox(&config, TaskFamily::Qa).unwrap();
        assert!(qa.docstore.is_some());
        assert!(qa.executor.is_none());

        let code = build_toolbox(&config, TaskFamily::Code).unwrap();
        assert!(code.executor.is_some());
    }

    #[test]
    fn memory_docstore_needs_a_readable_file() {
        let mut config = AppConfig::default();
        config.tools.docstore = "memory".into();
        config.tools.documents_path = Some("/nonexistent/pages.json".into());
        assert!(build_toolbox(&config, TaskFamily::Qa).is_err());
    }
}
