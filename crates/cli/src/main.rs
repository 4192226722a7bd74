//! trialmind CLI, the main entry point.
//!
//! Commands:
//! - `solve`    Answer one question with a chosen agent
//! - `config`   Show, locate, or validate the configuration
//! - `pricing`  List the model pricing used for cost totals
//! - `doctor`   Diagnose the local setup

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "trialmind",
    about = "trialmind: ReAct, Reflexion and CRITIC agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question with a chosen agent
    Solve {
        /// Agent: react, reflexion-cot, reflexion-react or critic
        #[arg(short, long, default_value = "react")]
        agent: String,

        /// Benchmark the question comes from (selects tools and grading)
        #[arg(short, long, default_value = "hotpotqa")]
        benchmark: String,

        /// The question to answer
        #[arg(short, long)]
        question: String,

        /// Answer key (required by the Reflexion agents; unit tests for code benchmarks)
        #[arg(short, long)]
        key: Option<String>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List model pricing
    Pricing,

    /// Diagnose the local setup
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the loaded configuration
    Show,
    /// Print the default configuration as TOML
    Default,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve {
            agent,
            benchmark,
            question,
            key,
            model,
            json,
        } => {
            commands::solve::run(commands::solve::SolveArgs {
                agent,
                benchmark,
                question,
                key,
                model,
                json,
            })
            .await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Default => commands::config_cmd::default().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Pricing => commands::pricing::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
