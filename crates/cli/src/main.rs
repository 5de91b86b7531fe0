//! PromptLab CLI — the main entry point.
//!
//! Commands:
//! - `hello`            — Zero-shot prompt against the tutor persona
//! - `few-shot`         — Same persona with worked examples
//! - `self-consistency` — Sample one question several times and vote
//! - `judge`            — Chain-of-thought reviewed by a second model
//! - `config`           — Show, locate or validate the config file
//! - `init`             — Write a default config file
//! - `doctor`           — Diagnose configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "promptlab",
    about = "PromptLab — prompt-engineering patterns from the command line",
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
    /// Ask the tutor persona a question without examples
    Hello {
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Ask the tutor persona a question with few-shot examples
    FewShot {
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Answer by majority vote over several sampled completions
    SelfConsistency {
        #[arg(short, long)]
        question: Option<String>,

        /// Number of samples (defaults to the configured value)
        #[arg(short, long)]
        attempts: Option<usize>,
    },

    /// Reason step by step with an external judge model
    Judge {
        #[arg(short, long)]
        query: Option<String>,

        /// Print the finished chain as JSON instead of live progress
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Create ~/.promptlab/config.toml with defaults
    Init,

    /// Diagnose configuration and provider connectivity
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so stdout stays machine-readable.
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
        Commands::Hello { question } => commands::prompt::hello(question).await?,
        Commands::FewShot { question } => commands::prompt::few_shot(question).await?,
        Commands::SelfConsistency { question, attempts } => {
            commands::self_consistency::run(question, attempts).await?
        }
        Commands::Judge { query, json } => commands::judge::run(query, json).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Init => commands::init::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
