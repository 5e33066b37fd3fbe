//! MiniAGI CLI: the main entry point.
//!
//! Commands:
//! - `run` - Answer one message with the agent team
//! - `agents` - List registered agents
//! - `tools` - List tool signatures
//! - `doctor` - Check the configured provider
//! - `config` - Print a starter config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "miniagi",
    about = "MiniAGI — multi-agent orchestration over local or hosted LLMs",
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
    /// Answer a single message
    Run {
        /// The user message
        message: String,

        /// Step budget (defaults to `[orchestrator] max_steps`)
        #[arg(long)]
        max_steps: Option<u32>,

        /// Extra instruction prepended to every agent prompt
        #[arg(long)]
        instruction: Option<String>,

        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered agents
    Agents,

    /// List available tools
    Tools,

    /// Diagnose provider connectivity
    Doctor,

    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            message,
            max_steps,
            instruction,
            json,
        } => commands::run::run(message, max_steps, instruction, json).await?,
        Commands::Agents => commands::agents::run()?,
        Commands::Tools => commands::tools::run()?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config => commands::config_cmd::show(),
    }

    Ok(())
}
