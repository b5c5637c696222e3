//! ExplodeIt CLI binary.
//!
//! This binary provides command-line access to the generation pipeline:
//! - Generate an entry for a topic, or for a randomly chosen one
//! - Manage the stored API key
//! - Run an interactive session with history

use clap::Parser;
use explodeit::observability::{ObservabilityConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{AppContext, Cli, Commands, handle_key_command, run_generation, run_shell};

    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::new().with_json_logs(cli.json_logs);
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability(&observability)?;

    let context = AppContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { topic, no_video, out } => {
            run_generation(&context, Some(&topic), !no_video, &out).await?;
        }

        Commands::Surprise { no_video, out } => {
            run_generation(&context, None, !no_video, &out).await?;
        }

        Commands::Key(key_cmd) => {
            handle_key_command(&context, key_cmd).await?;
        }

        Commands::Shell { out } => {
            run_shell(&context, &out).await?;
        }
    }

    Ok(())
}
