//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ExplodeIt - multimedia encyclopedia entries from a single topic
#[derive(Parser, Debug)]
#[command(name = "explodeit")]
#[command(about = "Generate exploded-view encyclopedia entries with images, video and narration", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an entry for a topic
    Generate {
        /// Object, system or idea to explain
        topic: String,

        /// Skip the animation stage
        #[arg(long)]
        no_video: bool,

        /// Directory the artifacts are written to
        #[arg(long, default_value = "explodeit-output")]
        out: PathBuf,
    },

    /// Generate an entry for a randomly chosen object
    Surprise {
        /// Skip the animation stage
        #[arg(long)]
        no_video: bool,

        /// Directory the artifacts are written to
        #[arg(long, default_value = "explodeit-output")]
        out: PathBuf,
    },

    /// API key management commands
    #[command(subcommand)]
    Key(KeyCommands),

    /// Interactive session with history
    Shell {
        /// Directory the artifacts are written to
        #[arg(long, default_value = "explodeit-output")]
        out: PathBuf,
    },
}

/// API key subcommands
#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Save a key for later sessions
    Set {
        /// Gemini API key
        key: String,
    },

    /// Remove the saved key
    Clear,

    /// Show where the active key comes from
    Status,
}
