//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the explodeit binary.

mod commands;
mod context;
mod generate;
mod key;
mod progress;
mod shell;

pub use commands::{Cli, Commands, KeyCommands};
pub use context::AppContext;
pub use generate::run_generation;
pub use key::handle_key_command;
pub use shell::run_shell;
