//! API key command handler.

use super::{AppContext, KeyCommands};
use explodeit::API_KEY_ENV;

/// Save, clear or describe the API key.
pub async fn handle_key_command(
    context: &AppContext,
    command: KeyCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        KeyCommands::Set { key } => {
            if key.trim().is_empty() {
                return Err("API key must not be empty".into());
            }
            context
                .pipeline
                .save_api_key(&context.credentials, &key)
                .await?;
            println!("Saved key to {}", context.credentials.path().display());
        }
        KeyCommands::Clear => {
            context.pipeline.clear_api_key(&context.credentials).await?;
            println!("Removed {}", context.credentials.path().display());
        }
        KeyCommands::Status => {
            let source = if context.credentials.load()?.is_some() {
                format!("saved in {}", context.credentials.path().display())
            } else if context.api_key.is_set() {
                format!("from {API_KEY_ENV}")
            } else {
                "not set".to_string()
            };
            println!("API key: {source}");
        }
    }
    Ok(())
}
