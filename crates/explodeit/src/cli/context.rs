//! Wiring shared by every command.

use explodeit::{
    ApiKeyHandle, CredentialStore, ExplodeItConfig, ExplodeItResult, GeminiClient, Pipeline,
    SessionStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Configuration, credential store and pipeline for one process.
pub struct AppContext {
    pub pipeline: Pipeline<GeminiClient>,
    pub credentials: CredentialStore,
    pub api_key: ApiKeyHandle,
}

impl AppContext {
    /// Load configuration (bundled, user, working directory, then `config`
    /// if given) and resolve the API key.
    pub fn load(config: Option<&Path>) -> ExplodeItResult<Self> {
        let config = match config {
            Some(path) => ExplodeItConfig::from_file(path)?,
            None => ExplodeItConfig::load()?,
        };
        let credentials = CredentialStore::in_home_dir()?;
        let api_key = ApiKeyHandle::new(credentials.resolve()?);
        debug!(key_set = api_key.is_set(), "Credentials resolved");

        let backend = Arc::new(GeminiClient::new(&config.api, api_key.clone()));
        let pipeline = Pipeline::new(
            backend,
            Arc::new(config),
            SessionStore::new(),
            api_key.clone(),
        );
        Ok(Self {
            pipeline,
            credentials,
            api_key,
        })
    }
}
