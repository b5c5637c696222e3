//! Configuration and credentials for ExplodeIt.
//!
//! Settings are layered with the `config` crate: the bundled
//! `explodeit.toml`, then `~/.config/explodeit/explodeit.toml`, then
//! `./explodeit.toml`, later files overriding earlier ones.
//!
//! The API key is never global state. [`ApiKeyHandle`] is a cloneable handle
//! passed to whatever needs the key, and [`CredentialStore`] persists it
//! between runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod credentials;
mod settings;

pub use credentials::{API_KEY_ENV, ApiKeyHandle, CredentialStore};
pub use settings::{ApiSettings, ExplodeItConfig, ModelSettings, PipelineSettings, RetrySettings};
