//! ExplodeIt - multimedia encyclopedia entries from a single topic.
//!
//! A topic goes through a chain of generative calls: a structured plan, an
//! exploded-view infographic, an assembled product shot, search-grounded
//! component write-ups, and finally an animation and a narrated audio track.
//! Each stage is retried with exponential backoff, priced, and patched into
//! the session as soon as it lands.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use explodeit::{ApiKeyHandle, ExplodeItConfig, GeminiClient, Pipeline, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ExplodeItConfig::load()?);
//!     let key = ApiKeyHandle::new(std::env::var("GEMINI_API_KEY").ok());
//!     let backend = Arc::new(GeminiClient::new(&config.api, key.clone()));
//!     let pipeline = Pipeline::new(backend, config, SessionStore::new(), key);
//!
//!     let outcome = pipeline.generate("Espresso Machine", false).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ExplodeIt is organized as a workspace with focused crates:
//!
//! - `explodeit_error` - Error types
//! - `explodeit_core` - Data model, status machine, cost estimator, media payloads
//! - `explodeit_retry` - Retry with exponential backoff
//! - `explodeit_config` - Layered configuration and credential storage
//! - `explodeit_interface` - `GenerationBackend` trait
//! - `explodeit_models` - Gemini REST backend
//! - `explodeit_pipeline` - Stages, batch enrichment, driver and session store
//!
//! This crate (`explodeit`) re-exports everything for convenience and ships
//! the `explodeit` command-line tool.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use explodeit_config::*;
pub use explodeit_core::*;
pub use explodeit_error::*;
pub use explodeit_interface::*;
pub use explodeit_models::*;
pub use explodeit_pipeline::*;
pub use explodeit_retry::*;

mod artifacts;
pub mod observability;

pub use artifacts::{ArtifactWriter, render_article};
