//! Orchestration core of ExplodeIt.
//!
//! A topic goes through planning, two image stages, batched component
//! enrichment and finally concurrent video and narration. [`Stages`] holds
//! one function per stage, each wrapping its provider calls in the retry
//! policy and returning the value with its usage records. [`Pipeline`]
//! sequences the stages for one request, patches the session's item after
//! every stage and classifies terminal failures. [`SessionStore`] is the
//! in-memory history, selection, status and ledger that observers watch.
//!
//! ```no_run
//! use explodeit_config::{ApiKeyHandle, ExplodeItConfig};
//! use explodeit_models::GeminiClient;
//! use explodeit_pipeline::{Pipeline, SessionStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> explodeit_error::ExplodeItResult<()> {
//! let config = Arc::new(ExplodeItConfig::load()?);
//! let key = ApiKeyHandle::new(std::env::var("GEMINI_API_KEY").ok());
//! let backend = Arc::new(GeminiClient::new(&config.api, key.clone()));
//! let pipeline = Pipeline::new(backend, config, SessionStore::new(), key);
//!
//! let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod enrichment;
mod failure;
mod prompts;
mod session;
mod stages;

pub use driver::{Pipeline, RunOutcome};
pub use enrichment::{BatchFailure, BatchOutcome, EnrichmentReport, parse_components, partition};
pub use failure::{AUTH_FAILURE_MESSAGE, Failure, SURPRISE_FAILURE_MESSAGE, is_auth_error};
pub use session::{RunToken, SessionEvent, SessionSnapshot, SessionStore};
pub use stages::{NarrationOutput, StageOutput, Stages};
