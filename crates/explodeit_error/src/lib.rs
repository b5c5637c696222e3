//! Error types for the ExplodeIt workspace.
//!
//! This crate provides the foundation error types used by every ExplodeIt crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use explodeit_error::{ExplodeItResult, HttpError};
//!
//! fn fetch_data() -> ExplodeItResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod gemini;
mod message;
mod pipeline;
mod storage;

pub use error::{ExplodeItError, ExplodeItErrorKind, ExplodeItResult};
pub use gemini::{GeminiError, GeminiErrorKind};
pub use message::{BuilderError, ConfigError, HttpError, JsonError};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use storage::{StorageError, StorageErrorKind};
