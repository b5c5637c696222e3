//! Provider integration for ExplodeIt.
//!
//! [`GeminiClient`] implements [`explodeit_interface::GenerationBackend`]
//! over the Gemini REST API. The crate also carries the helpers that shape
//! provider output: citation filtering, the WAV container for raw speech
//! samples and call metrics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod citations;
mod gemini;
mod metrics;
mod wav;

pub use citations::filter_citations;
pub use gemini::GeminiClient;
pub use metrics::{LlmMetrics, classify_error};
pub use wav::{WAV_HEADER_LEN, pcm_to_wav};
