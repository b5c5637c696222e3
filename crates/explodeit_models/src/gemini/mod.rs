//! Gemini REST API client.
//!
//! Text, grounded text, image and speech go through `generateContent`;
//! video uses the long-running `predictLongRunning` endpoint and is polled
//! through the operations API.

mod client;
mod wire;

pub use client::GeminiClient;
