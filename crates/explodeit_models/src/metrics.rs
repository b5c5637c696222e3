//! Call metrics for provider requests.
//!
//! Instruments are created on the OpenTelemetry global meter. Without an
//! installed meter provider they are no-ops, so recording is always safe.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::OnceLock;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Request, error, latency and token instruments, labelled by provider,
/// model and operation.
#[derive(Clone)]
pub struct LlmMetrics {
    requests: Counter<u64>,
    errors: Counter<u64>,
    duration: Histogram<f64>,
    prompt_tokens: Counter<u64>,
    output_tokens: Counter<u64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("explodeit");

        Self {
            requests: meter
                .u64_counter("llm.requests")
                .with_description("Successful provider calls")
                .build(),
            errors: meter
                .u64_counter("llm.errors")
                .with_description("Failed provider calls")
                .build(),
            duration: meter
                .f64_histogram("llm.duration")
                .with_unit("s")
                .with_description("Provider call duration")
                .build(),
            prompt_tokens: meter
                .u64_counter("llm.tokens.prompt")
                .with_description("Prompt units sent")
                .build(),
            output_tokens: meter
                .u64_counter("llm.tokens.output")
                .with_description("Output units received")
                .build(),
        }
    }

    /// Process-wide instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    fn labels(provider: &'static str, model: &str, operation: &'static str) -> [KeyValue; 3] {
        [
            KeyValue::new("provider", provider),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("operation", operation),
        ]
    }

    /// Record a successful call.
    pub fn record_request(
        &self,
        provider: &'static str,
        model: &str,
        operation: &'static str,
        duration_secs: f64,
    ) {
        let labels = Self::labels(provider, model, operation);
        self.requests.add(1, &labels);
        self.duration.record(duration_secs, &labels);
    }

    /// Record a failed call under its error class.
    pub fn record_error(
        &self,
        provider: &'static str,
        model: &str,
        operation: &'static str,
        error_type: &'static str,
    ) {
        let [p, m, o] = Self::labels(provider, model, operation);
        self.errors
            .add(1, &[p, m, o, KeyValue::new("error_type", error_type)]);
    }

    /// Record reported unit counts.
    pub fn record_tokens(&self, model: &str, prompt: u64, output: u64) {
        let labels = [KeyValue::new("model", model.to_string())];
        self.prompt_tokens.add(prompt, &labels);
        self.output_tokens.add(output, &labels);
    }
}

impl Default for LlmMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}

impl std::fmt::Debug for LlmMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmMetrics").finish_non_exhaustive()
    }
}

/// Classify an error for the `error_type` metric label.
///
/// Pass the error kind rather than a located error, so line numbers in the
/// message are not mistaken for status codes. Returns one of `rate_limit`,
/// `auth`, `network`, `timeout`, `invalid_request` or `unknown`.
pub fn classify_error(error: &impl std::fmt::Display) -> &'static str {
    let text = error.to_string().to_lowercase();

    if text.contains("rate limit") || text.contains("429") {
        "rate_limit"
    } else if text.contains("api key") || text.contains("401") || text.contains("403") {
        "auth"
    } else if text.contains("timed out") || text.contains("timeout") {
        "timeout"
    } else if text.contains("connection") || text.contains("dns") || text.contains("request failed") {
        "network"
    } else if text.contains("400") || text.contains("invalid") {
        "invalid_request"
    } else {
        "unknown"
    }
}
