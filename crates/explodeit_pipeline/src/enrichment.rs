//! Batched component enrichment.
//!
//! Component names are split into fixed-size batches and every batch is sent
//! at once, with no limit on how many are in flight. Each batch is one
//! grounded call; its citations are attached to every component it returns.

use crate::Stages;
use crate::prompts;
use explodeit_core::{ComponentPart, TokenUsage};
use explodeit_error::{ExplodeItError, GeminiError, GeminiErrorKind};
use explodeit_interface::{GenerationBackend, TextRequestBuilder};
use explodeit_retry::call_with_retry;
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{error, instrument, warn};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("Valid fenced JSON regex"));
static FENCED_ANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\n(.*?)\n```").expect("Valid fence regex"));

/// Split `names` into consecutive batches of at most `size`, preserving order.
///
/// # Examples
///
/// ```
/// use explodeit_pipeline::partition;
///
/// let names: Vec<String> = (1..=7).map(|i| format!("part {i}")).collect();
/// let batches = partition(&names, 3);
/// assert_eq!(batches.len(), 3);
/// assert_eq!(batches[2], vec!["part 7".to_string()]);
/// assert_eq!(batches.concat(), names);
/// ```
pub fn partition(names: &[String], size: usize) -> Vec<Vec<String>> {
    names.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

#[derive(Debug, Deserialize)]
struct ComponentEnvelope {
    #[serde(default)]
    components: Vec<ComponentPart>,
}

/// Read the component list out of a grounded response.
///
/// The JSON may arrive bare or inside a markdown code fence.
pub fn parse_components(text: &str) -> Result<Vec<ComponentPart>, serde_json::Error> {
    let json = FENCED_JSON
        .captures(text)
        .or_else(|| FENCED_ANY.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());
    serde_json::from_str::<ComponentEnvelope>(json).map(|envelope| envelope.components)
}

/// Why a batch produced no components.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BatchFailure {
    /// The call succeeded but its text was not the expected JSON
    #[display("unparsable response: {}", _0)]
    Unparsable(String),
    /// The call itself failed after every retry
    #[display("{}", _0)]
    Request(String),
}

/// Result of one enrichment batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Submission order of the batch
    pub index: usize,
    /// Component names sent in this batch
    pub names: Vec<String>,
    /// Enriched parts, or why there are none
    pub result: Result<Vec<ComponentPart>, BatchFailure>,
}

/// All batch outcomes plus the usage of every call that returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichmentReport {
    /// One outcome per batch, in submission order
    pub outcomes: Vec<BatchOutcome>,
    /// One record per batch call that returned a response
    pub usage: Vec<TokenUsage>,
}

impl EnrichmentReport {
    /// Enriched parts of every successful batch, in submission order.
    pub fn components(&self) -> Vec<ComponentPart> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .flatten()
            .cloned()
            .collect()
    }

    /// First batch whose call failed outright, if any.
    pub fn request_failure(&self) -> Option<&BatchOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| matches!(outcome.result, Err(BatchFailure::Request(_))))
    }
}

impl<B: GenerationBackend + ?Sized> Stages<B> {
    /// Enrich `names` in concurrent batches.
    ///
    /// Never fails as a whole: each batch reports its own outcome and the
    /// caller decides what a failed batch means.
    #[instrument(skip(self, names), fields(components = names.len()))]
    pub async fn enrich(&self, topic: &str, names: &[String]) -> EnrichmentReport {
        let batches = partition(names, self.config().pipeline.enrichment_batch_size);
        let results = join_all(
            batches
                .iter()
                .map(|batch| self.enrich_batch(topic, batch)),
        )
        .await;

        let mut report = EnrichmentReport::default();
        for (index, (names, (result, usage))) in batches.into_iter().zip(results).enumerate() {
            if let Err(failure) = &result {
                error!(batch = index, names = ?names, error = %failure, "Enrichment batch failed");
            }
            report.usage.extend(usage);
            report.outcomes.push(BatchOutcome {
                index,
                names,
                result,
            });
        }
        report
    }

    async fn enrich_batch(
        &self,
        topic: &str,
        batch: &[String],
    ) -> (Result<Vec<ComponentPart>, BatchFailure>, Option<TokenUsage>) {
        let model = self.config().models.authoring.as_str();
        let req = match TextRequestBuilder::default()
            .model(model)
            .prompt(prompts::deep_dive(topic, batch))
            .build()
        {
            Ok(req) => req,
            Err(e) => return (Err(BatchFailure::Request(e.to_string())), None),
        };

        let backend = self.backend();
        let req = &req;
        let response = call_with_retry(
            &self.config().retry.enrichment,
            "Enrich Batch with Search",
            move || async move {
                let response = backend.generate_grounded(req).await?;
                if response.text.is_none() {
                    return Err(ExplodeItError::from(GeminiError::new(
                        GeminiErrorKind::MissingPayload("enrichment text".to_string()),
                    )));
                }
                Ok(response)
            },
        )
        .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return (Err(BatchFailure::Request(e.summary())), None),
        };

        let usage = self.record(
            model,
            response.usage.prompt_tokens,
            response.usage.candidate_tokens,
        );

        let mut seen = HashSet::new();
        let sources: Vec<String> = response
            .citations
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        let text = response.text.unwrap_or_default();
        let result = match parse_components(&text) {
            Ok(parts) => Ok(parts
                .into_iter()
                .map(|part| part.with_sources(sources.clone()))
                .collect()),
            Err(e) => {
                warn!(error = %e, "Could not parse enrichment response");
                Err(BatchFailure::Unparsable(e.to_string()))
            }
        };
        (result, Some(usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_handles_exact_and_empty_input() {
        let names: Vec<String> = (0..6).map(|i| i.to_string()).collect();
        assert_eq!(partition(&names, 3).len(), 2);
        assert!(partition(&[], 3).is_empty());
        assert_eq!(partition(&names, 0).len(), 6);
    }

    #[test]
    fn parses_fenced_and_bare_json() {
        let fenced = "Here you go:\n```json\n{\"components\": [{\"name\": \"Rotor\", \"composition\": \"Steel\", \"shortDescription\": \"Spins.\", \"detailedContent\": \"Long.\"}]}\n```";
        let parts = parse_components(fenced).unwrap();
        assert_eq!(parts[0].name, "Rotor");
        assert_eq!(parts[0].detailed_content.as_deref(), Some("Long."));

        let plain_fence = "```\n{\"components\": []}\n```";
        assert!(parse_components(plain_fence).unwrap().is_empty());

        let bare = r#"{"components": [{"name": "Stator"}]}"#;
        assert_eq!(parse_components(bare).unwrap()[0].name, "Stator");
    }

    #[test]
    fn prose_is_unparsable() {
        assert!(parse_components("I could not find anything.").is_err());
    }
}
