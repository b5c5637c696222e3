//! Per-call usage records and session-wide totals.

use crate::GenerationItem;
use serde::{Deserialize, Serialize};

/// One network call's model, unit counts and estimated cost.
///
/// Units are tokens for text models, characters for speech synthesis and a
/// nominal count for asset-priced models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    model: String,
    input_tokens: u64,
    output_tokens: u64,
    cost_estimate: f64,
}

impl TokenUsage {
    /// Record a call against `model` with its already-estimated cost.
    pub fn new(
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
        cost_estimate: f64,
    ) -> Self {
        Self {
            model: model.into(),
            input_tokens,
            output_tokens,
            cost_estimate,
        }
    }
}

/// Aggregate cost and unit counts over a set of history items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    /// Sum of estimated costs
    pub cost: f64,
    /// Sum of input units
    pub input_tokens: u64,
    /// Sum of output units
    pub output_tokens: u64,
    /// Number of usage records aggregated
    pub calls: usize,
}

impl UsageTotals {
    /// Fold a sequence of usage records into totals.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TokenUsage>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, u| {
            acc.cost += u.cost_estimate;
            acc.input_tokens += u.input_tokens;
            acc.output_tokens += u.output_tokens;
            acc.calls += 1;
            acc
        })
    }

    /// Totals across every usage record of every item.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a GenerationItem>) -> Self {
        Self::from_records(items.into_iter().flat_map(|item| item.usage().iter()))
    }
}
