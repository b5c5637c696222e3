//! Static price table and cost estimation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a model is billed.
///
/// The variant is inferred from which fields are present, so a TOML pricing
/// entry only lists the rates that apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelPrice {
    /// Billed per 1000 input and output tokens
    Tokens {
        /// Rate per 1000 input tokens
        input_per_1k_tokens: f64,
        /// Rate per 1000 output tokens
        output_per_1k_tokens: f64,
    },
    /// Flat price per generated asset, regardless of units
    Asset {
        /// Price per image or video
        per_asset: f64,
    },
    /// Billed per 1000 input characters
    Characters {
        /// Rate per 1000 characters
        per_1k_chars: f64,
    },
}

impl ModelPrice {
    fn cost(&self, input_units: u64, output_units: u64) -> f64 {
        match *self {
            Self::Tokens {
                input_per_1k_tokens,
                output_per_1k_tokens,
            } => {
                (input_units as f64 / 1000.0) * input_per_1k_tokens
                    + (output_units as f64 / 1000.0) * output_per_1k_tokens
            }
            Self::Asset { per_asset } => per_asset,
            Self::Characters { per_1k_chars } => (input_units as f64 / 1000.0) * per_1k_chars,
        }
    }
}

/// Model identifier to price mapping.
///
/// # Examples
///
/// ```
/// use explodeit_core::{ModelPrice, PriceTable};
///
/// let table = PriceTable::from_iter([(
///     "gemini-2.5-flash".to_string(),
///     ModelPrice::Tokens { input_per_1k_tokens: 0.0001, output_per_1k_tokens: 0.0004 },
/// )]);
///
/// assert_eq!(table.estimate("gemini-2.5-flash", 2000, 1000), 0.0006);
/// assert_eq!(table.estimate("unknown-model", 2000, 1000), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(HashMap<String, ModelPrice>);

impl PriceTable {
    /// Estimated cost of one call, rounded to five decimal places.
    ///
    /// Models missing from the table cost nothing.
    pub fn estimate(&self, model: &str, input_units: u64, output_units: u64) -> f64 {
        self.0
            .get(model)
            .map(|price| round_cost(price.cost(input_units, output_units)))
            .unwrap_or(0.0)
    }

    /// Price entry for a model.
    pub fn get(&self, model: &str) -> Option<&ModelPrice> {
        self.0.get(model)
    }

    /// Add or replace a model's price.
    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.0.insert(model.into(), price);
    }

    /// Number of priced models.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no model is priced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ModelPrice)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, ModelPrice)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Round a monetary amount to five decimal places.
pub fn round_cost(amount: f64) -> f64 {
    (amount * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PriceTable {
        PriceTable::from_iter([
            (
                "planner".to_string(),
                ModelPrice::Tokens {
                    input_per_1k_tokens: 0.00125,
                    output_per_1k_tokens: 0.005,
                },
            ),
            ("painter".to_string(), ModelPrice::Asset { per_asset: 0.04 }),
            ("speaker".to_string(), ModelPrice::Characters { per_1k_chars: 0.002 }),
        ])
    }

    #[test]
    fn asset_price_ignores_units() {
        let t = table();
        assert_eq!(t.estimate("painter", 0, 0), 0.04);
        assert_eq!(t.estimate("painter", 90_000, 12), 0.04);
    }

    #[test]
    fn token_price_rounds_to_five_places() {
        assert_eq!(table().estimate("planner", 1000, 600), 0.00425);
        assert_eq!(table().estimate("planner", 3, 1), 0.00001);
    }

    #[test]
    fn character_price_uses_input_units_only() {
        assert_eq!(table().estimate("speaker", 1500, 999), 0.003);
    }

    #[test]
    fn deserializes_untagged_entries() {
        let json = r#"{"a": {"per_asset": 0.1}, "b": {"per_1k_chars": 0.002},
                      "c": {"input_per_1k_tokens": 1.0, "output_per_1k_tokens": 2.0}}"#;
        let t: PriceTable = serde_json::from_str(json).unwrap();
        assert_eq!(t.get("a"), Some(&ModelPrice::Asset { per_asset: 0.1 }));
        assert!(matches!(t.get("c"), Some(ModelPrice::Tokens { .. })));
        assert_eq!(t.len(), 3);
    }
}
