//! Component parts of a planned object.

use serde::{Deserialize, Serialize};

const PENDING_DESCRIPTION: &str = "Pending analysis...";
const PENDING_COMPOSITION: &str = "Analyzing...";

/// One planned component of the object being explained.
///
/// Starts as a placeholder right after planning and is replaced wholesale
/// by the enriched version once the enrichment stage returns.
///
/// # Examples
///
/// ```
/// use explodeit_core::ComponentPart;
///
/// let part = ComponentPart::placeholder("Balance Wheel");
/// assert!(part.is_placeholder());
/// assert_eq!(part.detailed_content.as_deref(), Some(""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPart {
    /// Component name
    pub name: String,
    /// One-sentence summary
    #[serde(default)]
    pub short_description: String,
    /// Long-form body, absent until enrichment completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_content: Option<String>,
    /// Material, framework or core principle
    #[serde(default)]
    pub composition: String,
    /// Citation URLs attached by the enrichment batch that produced this part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl ComponentPart {
    /// Placeholder shown between planning and enrichment.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_description: PENDING_DESCRIPTION.to_string(),
            detailed_content: Some(String::new()),
            composition: PENDING_COMPOSITION.to_string(),
            sources: None,
        }
    }

    /// Whether this part is still the post-planning placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.short_description == PENDING_DESCRIPTION && self.composition == PENDING_COMPOSITION
    }

    /// Replace this part's sources with the given citation list.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}
