//! Generation items and the merge patches that fill them in.

use crate::{ComponentPart, ObjectPlan, TokenUsage};
use serde::{Deserialize, Serialize};

/// Opaque history item identifier derived from the creation time.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Identifier for an item created at the given millisecond timestamp.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One user request and every artifact produced for it so far.
///
/// Stage outputs start absent and are only ever filled in through
/// [`GenerationItem::apply`]; once a field holds a value it is never cleared.
/// The usage log only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct GenerationItem {
    id: ItemId,
    prompt: String,
    /// Creation time in milliseconds since the Unix epoch
    timestamp: i64,
    has_video: bool,
    plan: Option<ObjectPlan>,
    components: Option<Vec<ComponentPart>>,
    narration_script: Option<String>,
    infographic_url: Option<String>,
    assembled_url: Option<String>,
    video_url: Option<String>,
    audio_url: Option<String>,
    usage: Vec<TokenUsage>,
}

impl GenerationItem {
    /// Start a new item. `initial_usage` carries records from work done
    /// before the item existed, such as choosing a random topic.
    pub fn new(
        id: ItemId,
        prompt: impl Into<String>,
        timestamp: i64,
        has_video: bool,
        initial_usage: Vec<TokenUsage>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            timestamp,
            has_video,
            plan: None,
            components: None,
            narration_script: None,
            infographic_url: None,
            assembled_url: None,
            video_url: None,
            audio_url: None,
            usage: initial_usage,
        }
    }

    /// Merge a patch into this item.
    ///
    /// Present fields overwrite, absent fields leave the current value alone,
    /// the component list is replaced wholesale and usage records are appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_core::{GenerationItem, ItemId, ItemPatch, TokenUsage};
    ///
    /// let mut item = GenerationItem::new(ItemId::from("1"), "Bicycle", 1, false, vec![]);
    /// item.apply(
    ///     ItemPatch::new()
    ///         .infographic_url("data:image/png;base64,AA==")
    ///         .usage(TokenUsage::new("image-model", 10, 0, 0.04)),
    /// );
    /// item.apply(ItemPatch::new().usage(TokenUsage::new("image-model", 12, 0, 0.04)));
    ///
    /// assert!(item.infographic_url().is_some());
    /// assert_eq!(item.usage().len(), 2);
    /// ```
    pub fn apply(&mut self, patch: ItemPatch) {
        let ItemPatch {
            plan,
            components,
            narration_script,
            infographic_url,
            assembled_url,
            video_url,
            audio_url,
            usage,
        } = patch;

        if plan.is_some() {
            self.plan = plan;
        }
        if components.is_some() {
            self.components = components;
        }
        if narration_script.is_some() {
            self.narration_script = narration_script;
        }
        if infographic_url.is_some() {
            self.infographic_url = infographic_url;
        }
        if assembled_url.is_some() {
            self.assembled_url = assembled_url;
        }
        if video_url.is_some() {
            self.video_url = video_url;
        }
        if audio_url.is_some() {
            self.audio_url = audio_url;
        }
        self.usage.extend(usage);
    }

    /// Total estimated cost of this item's calls.
    pub fn total_cost(&self) -> f64 {
        self.usage.iter().map(|u| *u.cost_estimate()).sum()
    }
}

/// Partial update to a [`GenerationItem`] produced by one stage.
///
/// Field setters take anything convertible into the field's value.
#[derive(Debug, Clone, Default, PartialEq, derive_setters::Setters)]
#[setters(strip_option, into)]
pub struct ItemPatch {
    /// Object plan
    plan: Option<ObjectPlan>,
    /// Replacement component list
    components: Option<Vec<ComponentPart>>,
    /// Narration script
    narration_script: Option<String>,
    /// Infographic data URL
    infographic_url: Option<String>,
    /// Assembled image data URL
    assembled_url: Option<String>,
    /// Video data URL
    video_url: Option<String>,
    /// Narration audio data URL
    audio_url: Option<String>,
    #[setters(skip)]
    usage: Vec<TokenUsage>,
}

impl ItemPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one usage record.
    pub fn usage(mut self, record: TokenUsage) -> Self {
        self.usage.push(record);
        self
    }

    /// Append several usage records.
    pub fn usages(mut self, records: impl IntoIterator<Item = TokenUsage>) -> Self {
        self.usage.extend(records);
        self
    }

    /// Number of usage records this patch appends.
    pub fn usage_len(&self) -> usize {
        self.usage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> GenerationItem {
        GenerationItem::new(ItemId::from_millis(42), "Toaster", 42, true, vec![])
    }

    #[test]
    fn absent_patch_fields_do_not_clear_values() {
        let mut item = item();
        item.apply(ItemPatch::new().audio_url("data:audio/wav;base64,AA=="));
        item.apply(ItemPatch::new().video_url("data:video/mp4;base64,AA=="));
        assert!(item.audio_url().is_some());
        assert!(item.video_url().is_some());
    }

    #[test]
    fn components_are_replaced_wholesale() {
        let mut item = item();
        item.apply(ItemPatch::new().components(vec![
            ComponentPart::placeholder("Coil"),
            ComponentPart::placeholder("Lever"),
        ]));
        item.apply(ItemPatch::new().components(vec![ComponentPart::placeholder("Coil")]));
        assert_eq!(item.components().as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn initial_usage_is_kept() {
        let seeded = GenerationItem::new(
            ItemId::from("7"),
            "Kazoo",
            7,
            false,
            vec![TokenUsage::new("m", 1, 1, 0.0)],
        );
        assert_eq!(seeded.usage().len(), 1);
        assert_eq!(seeded.id().as_str(), "7");
    }

    #[test]
    fn patch_setters_convert_their_input() {
        let patch = ItemPatch::new()
            .narration_script("Tick.")
            .video_url(String::from("data:video/mp4;base64,AA=="));
        let mut item = item();
        item.apply(patch);
        assert_eq!(item.narration_script().as_deref(), Some("Tick."));
        assert!(item.video_url().is_some());
        assert!(item.audio_url().is_none());
    }
}
