//! The object plan produced by the planning stage.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Broad classification of the requested topic.
///
/// Drives the visual metaphor of the infographic and the action of the
/// video. Unrecognized values read from a model response map to `Other`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainType {
    /// Machines, devices, tangible objects
    Physical,
    /// Applications, systems, protocols
    Software,
    /// Ideas, practices, abstractions
    Conceptual,
    /// Organisms, organs, biological systems
    Biological,
    /// Anything else
    #[default]
    #[serde(other)]
    Other,
}

/// Topic-specific headings for the four article sections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionTitles {
    /// Heading for the origin section
    pub origin: String,
    /// Heading for the component anatomy section
    pub anatomy: String,
    /// Heading for the long-form article
    pub article: String,
    /// Heading for the trivia list
    pub trivia: String,
}

/// Narration voice and tone chosen by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioVibe {
    /// Requested prebuilt voice; validated against the allow-list at synthesis time
    #[serde(default)]
    pub voice_name: String,
    /// Free-form tone description
    #[serde(default)]
    pub tone_description: String,
}

/// Structured content plan for one topic.
///
/// Immutable once produced. Field names follow the camelCase JSON shape the
/// planning model is asked to return.
///
/// # Examples
///
/// ```
/// use explodeit_core::{DomainType, ObjectPlan};
///
/// let raw = r#"{
///     "displayTitle": "Mechanical Wristwatch",
///     "category": "Horology",
///     "domainType": "PHYSICAL",
///     "visualMetaphor": "Exploded View",
///     "sectionTitles": {"origin": "Origins", "anatomy": "Movement", "article": "How It Ticks", "trivia": "Did You Know?"},
///     "originStory": "Short overview.",
///     "detailedArticle": "Long article.",
///     "trivia": ["a", "b", "c", "d", "e"],
///     "visualStylePrompt": "Studio macro photography",
///     "componentList": ["Mainspring", "Escapement"],
///     "audioVibe": {"voiceName": "Charon", "toneDescription": "Precise"}
/// }"#;
///
/// let plan: ObjectPlan = serde_json::from_str(raw).unwrap();
/// assert_eq!(plan.domain_type, DomainType::Physical);
/// assert_eq!(plan.component_list.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPlan {
    /// Title shown at the top of the entry
    pub display_title: String,
    /// Encyclopedia category
    pub category: String,
    /// Topic classification
    #[serde(default)]
    pub domain_type: DomainType,
    /// Diagram style for the infographic (e.g. "Exploded View")
    #[serde(default)]
    pub visual_metaphor: String,
    /// Section headings
    pub section_titles: SectionTitles,
    /// Short origin text
    pub origin_story: String,
    /// Long-form markdown article
    pub detailed_article: String,
    /// Fun facts
    pub trivia: Vec<String>,
    /// Visual style description for image prompts
    pub visual_style_prompt: String,
    /// Ordered component names
    pub component_list: Vec<String>,
    /// Narration voice/tone pair
    #[serde(default)]
    pub audio_vibe: AudioVibe,
}

impl ObjectPlan {
    /// Structured-output schema sent with the planning request.
    pub fn response_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "displayTitle": { "type": "STRING" },
                "category": { "type": "STRING" },
                "domainType": {
                    "type": "STRING",
                    "enum": ["PHYSICAL", "SOFTWARE", "CONCEPTUAL", "BIOLOGICAL", "OTHER"],
                    "description": "Classify the subject."
                },
                "visualMetaphor": {
                    "type": "STRING",
                    "description": "The style of diagram (e.g., 'Exploded View', 'System Architecture', 'Flowchart', 'Mind Map')."
                },
                "sectionTitles": {
                    "type": "OBJECT",
                    "properties": {
                        "origin": { "type": "STRING" },
                        "anatomy": { "type": "STRING" },
                        "article": { "type": "STRING" },
                        "trivia": { "type": "STRING" }
                    },
                    "required": ["origin", "anatomy", "article", "trivia"]
                },
                "originStory": { "type": "STRING", "description": "Short overview text only." },
                "detailedArticle": { "type": "STRING", "description": "Long form markdown text." },
                "trivia": { "type": "ARRAY", "items": { "type": "STRING" } },
                "visualStylePrompt": { "type": "STRING" },
                "componentList": { "type": "ARRAY", "items": { "type": "STRING" } },
                "audioVibe": {
                    "type": "OBJECT",
                    "properties": {
                        "voiceName": { "type": "STRING", "description": "One of: Puck, Charon, Kore, Fenrir, Zephyr" },
                        "toneDescription": { "type": "STRING" }
                    }
                }
            },
            "required": [
                "displayTitle", "category", "domainType", "visualMetaphor", "sectionTitles",
                "originStory", "detailedArticle", "trivia", "visualStylePrompt",
                "componentList", "audioVibe"
            ]
        })
    }
}
