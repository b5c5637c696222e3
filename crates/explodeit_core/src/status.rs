//! Session-wide generation status and its transition function.

use explodeit_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};

/// What the session is currently doing.
///
/// At most one pipeline is in flight per session, so a single status value
/// describes the whole session.
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
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    /// Nothing running
    #[default]
    Idle,
    /// Choosing a random topic
    GeneratingRandom,
    /// Producing the object plan
    Planning,
    /// Rendering the exploded-view infographic
    GeneratingInfographic,
    /// Rendering the assembled product shot
    GeneratingAssembly,
    /// Enriching component parts with grounded text
    Enriching,
    /// Generating video and narration
    Animating,
    /// Last run finished
    Completed,
    /// Last run failed
    Failed,
}

impl GenerationStatus {
    /// Whether a pipeline run is in flight while in this status.
    pub fn is_processing(self) -> bool {
        !matches!(self, Self::Idle | Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_core::GenerationStatus;
    ///
    /// assert!(GenerationStatus::Planning.can_transition_to(GenerationStatus::GeneratingInfographic));
    /// assert!(GenerationStatus::Enriching.can_transition_to(GenerationStatus::Failed));
    /// assert!(!GenerationStatus::Planning.can_transition_to(GenerationStatus::Completed));
    /// ```
    pub fn can_transition_to(self, next: Self) -> bool {
        use GenerationStatus::*;

        if self.is_processing() && next == Failed {
            return true;
        }
        match (self, next) {
            (Idle | Completed | Failed, Idle | GeneratingRandom | Planning) => true,
            (GeneratingRandom, Planning | Idle) => true,
            (Planning, GeneratingInfographic) => true,
            (GeneratingInfographic, GeneratingAssembly) => true,
            (GeneratingAssembly, Enriching) => true,
            (Enriching, Animating) => true,
            (Animating, Completed) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    #[track_caller]
    pub fn transition(self, next: Self) -> Result<Self, PipelineError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            }))
        }
    }

    /// Human-readable progress label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::GeneratingRandom => "Ideation",
            Self::Planning => "Planning",
            Self::GeneratingInfographic => "Blueprinting",
            Self::GeneratingAssembly => "Manufacturing",
            Self::Enriching => "Authoring",
            Self::Animating => "Animating & Narrating",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// Position in the five-step progress tracker, for statuses that have one.
    pub fn step(self) -> Option<u8> {
        match self {
            Self::Planning => Some(1),
            Self::GeneratingInfographic => Some(2),
            Self::GeneratingAssembly => Some(3),
            Self::Enriching => Some(4),
            Self::Animating => Some(5),
            _ => None,
        }
    }
}
