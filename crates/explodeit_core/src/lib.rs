//! Core data types for the ExplodeIt generation pipeline.
//!
//! This crate holds the session-independent data model: the generation
//! item and its merge patches, the object plan produced by the planning
//! stage, component parts, usage records, the status state machine, the
//! cost estimator and inline media payloads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod component;
mod cost;
mod item;
mod media;
mod plan;
mod status;
mod usage;

pub use component::ComponentPart;
pub use cost::{ModelPrice, PriceTable, round_cost};
pub use item::{GenerationItem, ItemId, ItemPatch};
pub use media::{InlineData, MIME_MP4, MIME_PNG, MIME_WAV};
pub use plan::{AudioVibe, DomainType, ObjectPlan, SectionTitles};
pub use status::GenerationStatus;
pub use usage::{TokenUsage, UsageTotals};
