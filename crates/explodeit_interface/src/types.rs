//! Request and response types for backend calls.

use explodeit_core::InlineData;
use explodeit_error::BuilderError;
use serde::{Deserialize, Serialize};

/// Unit counts reported by the provider for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Prompt tokens
    pub prompt_tokens: u64,
    /// Generated tokens
    pub candidate_tokens: u64,
}

/// Text generation request.
///
/// # Examples
///
/// ```
/// use explodeit_interface::TextRequestBuilder;
///
/// let req = TextRequestBuilder::default()
///     .model("gemini-2.5-flash")
///     .prompt("Name one household object.")
///     .temperature(1.3)
///     .build()
///     .unwrap();
///
/// assert_eq!(req.temperature(), &Some(1.3));
/// assert!(req.response_schema().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct TextRequest {
    /// Model identifier
    model: String,
    /// Prompt text
    prompt: String,
    /// Sampling temperature
    #[builder(default, setter(into, strip_option))]
    temperature: Option<f64>,
    /// Structured-output schema; when set the response is JSON
    #[builder(default, setter(into, strip_option))]
    response_schema: Option<serde_json::Value>,
}

impl TextRequestBuilder {
    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the model or prompt is missing.
    pub fn build(&self) -> Result<TextRequest, BuilderError> {
        self.build_internal()
            .map_err(|e| BuilderError::new(e.to_string()))
    }
}

/// Text generation result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextResponse {
    /// Generated text, if any came back
    pub text: Option<String>,
    /// Reported unit counts
    pub usage: UsageCounts,
}

/// Grounded text generation result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroundedResponse {
    /// Generated text, if any came back
    pub text: Option<String>,
    /// Source URLs from the grounding metadata, in response order
    pub citations: Vec<String>,
    /// Reported unit counts
    pub usage: UsageCounts,
}

/// Image generation request.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct ImageRequest {
    /// Model identifier
    model: String,
    /// Prompt text
    prompt: String,
    /// Image to condition on
    #[builder(default, setter(into, strip_option))]
    conditioning: Option<InlineData>,
    /// Aspect ratio such as "16:9"
    aspect_ratio: String,
    /// Size class such as "2K"
    image_size: String,
}

impl ImageRequestBuilder {
    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing.
    pub fn build(&self) -> Result<ImageRequest, BuilderError> {
        self.build_internal()
            .map_err(|e| BuilderError::new(e.to_string()))
    }
}

/// Image generation result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageResponse {
    /// First inline image in the response
    pub image: Option<InlineData>,
}

/// Video job request.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct VideoRequest {
    /// Model identifier
    model: String,
    /// Prompt text
    prompt: String,
    /// First frame of the video
    start_frame: InlineData,
    /// Last frame of the video
    #[builder(default, setter(into, strip_option))]
    end_frame: Option<InlineData>,
    /// Resolution such as "720p"
    resolution: String,
    /// Aspect ratio such as "16:9"
    aspect_ratio: String,
}

impl VideoRequestBuilder {
    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing.
    pub fn build(&self) -> Result<VideoRequest, BuilderError> {
        self.build_internal()
            .map_err(|e| BuilderError::new(e.to_string()))
    }
}

/// Handle and state of a long-running video job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoOperation {
    /// Provider operation name
    pub name: String,
    /// Whether the job has finished
    pub done: bool,
    /// Result URI once finished
    pub video_uri: Option<String>,
    /// Failure reported by the provider
    pub error: Option<String>,
}

impl VideoOperation {
    /// A freshly submitted, unfinished job.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Text-to-speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Model identifier
    pub model: String,
    /// Text to speak
    pub text: String,
    /// Prebuilt voice name
    pub voice: String,
}

/// Text-to-speech result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeechResponse {
    /// Raw 16-bit mono PCM samples, without a container header
    pub pcm: Option<Vec<u8>>,
}
