//! The generation backend trait.

use crate::{
    GroundedResponse, ImageRequest, ImageResponse, SpeechRequest, SpeechResponse, TextRequest,
    TextResponse, VideoOperation, VideoRequest,
};
use async_trait::async_trait;
use explodeit_error::ExplodeItResult;

/// Outbound calls the pipeline makes to a generative provider.
///
/// Responses report what came back without judging it: a missing payload is
/// `None`, and deciding whether that is an error is up to the caller.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Text generation, optionally constrained to a JSON schema.
    async fn generate_text(&self, req: &TextRequest) -> ExplodeItResult<TextResponse>;

    /// Text generation with web search grounding.
    ///
    /// Citations pointing back at the provider's own domains are already
    /// filtered out of the response.
    async fn generate_grounded(&self, req: &TextRequest) -> ExplodeItResult<GroundedResponse>;

    /// Image generation, optionally conditioned on an input image.
    async fn generate_image(&self, req: &ImageRequest) -> ExplodeItResult<ImageResponse>;

    /// Submit a long-running video job.
    async fn start_video(&self, req: &VideoRequest) -> ExplodeItResult<VideoOperation>;

    /// Fetch the current state of a video job.
    async fn poll_video(&self, operation: &VideoOperation) -> ExplodeItResult<VideoOperation>;

    /// Download a finished video from its result URI.
    async fn download_video(&self, uri: &str) -> ExplodeItResult<Vec<u8>>;

    /// Text-to-speech returning raw PCM samples.
    async fn synthesize_speech(&self, req: &SpeechRequest) -> ExplodeItResult<SpeechResponse>;

    /// Provider name, for logs and metrics.
    fn provider_name(&self) -> &'static str;
}
