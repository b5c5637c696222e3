//! Backend trait for the ExplodeIt pipeline.
//!
//! The pipeline talks to the generative provider only through
//! [`GenerationBackend`]. Each method is one outbound network call; retries,
//! usage accounting and prompt construction live above this layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::GenerationBackend;
pub use types::{
    GroundedResponse, ImageRequest, ImageRequestBuilder, ImageResponse, SpeechRequest,
    SpeechResponse, TextRequest, TextRequestBuilder, TextResponse, UsageCounts, VideoOperation,
    VideoRequest, VideoRequestBuilder,
};
