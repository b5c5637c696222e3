//! Inline binary payloads and the data-URL form the session exposes them in.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use explodeit_error::{GeminiError, GeminiErrorKind};

/// MIME type of generated images.
pub const MIME_PNG: &str = "image/png";
/// MIME type of generated videos.
pub const MIME_MP4: &str = "video/mp4";
/// MIME type of wrapped narration audio.
pub const MIME_WAV: &str = "audio/wav";

/// Binary payload tagged with its MIME type.
///
/// Stages hand assets to each other in this form; the session stores them
/// as data URLs.
///
/// # Examples
///
/// ```
/// use explodeit_core::{InlineData, MIME_PNG};
///
/// let png = InlineData::new(MIME_PNG, vec![0x89, b'P', b'N', b'G']);
/// let url = png.to_data_url();
/// assert!(url.starts_with("data:image/png;base64,"));
///
/// let back = InlineData::from_data_url(&url).unwrap();
/// assert_eq!(back, png);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    /// MIME type of the payload
    pub mime_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl InlineData {
    /// Wrap raw bytes.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode a base64 payload as delivered inline by the provider.
    #[track_caller]
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, GeminiError> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GeminiError::new(GeminiErrorKind::Base64Decode(e.to_string())))?;
        Ok(Self::new(mime_type, data))
    }

    /// Base64 text of the payload, without any prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:<mime>;base64,<payload>` form.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Parse a `data:<mime>;base64,` URL back into bytes.
    ///
    /// A bare base64 string without the prefix is accepted and assumed to be PNG.
    #[track_caller]
    pub fn from_data_url(url: &str) -> Result<Self, GeminiError> {
        match url.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
            Some((mime, payload)) => Self::from_base64(mime, payload),
            None => Self::from_base64(MIME_PNG, url),
        }
    }
}
