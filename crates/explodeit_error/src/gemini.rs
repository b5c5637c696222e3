//! Gemini provider error types.

/// Gemini-specific error conditions.
///
/// Display strings matter here: the pipeline driver classifies failures by
/// message, so `MissingApiKey` must mention "API key" and `HttpError` must
/// carry the numeric status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GeminiErrorKind {
    /// No credential has been configured
    #[display("API key not configured. Please set your API key.")]
    MissingApiKey,
    /// Request could not be sent or its body could not be read
    #[display("Gemini API request failed: {}", _0)]
    ApiRequest(String),
    /// Non-success HTTP status with the response body as message
    #[display("HTTP {} error: {}", status_code, message)]
    HttpError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Response parsed but the expected field was absent
    #[display("Missing payload: {}", _0)]
    MissingPayload(String),
    /// Response body did not match the expected wire shape
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
    /// Base64 decoding failed
    #[display("Base64 decode error: {}", _0)]
    Base64Decode(String),
    /// Speech samples could not be packed into an audio container
    #[display("Audio encoding failed: {}", _0)]
    AudioEncode(String),
    /// Long-running video job finished with an error
    #[display("Video generation failed: {}", _0)]
    VideoJobFailed(String),
    /// Long-running video job never finished within the poll budget
    #[display("Video generation timed out after {} polls", polls)]
    VideoTimeout {
        /// Number of status polls performed
        polls: u32,
    },
}

impl GeminiErrorKind {
    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GeminiErrorKind::HttpError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Gemini error with source location tracking.
///
/// # Examples
///
/// ```
/// use explodeit_error::{GeminiError, GeminiErrorKind};
///
/// let err = GeminiError::new(GeminiErrorKind::MissingApiKey);
/// assert!(format!("{}", err).contains("API key"));
///
/// let err = GeminiError::new(GeminiErrorKind::HttpError {
///     status_code: 403,
///     message: "PERMISSION_DENIED".to_string(),
/// });
/// assert!(err.to_string().contains("HTTP 403"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gemini Error: {} at line {} in {}", kind, line, file)]
pub struct GeminiError {
    /// The kind of error that occurred
    pub kind: GeminiErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GeminiError {
    /// Create a new GeminiError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GeminiErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
