//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, GeminiError, HttpError, JsonError, PipelineError, StorageError,
};

/// Every error condition an ExplodeIt operation can surface.
///
/// # Examples
///
/// ```
/// use explodeit_error::{ExplodeItError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: ExplodeItError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ExplodeItErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Local storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Gemini provider error
    #[from(GeminiError)]
    Gemini(GeminiError),
    /// Pipeline or session error
    #[from(PipelineError)]
    Pipeline(PipelineError),
}

/// ExplodeIt error with kind discrimination.
///
/// # Examples
///
/// ```
/// use explodeit_error::{ExplodeItResult, ConfigError};
///
/// fn might_fail() -> ExplodeItResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("ExplodeIt Error: {}", _0)]
pub struct ExplodeItError(Box<ExplodeItErrorKind>);

impl ExplodeItError {
    /// Create a new error from a kind.
    pub fn new(kind: ExplodeItErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ExplodeItErrorKind {
        &self.0
    }

    /// The error message without its source location.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_error::{ExplodeItError, GeminiError, GeminiErrorKind};
    ///
    /// let err: ExplodeItError = GeminiError::new(GeminiErrorKind::HttpError {
    ///     status_code: 503,
    ///     message: "overloaded".to_string(),
    /// })
    /// .into();
    /// assert_eq!(err.summary(), "HTTP 503 error: overloaded");
    /// ```
    pub fn summary(&self) -> String {
        match self.kind() {
            ExplodeItErrorKind::Http(e) => e.message.clone(),
            ExplodeItErrorKind::Json(e) => e.message.clone(),
            ExplodeItErrorKind::Config(e) => e.message.clone(),
            ExplodeItErrorKind::Builder(e) => e.message.clone(),
            ExplodeItErrorKind::Storage(e) => e.kind.to_string(),
            ExplodeItErrorKind::Gemini(e) => e.kind.to_string(),
            ExplodeItErrorKind::Pipeline(e) => e.kind.to_string(),
        }
    }

    /// The Gemini error kind, when this error came from the provider.
    pub fn gemini_kind(&self) -> Option<&crate::GeminiErrorKind> {
        match self.kind() {
            ExplodeItErrorKind::Gemini(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The pipeline error kind, when this error came from the driver.
    pub fn pipeline_kind(&self) -> Option<&crate::PipelineErrorKind> {
        match self.kind() {
            ExplodeItErrorKind::Pipeline(e) => Some(&e.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to ExplodeItErrorKind
impl<T> From<T> for ExplodeItError
where
    T: Into<ExplodeItErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for ExplodeIt operations.
pub type ExplodeItResult<T> = std::result::Result<T, ExplodeItError>;
