//! Terminal failure classification.

use explodeit_error::{ExplodeItError, GeminiErrorKind};
use serde::{Deserialize, Serialize};

/// Message shown when a run fails on credentials.
pub const AUTH_FAILURE_MESSAGE: &str = "Invalid API Key. Please check your key and try again.";

/// Message shown when the random topic call fails for any other reason.
pub const SURPRISE_FAILURE_MESSAGE: &str = "Failed to dream up an object. Please try again.";

const AUTH_MARKERS: [&str; 3] = ["401", "403", "API key"];

/// How a failed run is presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Failure {
    /// The credential was missing or rejected; the user must enter a key
    #[display("{}", message)]
    CredentialRequired {
        /// Message to show alongside the key prompt
        message: String,
    },
    /// Any other failure
    #[display("{}", message)]
    Generic {
        /// Error message
        message: String,
    },
}

impl Failure {
    /// Classify a pipeline error.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_error::{ExplodeItError, GeminiError, GeminiErrorKind, HttpError};
    /// use explodeit_pipeline::Failure;
    ///
    /// let denied: ExplodeItError = GeminiError::new(GeminiErrorKind::HttpError {
    ///     status_code: 403,
    ///     message: "PERMISSION_DENIED".to_string(),
    /// })
    /// .into();
    /// assert!(Failure::classify(&denied).is_credential_required());
    ///
    /// let reset: ExplodeItError = HttpError::new("connection reset").into();
    /// assert_eq!(Failure::classify(&reset).to_string(), "connection reset");
    /// ```
    pub fn classify(err: &ExplodeItError) -> Self {
        if is_auth_error(err) {
            Self::CredentialRequired {
                message: AUTH_FAILURE_MESSAGE.to_string(),
            }
        } else {
            Self::Generic {
                message: err.summary(),
            }
        }
    }

    /// Classify a failure of the random topic call, which has its own
    /// generic message.
    pub fn classify_surprise(err: &ExplodeItError) -> Self {
        match Self::classify(err) {
            Self::Generic { .. } => Self::Generic {
                message: SURPRISE_FAILURE_MESSAGE.to_string(),
            },
            auth => auth,
        }
    }

    /// Failure for a submission made with no credential configured.
    pub fn missing_credential() -> Self {
        Self::CredentialRequired {
            message: GeminiErrorKind::MissingApiKey.to_string(),
        }
    }

    /// Whether the user must re-enter a credential.
    pub fn is_credential_required(&self) -> bool {
        matches!(self, Self::CredentialRequired { .. })
    }
}

/// Whether `err` reads as an authentication failure: a 401 or 403 status, or
/// a message mentioning the API key.
///
/// The message is matched without its source location, so line numbers
/// never look like status codes.
pub fn is_auth_error(err: &ExplodeItError) -> bool {
    if let Some(kind) = err.gemini_kind() {
        if matches!(kind, GeminiErrorKind::MissingApiKey)
            || matches!(kind.status_code(), Some(401 | 403))
        {
            return true;
        }
    }
    let message = err.summary();
    AUTH_MARKERS.iter().any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use explodeit_error::{GeminiError, HttpError, PipelineError, PipelineErrorKind};

    fn gemini(kind: GeminiErrorKind) -> ExplodeItError {
        GeminiError::new(kind).into()
    }

    #[test]
    fn status_codes_and_key_messages_are_auth() {
        assert!(is_auth_error(&gemini(GeminiErrorKind::HttpError {
            status_code: 401,
            message: "UNAUTHENTICATED".into()
        })));
        assert!(is_auth_error(&gemini(GeminiErrorKind::MissingApiKey)));
        assert!(is_auth_error(&gemini(GeminiErrorKind::HttpError {
            status_code: 400,
            message: "API key not valid. Please pass a valid API key.".into()
        })));
        assert!(is_auth_error(&HttpError::new("proxy said 403").into()));
    }

    #[test]
    fn other_errors_are_generic() {
        let err: ExplodeItError = gemini(GeminiErrorKind::HttpError {
            status_code: 500,
            message: "internal".into(),
        });
        assert!(!is_auth_error(&err));
        let err: ExplodeItError =
            PipelineError::new(PipelineErrorKind::PlanParse("eof".into())).into();
        assert_eq!(
            Failure::classify(&err),
            Failure::Generic {
                message: "Failed to plan object: eof".into()
            }
        );
    }

    #[test]
    fn surprise_failures_use_their_own_message() {
        let err = gemini(GeminiErrorKind::ApiRequest("timeout".into()));
        assert_eq!(
            Failure::classify_surprise(&err).to_string(),
            SURPRISE_FAILURE_MESSAGE
        );
        let auth = gemini(GeminiErrorKind::MissingApiKey);
        assert!(Failure::classify_surprise(&auth).is_credential_required());
    }
}
