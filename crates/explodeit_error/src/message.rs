//! Message-only error types.
//!
//! These wrap a single human-readable message plus the location where the
//! error was raised. They cover failures whose detail is already a string
//! by the time it reaches us (transport errors, serde messages, config
//! loader messages).

macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
        #[display("{}: {} at line {} in {}", $label, message, line, file)]
        pub struct $name {
            /// The underlying error message
            pub message: String,
            /// Line number where the error occurred
            pub line: u32,
            /// File where the error occurred
            pub file: &'static str,
        }

        impl $name {
            /// Create a new error with the given message at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }
    };
}

message_error!(
    /// HTTP transport error (connection refused, body read failure, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_error::HttpError;
    ///
    /// let err = HttpError::new("Connection refused");
    /// assert!(err.message.contains("Connection refused"));
    /// assert!(err.to_string().starts_with("HTTP Error"));
    /// ```
    HttpError,
    "HTTP Error"
);

message_error!(
    /// JSON serialization/deserialization error.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_error::JsonError;
    ///
    /// let err = JsonError::new("expected value at line 1 column 1");
    /// assert!(err.to_string().contains("expected value"));
    /// ```
    JsonError,
    "JSON Error"
);

message_error!(
    /// Configuration loading or validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use explodeit_error::ConfigError;
    ///
    /// let err = ConfigError::new("enrichment_batch_size must be at least 1");
    /// assert!(err.to_string().starts_with("Configuration Error"));
    /// ```
    ConfigError,
    "Configuration Error"
);

message_error!(
    /// Request builder validation error.
    ///
    /// Generated builders report missing fields through their own error
    /// types; callers convert those with `BuilderError::new(e.to_string())`.
    BuilderError,
    "Builder Error"
);

impl From<String> for BuilderError {
    #[track_caller]
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BuilderError {
    #[track_caller]
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
