//! Pipeline and session error types.

/// Conditions raised by the pipeline driver and session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// A pipeline run is already in flight for this session
    #[display("A generation is already in progress")]
    Busy,
    /// No history item with this id exists
    #[display("Unknown history item: {}", _0)]
    UnknownItem(String),
    /// The status state machine rejected a transition
    #[display("Invalid status transition from {} to {}", from, to)]
    InvalidTransition {
        /// Status before the attempted transition
        from: String,
        /// Requested status
        to: String,
    },
    /// The planning response could not be read as an object plan
    #[display("Failed to plan object: {}", _0)]
    PlanParse(String),
}

/// Pipeline error with location tracking.
///
/// # Examples
///
/// ```
/// use explodeit_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::Busy);
/// assert!(err.to_string().contains("already in progress"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
