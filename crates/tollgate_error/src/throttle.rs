//! Error types for driving the throttle.

/// Error kinds for throttle operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ThrottleErrorKind {
    /// The blocking task running the throttle did not complete.
    #[display("Throttle task failed for provider '{}': {}", provider, reason)]
    Join {
        /// Provider key the task was throttling
        provider: String,
        /// Reason reported by the runtime
        reason: String,
    },
}

/// Throttle error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Throttle Error: {} at line {} in {}", kind, line, file)]
pub struct ThrottleError {
    /// The error kind
    pub kind: ThrottleErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl ThrottleError {
    /// Create a new ThrottleError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ThrottleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ThrottleErrorKind {
        &self.kind
    }
}
