//! Errors from reading or validating provider policies.

/// A provider policy could not be loaded or is invalid.
///
/// Raised for unreadable policy files, malformed TOML, environment overrides
/// that are not numbers, and limits that must be positive but are zero.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Policy configuration error: {} ({}:{})", message, file, line)]
pub struct ConfigError {
    /// What is wrong, naming the provider or variable involved
    pub message: String,
    /// Line that raised the error
    pub line: u32,
    /// Source file that raised the error
    pub file: &'static str,
}

impl ConfigError {
    /// Record a policy problem at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate_error::ConfigError;
    ///
    /// let err = ConfigError::new("OPENAI_REQUESTS_PER_MINUTE is not a number");
    /// assert!(err.message.contains("not a number"));
    /// assert!(err.to_string().starts_with("Policy configuration error"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: caller.line(),
            file: caller.file(),
        }
    }
}
