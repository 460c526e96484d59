//! Error types for the Tollgate workspace.
//!
//! Throttling itself never fails. Errors only surface at the edges: loading
//! provider policies from configuration, and driving the throttle from an
//! async runtime.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{ConfigError, TollgateResult};
//!
//! fn load_limits() -> TollgateResult<u32> {
//!     Err(ConfigError::new("requests_per_minute must be positive"))?
//! }
//!
//! match load_limits() {
//!     Ok(rpm) => println!("rpm: {}", rpm),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod throttle;

pub use config::ConfigError;
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use throttle::{ThrottleError, ThrottleErrorKind};
