//! Tollgate - per-provider request and token throttling
//!
//! Tollgate keeps a client that talks to several LLM providers under each
//! provider's rate limits: requests per minute, hour and day, and a combined
//! token budget per minute.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tollgate::{ProviderThrottle, ThrottleConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tollgate::init_tracing()?;
//!
//!     let mut config = ThrottleConfig::load()?;
//!     config.apply_env_overrides()?;
//!     let throttle = ProviderThrottle::from_config(&config)?;
//!
//!     // Blocks until one more 1200-token request fits Anthropic's limits.
//!     throttle.throttle("anthropic", 1_200);
//!     // ... issue the request ...
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `tollgate_error` - Error types
//! - `tollgate_throttle` - Policies, clocks, usage history and the throttle
//!
//! This crate re-exports both and adds tracing setup and an optional
//! process-wide throttle.

mod shared;
mod telemetry;

pub use shared::shared;
pub use telemetry::init_tracing;
pub use tollgate_error::*;
pub use tollgate_throttle::*;
