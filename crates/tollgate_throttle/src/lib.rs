//! Per-provider request and token throttling.
//!
//! This crate keeps LLM API clients under each provider's published rate
//! limits. Every provider gets a [`Policy`] with up to four tiers:
//! - requests per minute (always set)
//! - input plus output tokens per minute
//! - requests per hour
//! - requests per day
//!
//! Call [`ProviderThrottle::throttle`] right before each outbound request.
//! It blocks only as long as the provider's limits require and then records
//! the request against the provider's sliding windows. State lives in memory
//! for the life of the throttle.
//!
//! Policies usually come from [`ThrottleConfig`], which layers bundled
//! defaults, user TOML files and environment overrides.

mod clock;
mod config;
mod history;
mod policy;
mod throttle;
mod tier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ThrottleConfig;
pub use history::{TokenSample, UsageHistory, UsageSnapshot};
pub use policy::{Policy, PolicyTable};
pub use throttle::{Delay, ProviderThrottle, required_wait};
pub use tier::{DAY, HOUR, MINUTE, Tier};
