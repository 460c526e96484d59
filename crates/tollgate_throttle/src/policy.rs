//! Static per-provider limits.

use crate::Tier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tollgate_error::ConfigError;

/// Rate limits for one provider.
///
/// `None` leaves that tier unbounded. The two token fields form a single
/// combined per-minute budget.
///
/// # Example
///
/// ```toml
/// [providers.anthropic]
/// requests_per_minute = 50
/// input_tokens_per_minute = 40_000
/// output_tokens_per_minute = 8_000
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option)]
pub struct Policy {
    /// Requests per minute limit
    pub requests_per_minute: u32,

    /// Requests per hour limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,

    /// Requests per day limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,

    /// Input tokens per minute budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_per_minute: Option<u64>,

    /// Output tokens per minute budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens_per_minute: Option<u64>,
}

/// Policies keyed by provider name.
pub type PolicyTable = HashMap<String, Policy>;

impl Policy {
    /// A policy with only a per-minute request limit.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_throttle::Policy;
    ///
    /// let openai = Policy::per_minute(500)
    ///     .with_requests_per_hour(10_000)
    ///     .with_requests_per_day(150_000);
    /// assert_eq!(openai.requests_per_hour, Some(10_000));
    /// assert_eq!(openai.token_capacity(), 0);
    /// ```
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour: None,
            requests_per_day: None,
            input_tokens_per_minute: None,
            output_tokens_per_minute: None,
        }
    }

    /// Combined input and output token budget per minute, unset counting as 0.
    pub fn token_capacity(&self) -> u64 {
        self.input_tokens_per_minute
            .unwrap_or(0)
            .saturating_add(self.output_tokens_per_minute.unwrap_or(0))
    }

    /// Request limit for a request-counting tier.
    ///
    /// Returns `None` for the token tier, for unset tiers, and for a zero
    /// limit, which is treated as unbounded.
    pub fn request_limit(&self, tier: Tier) -> Option<u32> {
        let limit = match tier {
            Tier::MinuteRequests => Some(self.requests_per_minute),
            Tier::HourRequests => self.requests_per_hour,
            Tier::DayRequests => self.requests_per_day,
            Tier::MinuteTokens => None,
        };
        limit.filter(|&n| n > 0)
    }

    /// Check that every configured request limit is positive.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the provider and the offending field.
    pub fn validate(&self, provider: &str) -> Result<(), ConfigError> {
        if self.requests_per_minute == 0 {
            return Err(ConfigError::new(format!(
                "Provider '{}': requests_per_minute must be greater than 0",
                provider
            )));
        }
        if self.requests_per_hour == Some(0) {
            return Err(ConfigError::new(format!(
                "Provider '{}': requests_per_hour must be greater than 0 when set",
                provider
            )));
        }
        if self.requests_per_day == Some(0) {
            return Err(ConfigError::new(format!(
                "Provider '{}': requests_per_day must be greater than 0 when set",
                provider
            )));
        }
        Ok(())
    }
}
