//! Limit dimensions a provider policy can bound.

use std::time::Duration;

/// One configured limit dimension.
///
/// Tiers are evaluated in declaration order; the first one that requires a
/// delay decides how long the caller waits.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    /// Requests within the last minute.
    MinuteRequests,
    /// Tokens within the last minute.
    MinuteTokens,
    /// Requests within the last hour.
    HourRequests,
    /// Requests within the last day.
    DayRequests,
}

impl Tier {
    /// Length of the sliding window this tier counts over.
    pub const fn window(self) -> Duration {
        match self {
            Tier::MinuteRequests | Tier::MinuteTokens => MINUTE,
            Tier::HourRequests => HOUR,
            Tier::DayRequests => DAY,
        }
    }
}

/// One minute.
pub const MINUTE: Duration = Duration::from_secs(60);
/// One hour.
pub const HOUR: Duration = Duration::from_secs(60 * 60);
/// One day, the longest window any tier uses.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tiers_iterate_in_priority_order() {
        let order: Vec<Tier> = Tier::iter().collect();
        assert_eq!(
            order,
            vec![
                Tier::MinuteRequests,
                Tier::MinuteTokens,
                Tier::HourRequests,
                Tier::DayRequests,
            ]
        );
    }

    #[test]
    fn no_window_exceeds_a_day() {
        assert!(Tier::iter().all(|tier| tier.window() <= DAY));
        assert_eq!(Tier::HourRequests.to_string(), "hour_requests");
    }
}
