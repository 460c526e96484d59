//! Per-provider usage bookkeeping.

use crate::tier::{DAY, HOUR, MINUTE};
use derive_getters::Getters;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Tokens recorded for one admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct TokenSample {
    /// Admission time
    at: Duration,
    /// Token cost charged
    tokens: u64,
}

/// Recorded admissions for one provider, oldest first.
///
/// Both queues are appended in admission order, which is chronological, so
/// window queries use binary search over the time-ordered entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct UsageHistory {
    /// Admission times of every request within the last day
    request_timestamps: VecDeque<Duration>,
    /// Token costs within the last day, for requests that carried one
    token_samples: VecDeque<TokenSample>,
}

/// True when `at` falls inside the window `(now - window, now]`.
fn within(at: Duration, now: Duration, window: Duration) -> bool {
    now.checked_sub(window).is_none_or(|start| at > start)
}

impl UsageHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything recorded a day or more before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self, now: Duration) -> usize {
        let before = self.request_timestamps.len() + self.token_samples.len();

        while self
            .request_timestamps
            .front()
            .is_some_and(|&at| !within(at, now, DAY))
        {
            self.request_timestamps.pop_front();
        }
        while self
            .token_samples
            .front()
            .is_some_and(|sample| !within(sample.at, now, DAY))
        {
            self.token_samples.pop_front();
        }

        before - (self.request_timestamps.len() + self.token_samples.len())
    }

    /// Append an admitted request, and its token cost when non-zero.
    pub fn record(&mut self, at: Duration, tokens: u64) {
        self.request_timestamps.push_back(at);
        if tokens > 0 {
            self.token_samples.push_back(TokenSample { at, tokens });
        }
    }

    /// Number of requests admitted inside the window ending at `now`.
    pub fn requests_within(&self, now: Duration, window: Duration) -> usize {
        let outside = self
            .request_timestamps
            .partition_point(|&at| !within(at, now, window));
        self.request_timestamps.len() - outside
    }

    /// Admission time of the `n`-th most recent request, counting from 1.
    pub fn nth_latest_request(&self, n: usize) -> Option<Duration> {
        let len = self.request_timestamps.len();
        if n == 0 || n > len {
            return None;
        }
        self.request_timestamps.get(len - n).copied()
    }

    /// Sum of token costs inside the window ending at `now`.
    pub fn tokens_within(&self, now: Duration, window: Duration) -> u64 {
        self.samples_within(now, window)
            .map(|sample| sample.tokens)
            .fold(0u64, u64::saturating_add)
    }

    /// Time of the oldest token sample inside the window ending at `now`.
    pub fn oldest_sample_within(&self, now: Duration, window: Duration) -> Option<Duration> {
        self.samples_within(now, window)
            .next()
            .map(|sample| sample.at)
    }

    fn samples_within(
        &self,
        now: Duration,
        window: Duration,
    ) -> impl Iterator<Item = &TokenSample> {
        let outside = self
            .token_samples
            .partition_point(|sample| !within(sample.at, now, window));
        self.token_samples.range(outside..)
    }

    /// True when nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.request_timestamps.is_empty() && self.token_samples.is_empty()
    }

    /// Usage counts for every tier as of `now`.
    pub fn snapshot(&self, now: Duration) -> UsageSnapshot {
        UsageSnapshot {
            requests_last_minute: self.requests_within(now, MINUTE),
            requests_last_hour: self.requests_within(now, HOUR),
            requests_last_day: self.requests_within(now, DAY),
            tokens_last_minute: self.tokens_within(now, MINUTE),
        }
    }
}

/// Point-in-time usage for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Getters)]
pub struct UsageSnapshot {
    /// Requests admitted within the last minute
    requests_last_minute: usize,
    /// Requests admitted within the last hour
    requests_last_hour: usize,
    /// Requests admitted within the last day
    requests_last_day: usize,
    /// Tokens charged within the last minute
    tokens_last_minute: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn windows_exclude_their_start() {
        let mut history = UsageHistory::new();
        history.record(secs(100), 10);
        history.record(secs(130), 0);
        history.record(secs(160), 5);

        // Window is (100, 160]: the entry at exactly 100 is out.
        assert_eq!(history.requests_within(secs(160), MINUTE), 2);
        assert_eq!(history.tokens_within(secs(160), MINUTE), 5);
        assert_eq!(history.oldest_sample_within(secs(160), MINUTE), Some(secs(160)));
        assert_eq!(history.requests_within(secs(159), MINUTE), 3);
    }

    #[test]
    fn windows_before_clock_origin_cover_everything() {
        let mut history = UsageHistory::new();
        history.record(Duration::ZERO, 7);
        history.record(secs(1), 3);
        assert_eq!(history.requests_within(secs(1), HOUR), 2);
        assert_eq!(history.tokens_within(secs(1), MINUTE), 10);
        assert_eq!(history.oldest_sample_within(secs(1), MINUTE), Some(Duration::ZERO));
    }

    #[test]
    fn prune_drops_entries_a_day_old() {
        let mut history = UsageHistory::new();
        history.record(secs(10), 100);
        history.record(secs(20), 0);
        history.record(secs(30), 50);

        assert_eq!(history.prune(DAY + secs(20)), 3);
        assert_eq!(history.request_timestamps().len(), 1);
        assert_eq!(history.token_samples().len(), 1);

        assert_eq!(history.prune(DAY + secs(31)), 2);
        assert!(history.is_empty());
    }

    #[test]
    fn nth_latest_counts_from_the_tail() {
        let mut history = UsageHistory::new();
        for at in [1, 2, 3, 4] {
            history.record(secs(at), 0);
        }
        assert_eq!(history.nth_latest_request(1), Some(secs(4)));
        assert_eq!(history.nth_latest_request(4), Some(secs(1)));
        assert_eq!(history.nth_latest_request(5), None);
        assert_eq!(history.nth_latest_request(0), None);
        assert!(history.token_samples().is_empty());
    }

    #[test]
    fn snapshot_reports_every_window() {
        let mut history = UsageHistory::new();
        history.record(secs(0), 0);
        history.record(HOUR, 0);
        history.record(HOUR + secs(50), 25);

        let usage = history.snapshot(HOUR + secs(55));
        assert_eq!(*usage.requests_last_minute(), 2);
        assert_eq!(*usage.requests_last_hour(), 2);
        assert_eq!(*usage.requests_last_day(), 3);
        assert_eq!(*usage.tokens_last_minute(), 25);
    }
}
