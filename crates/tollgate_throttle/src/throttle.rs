//! The provider throttle.
//!
//! [`ProviderThrottle`] holds one immutable [`Policy`] and one mutex-guarded
//! [`UsageHistory`] per provider. A caller invokes [`ProviderThrottle::throttle`]
//! right before each outbound request; the call sleeps for as long as the
//! first saturated tier of the provider requires, then records the request.

use crate::tier::MINUTE;
use crate::{
    Clock, Policy, PolicyTable, SystemClock, ThrottleConfig, Tier, UsageHistory, UsageSnapshot,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tollgate_error::{ThrottleError, ThrottleErrorKind, TollgateResult};
use tracing::{debug, info, instrument, trace, warn};

/// A delay imposed by one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    /// The tier that is saturated
    pub tier: Tier,
    /// How long until it admits another request
    pub wait: Duration,
}

/// Compute the delay a request costing `token_cost` tokens needs at `now`.
///
/// Tiers are checked in the order minute requests, minute tokens, hour
/// requests, day requests. The first saturated tier is returned and later
/// tiers are not consulted, so a second saturated tier only delays the
/// following call. A zero `token_cost` skips the token tier.
pub fn required_wait(
    policy: &Policy,
    history: &UsageHistory,
    now: Duration,
    token_cost: u64,
) -> Option<Delay> {
    request_wait(policy, history, now, Tier::MinuteRequests)
        .or_else(|| token_wait(policy, history, now, token_cost))
        .or_else(|| request_wait(policy, history, now, Tier::HourRequests))
        .or_else(|| request_wait(policy, history, now, Tier::DayRequests))
}

fn request_wait(
    policy: &Policy,
    history: &UsageHistory,
    now: Duration,
    tier: Tier,
) -> Option<Delay> {
    let limit = policy.request_limit(tier)? as usize;
    let window = tier.window();
    if history.requests_within(now, window) < limit {
        return None;
    }

    // The request `limit` places from the end is the first to leave the
    // window and free a slot.
    let oldest = history.nth_latest_request(limit)?;
    Some(Delay {
        tier,
        wait: window.saturating_sub(now.saturating_sub(oldest)),
    })
}

fn token_wait(
    policy: &Policy,
    history: &UsageHistory,
    now: Duration,
    token_cost: u64,
) -> Option<Delay> {
    let capacity = policy.token_capacity();
    if token_cost == 0 || capacity == 0 {
        return None;
    }

    let window = Tier::MinuteTokens.window();
    let used = history.tokens_within(now, window);
    if used.saturating_add(token_cost) <= capacity {
        return None;
    }

    let wait = match history.oldest_sample_within(now, window) {
        Some(oldest) => window.saturating_sub(now.saturating_sub(oldest)),
        None => window,
    };
    Some(Delay {
        tier: Tier::MinuteTokens,
        wait,
    })
}

/// Per-provider, multi-tier request and token throttle.
///
/// Policies are fixed at construction. Each configured provider gets its own
/// lock, held for the whole check, sleep and record sequence, so concurrent
/// callers for one provider are admitted one at a time while callers for
/// different providers never contend. Providers without a policy pass
/// straight through and leave no trace.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tollgate_throttle::{Clock, ManualClock, Policy, PolicyTable, ProviderThrottle};
///
/// let clock = Arc::new(ManualClock::new());
/// let mut policies = PolicyTable::new();
/// policies.insert("anthropic".to_string(), Policy::per_minute(2));
/// let throttle = ProviderThrottle::with_clock(policies, Arc::clone(&clock));
///
/// throttle.throttle_request("anthropic");
/// throttle.throttle_request("anthropic");
/// assert_eq!(clock.now(), Duration::ZERO);
///
/// // Third request in the same minute waits for the first to age out.
/// throttle.throttle_request("anthropic");
/// assert_eq!(clock.now(), Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct ProviderThrottle<C: Clock = SystemClock> {
    policies: PolicyTable,
    histories: HashMap<String, Mutex<UsageHistory>>,
    clock: C,
}

impl ProviderThrottle<SystemClock> {
    /// Create a throttle on the system clock.
    pub fn new(policies: PolicyTable) -> Self {
        Self::with_clock(policies, SystemClock::new())
    }

    /// Create a throttle from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any provider policy is invalid.
    #[instrument(skip(config), fields(providers = config.providers.len()))]
    pub fn from_config(config: &ThrottleConfig) -> TollgateResult<Self> {
        config.validate()?;
        Ok(Self::new(config.providers.clone()))
    }
}

impl<C: Clock> ProviderThrottle<C> {
    /// Create a throttle driven by `clock`.
    ///
    /// Zero request limits are treated as unbounded; use
    /// [`ThrottleConfig::validate`] to reject them up front.
    pub fn with_clock(policies: PolicyTable, clock: C) -> Self {
        let histories = policies
            .keys()
            .map(|provider| (provider.clone(), Mutex::new(UsageHistory::new())))
            .collect();
        debug!(providers = policies.len(), "Creating provider throttle");
        Self {
            policies,
            histories,
            clock,
        }
    }

    /// Block until a request of `token_cost` tokens fits every limit of
    /// `provider`, then record it.
    ///
    /// Admission is decided from a single reading of the clock. A delayed
    /// request is recorded when its sleep returns: the later of the planned
    /// wake-up and the clock after waking, so a sleep that overshoots never
    /// backdates the request and frees its slot early.
    #[instrument(skip(self))]
    pub fn throttle(&self, provider: &str, token_cost: u64) {
        let (Some(policy), Some(history)) =
            (self.policies.get(provider), self.histories.get(provider))
        else {
            trace!("No policy for provider, passing through");
            return;
        };

        let mut history = lock_history(history, provider);
        let now = self.clock.now();
        let pruned = history.prune(now);
        if pruned > 0 {
            trace!(pruned, "Pruned expired usage");
        }

        let admitted_at = match required_wait(policy, &history, now, token_cost) {
            Some(delay) => {
                info!(
                    tier = %delay.tier,
                    wait = ?delay.wait,
                    "Provider limit reached, delaying request"
                );
                self.clock.sleep(delay.wait);
                self.clock.now().max(now + delay.wait)
            }
            None => now,
        };

        history.record(admitted_at, token_cost);
        debug!(
            requests_last_minute = history.requests_within(admitted_at, MINUTE),
            "Request admitted"
        );
    }

    /// Throttle a request that carries no token cost.
    pub fn throttle_request(&self, provider: &str) {
        self.throttle(provider, 0);
    }

    /// How long a request of `token_cost` tokens would wait right now.
    ///
    /// Nothing is recorded. Returns zero for unknown providers.
    #[instrument(skip(self))]
    pub fn wait_time(&self, provider: &str, token_cost: u64) -> Duration {
        let (Some(policy), Some(history)) =
            (self.policies.get(provider), self.histories.get(provider))
        else {
            return Duration::ZERO;
        };

        let mut history = lock_history(history, provider);
        let now = self.clock.now();
        history.prune(now);
        required_wait(policy, &history, now, token_cost)
            .map(|delay| delay.wait)
            .unwrap_or(Duration::ZERO)
    }

    /// Current usage counts for `provider`, or `None` if it has no policy.
    pub fn usage(&self, provider: &str) -> Option<UsageSnapshot> {
        let history = self.histories.get(provider)?;
        let mut history = lock_history(history, provider);
        let now = self.clock.now();
        history.prune(now);
        Some(history.snapshot(now))
    }

    /// A copy of the recorded history for `provider`, or `None` if it has no
    /// policy.
    pub fn history(&self, provider: &str) -> Option<UsageHistory> {
        let history = self.histories.get(provider)?;
        Some(lock_history(history, provider).clone())
    }

    /// Policy configured for `provider`.
    pub fn policy(&self, provider: &str) -> Option<&Policy> {
        self.policies.get(provider)
    }

    /// Names of every configured provider.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// The clock driving this throttle.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock + 'static> ProviderThrottle<C> {
    /// Async form of [`ProviderThrottle::throttle`] for Tokio callers.
    ///
    /// The wait runs on the blocking thread pool and shares the provider's
    /// lock with synchronous callers.
    ///
    /// # Errors
    ///
    /// Returns a throttle error if the blocking task panics or is cancelled.
    #[instrument(skip(self))]
    pub async fn throttle_async(
        self: &Arc<Self>,
        provider: &str,
        token_cost: u64,
    ) -> TollgateResult<()> {
        let throttle = Arc::clone(self);
        let key = provider.to_string();
        tokio::task::spawn_blocking(move || throttle.throttle(&key, token_cost))
            .await
            .map_err(|e| {
                ThrottleError::new(ThrottleErrorKind::Join {
                    provider: provider.to_string(),
                    reason: e.to_string(),
                })
            })?;
        Ok(())
    }
}

fn lock_history<'a>(
    history: &'a Mutex<UsageHistory>,
    provider: &str,
) -> MutexGuard<'a, UsageHistory> {
    history.lock().unwrap_or_else(|poisoned| {
        warn!(provider, "Usage history lock was poisoned, recovering");
        PoisonError::into_inner(poisoned)
    })
}
