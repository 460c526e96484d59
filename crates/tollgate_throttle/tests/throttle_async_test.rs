//! Tests for the async throttle entry point.

use std::sync::Arc;
use std::time::Duration;
use tollgate_throttle::{Clock, MINUTE, ManualClock, Policy, PolicyTable, ProviderThrottle};

#[tokio::test]
async fn test_async_callers_share_the_provider_lock() {
    let clock = Arc::new(ManualClock::new());
    let mut policies = PolicyTable::new();
    policies.insert("openai".to_string(), Policy::per_minute(2));
    let throttle = Arc::new(ProviderThrottle::with_clock(policies, Arc::clone(&clock)));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let throttle = Arc::clone(&throttle);
            tokio::spawn(async move { throttle.throttle_async("openai", 0).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    throttle.throttle_request("openai");

    let history = throttle.history("openai").unwrap();
    let timestamps: Vec<Duration> = history.request_timestamps().iter().copied().collect();
    assert_eq!(
        timestamps,
        vec![Duration::ZERO, Duration::ZERO, MINUTE, MINUTE, MINUTE * 2]
    );
    assert_eq!(clock.now(), MINUTE * 2);
}

#[tokio::test]
async fn test_async_unknown_provider_is_ok() {
    let throttle = Arc::new(ProviderThrottle::with_clock(
        PolicyTable::new(),
        ManualClock::new(),
    ));
    throttle.throttle_async("nobody", 123).await.unwrap();
    assert_eq!(throttle.clock().now(), Duration::ZERO);
}
