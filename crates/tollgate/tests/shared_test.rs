//! Tests for the facade crate.

use std::sync::Arc;
use std::time::Duration;
use tollgate::{Clock, ManualClock, Policy, PolicyTable, ProviderThrottle};

#[test]
fn test_shared_throttle_is_a_single_instance() {
    let first = tollgate::shared().unwrap();
    let second = tollgate::shared().unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(first.policy("openai").is_some());
    assert!(first.policy("anthropic").is_some());
}

#[test]
fn test_shared_throttle_passes_unknown_providers() {
    let throttle = tollgate::shared().unwrap();
    throttle.throttle("not-a-provider", 1_000_000);
    assert!(throttle.usage("not-a-provider").is_none());
}

#[test]
fn test_reexports_drive_an_injected_throttle() {
    let clock = Arc::new(ManualClock::new());
    let mut policies = PolicyTable::new();
    policies.insert(
        "cohere".to_string(),
        Policy::per_minute(100)
            .with_requests_per_hour(6_000)
            .with_input_tokens_per_minute(30_000),
    );
    let throttle = ProviderThrottle::with_clock(policies, Arc::clone(&clock));

    throttle.throttle("cohere", 20_000);
    throttle.throttle("cohere", 20_000);
    assert_eq!(clock.now(), Duration::from_secs(60));
}

#[test]
fn test_init_tracing_only_once() {
    let first = tollgate::init_tracing();
    let second = tollgate::init_tracing();
    assert!(first.is_ok());
    assert!(second.is_err());
}
