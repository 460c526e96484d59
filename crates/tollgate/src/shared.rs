//! Optional process-wide throttle.

use std::sync::OnceLock;
use tollgate_error::TollgateResult;
use tollgate_throttle::{ProviderThrottle, ThrottleConfig};
use tracing::{debug, instrument};

static SHARED: OnceLock<ProviderThrottle> = OnceLock::new();

/// The process-wide throttle, built on first use.
///
/// Policies come from [`ThrottleConfig::load`] followed by
/// [`ThrottleConfig::apply_env_overrides`]. The instance lives until the
/// process exits. Applications that manage their own configuration should
/// build and pass a [`ProviderThrottle`] instead.
///
/// If two threads race on the first call, both load the configuration and
/// one result is kept. Neither has recorded any usage at that point.
///
/// # Errors
///
/// Returns a configuration error if loading or validating the configuration
/// fails. A failed call leaves nothing cached, so a later call retries.
#[instrument]
pub fn shared() -> TollgateResult<&'static ProviderThrottle> {
    if let Some(throttle) = SHARED.get() {
        return Ok(throttle);
    }

    let mut config = ThrottleConfig::load()?;
    config.apply_env_overrides()?;
    let throttle = ProviderThrottle::from_config(&config)?;
    debug!("Initialized shared provider throttle");

    Ok(SHARED.get_or_init(|| throttle))
}
