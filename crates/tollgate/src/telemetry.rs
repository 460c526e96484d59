//! Tracing setup for applications embedding the throttle.

use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a console subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info,tollgate=debug` when `RUST_LOG` is unset. Delayed
/// requests are logged at `info`, admissions at `debug` and pruning at
/// `trace`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tollgate=debug,tollgate_throttle=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    info!("Tracing initialized");
    Ok(())
}
