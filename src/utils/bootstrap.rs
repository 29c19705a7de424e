//! Bootstrap utilities for host applications.
//!
//! Shared initialization code for binaries and services embedding the crate.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the POSITIONAL_LOG environment variable.
///
/// Defaults to "info" level if POSITIONAL_LOG is not set. Calling it twice
/// panics inside `tracing_subscriber`, so hosts call it once at startup.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Retry policy for [`connect_with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Connect to a database with exponential backoff retry.
///
/// # Arguments
/// * `backend` - Human-readable name for logging (e.g., "postgres")
/// * `address` - The address being connected to, for logging
/// * `policy` - Attempt limit and backoff bounds
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error after `policy.max_attempts`.
pub async fn connect_with_retry<T, E, F, Fut>(
    backend: &str,
    address: &str,
    policy: RetryPolicy,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connect().await {
            Ok(conn) => {
                tracing::info!(backend, address, attempt, "Connected");
                return Ok(conn);
            }
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    backend,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    retry_in = ?delay,
                    "Connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
            Err(e) => {
                tracing::error!(
                    backend,
                    attempts = policy.max_attempts,
                    error = %e,
                    "Giving up on connection"
                );
                return Err(e);
            }
        }
    }
}
