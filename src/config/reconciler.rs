//! # Reconciler Configuration
//!
//! Settings that shape the reconciliation protocol. All values have
//! documented defaults and can be overridden via environment variables.
//!
//! The deletion guard is an explicit field rather than an ambient process
//! read: a fleet of reconciliation runs injects it once at construction and
//! every synchronizer built from the config honors it.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CREATE_SETTLE_DELAY_SECS, DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_JITTER,
};

/// Protocol-level configuration for a synchronizer.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Deletion guard. When engaged, every key-version delete becomes a
    /// successful no-op: deleting a version is only valid while it is not
    /// the key's current version, which automated runs cannot guarantee.
    pub suppress_version_deletion: bool,
    /// Pause between a successful create and the first read. The service
    /// acknowledges creation before the new version is queryable.
    pub create_settle_delay: Duration,
    /// Base interval between lifecycle polls.
    pub poll_interval: Duration,
    /// Fractional jitter applied to each poll interval (0.2 = ±20%).
    pub poll_jitter: f64,
    /// Deadline for the create-and-enable wait.
    pub create_timeout: Duration,
    /// Deadline for the teardown wait.
    pub delete_timeout: Duration,
    /// Ask the transport not to retry `NotFound` responses.
    pub disable_not_found_retries: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            suppress_version_deletion: false,
            create_settle_delay: Duration::from_secs(DEFAULT_CREATE_SETTLE_DELAY_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_jitter: DEFAULT_POLL_JITTER,
            create_timeout: Duration::from_secs(DEFAULT_CREATE_TIMEOUT_SECS),
            delete_timeout: Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS),
            disable_not_found_retries: false,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// An unset or unparsable variable falls back to its default; for the
    /// deletion guard that means "disengaged".
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            suppress_version_deletion: env_var_or_default_bool(
                "DISABLE_KMS_VERSION_DELETE",
                false,
            ),
            create_settle_delay: Duration::from_secs(env_var_or_default(
                "CREATE_SETTLE_DELAY_SECS",
                DEFAULT_CREATE_SETTLE_DELAY_SECS,
            )),
            poll_interval: Duration::from_secs(env_var_or_default(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            poll_jitter: env_var_or_default("POLL_JITTER", DEFAULT_POLL_JITTER),
            create_timeout: Duration::from_secs(env_var_or_default(
                "CREATE_TIMEOUT_SECS",
                DEFAULT_CREATE_TIMEOUT_SECS,
            )),
            delete_timeout: Duration::from_secs(env_var_or_default(
                "DELETE_TIMEOUT_SECS",
                DEFAULT_DELETE_TIMEOUT_SECS,
            )),
            disable_not_found_retries: env_var_or_default_bool("DISABLE_NOT_FOUND_RETRIES", false),
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}
