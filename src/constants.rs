//! # Constants
//!
//! Shared defaults used throughout the reconciler.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default pause between a successful create and the first read (seconds).
/// The service acknowledges creation before the new version is queryable.
pub const DEFAULT_CREATE_SETTLE_DELAY_SECS: u64 = 30;

/// Default base interval between lifecycle polls (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default fractional jitter applied to each poll interval (0.2 = ±20%)
pub const DEFAULT_POLL_JITTER: f64 = 0.2;

/// Default deadline for the create-and-enable wait (seconds)
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 900;

/// Default deadline for the teardown wait (seconds)
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 900;
