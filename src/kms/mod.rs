//! # Key Management Service Contract
//!
//! The remote service behind the synchronizer, reduced to the operations the
//! key-version resource needs. Transport, authentication and request signing
//! live in the concrete client; this module only names the calls and the
//! retry policy the synchronizer requests per call kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SyncError;

pub mod types;

pub use types::{KeyVersion, LifecycleState};

/// Whether a call mutates remote state.
///
/// Reads are always safe to retry; mutating calls are retried only where the
/// transport can prove idempotency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Read,
    Mutating,
}

/// Retry policy requested for a single remote call.
///
/// The policy is advisory: the concrete client owns the retry loop. This
/// crate only states the call kind and whether `NotFound` responses should be
/// retried — they should not be while a caller is waiting for a deletion to
/// finish, where absence is an expected terminal answer.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub kind: CallKind,
    pub retry_not_found: bool,
}

impl RetryPolicy {
    /// Policy for snapshot reads.
    #[must_use]
    pub fn read(disable_not_found_retries: bool) -> Self {
        Self {
            kind: CallKind::Read,
            retry_not_found: !disable_not_found_retries,
        }
    }

    /// Policy for state-changing calls.
    #[must_use]
    pub fn mutating(disable_not_found_retries: bool) -> Self {
        Self {
            kind: CallKind::Mutating,
            retry_not_found: !disable_not_found_retries,
        }
    }
}

/// Management-plane operations for key versions.
///
/// Retry exhaustion inside the client surfaces as an ordinary error; absence
/// of the resource must surface as [`SyncError::NotFound`] so callers can
/// tell it apart from other failures.
#[async_trait]
pub trait KeyManagementApi: Send + Sync {
    /// Create a new version of the given key.
    ///
    /// The returned snapshot is authoritative for the assigned identity, but
    /// the version may not be queryable immediately after the call returns.
    async fn create_key_version(
        &self,
        key_id: &str,
        retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError>;

    /// Fetch the current snapshot of one key version.
    async fn get_key_version(
        &self,
        key_id: &str,
        key_version_id: &str,
        retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError>;

    /// Schedule deletion of a non-current key version.
    ///
    /// Without an explicit timestamp the service applies its default
    /// retention window.
    async fn schedule_key_version_deletion(
        &self,
        key_id: &str,
        key_version_id: &str,
        time_of_deletion: Option<DateTime<Utc>>,
        retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError>;
}
