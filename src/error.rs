//! # Error Types
//!
//! Error taxonomy for the reconciliation protocol.
//!
//! Everything the protocol must react to has its own variant; remote
//! failures that carry no protocol meaning are wrapped opaquely in
//! [`SyncError::Remote`] and propagated unchanged to the reconciliation
//! driver, which owns user-visible reporting.

use std::time::Duration;

use thiserror::Error;

use crate::kms::LifecycleState;

/// Errors surfaced by the synchronizer, the poller and the codec.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Persisted composite id does not match
    /// `keys/{keyId}/keyVersions/{keyVersionId}`.
    #[error("illegal composite id {id:?} encountered")]
    MalformedIdentifier { id: String },

    /// Import string does not match the documented import shape.
    #[error(
        "id {id:?} should be of format: managementEndpoint/{{managementEndpoint}}/keys/{{keyId}}/keyVersions/{{keyVersionId}}"
    )]
    InvalidImportFormat { id: String },

    /// User-supplied deletion timestamp is not RFC 3339.
    #[error("invalid time_of_deletion {value:?}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A required declared field has no explicit value.
    #[error("{0} missing")]
    MissingField(&'static str),

    /// The remote resource does not exist.
    #[error("key version not found")]
    NotFound,

    /// Observed lifecycle state is a member of neither the pending nor the
    /// target set.
    #[error("unexpected lifecycle state {state}")]
    UnexpectedState { state: LifecycleState },

    /// Deadline elapsed while the resource was still in a pending state.
    #[error("timed out after {waited:?} waiting for lifecycle state (last observed: {last_state:?})")]
    Timeout {
        waited: Duration,
        last_state: Option<LifecycleState>,
    },

    /// Polling was cancelled by the surrounding driver.
    #[error("lifecycle polling cancelled")]
    Cancelled,

    /// Any other remote service failure, propagated unchanged.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl SyncError {
    /// `true` for [`SyncError::NotFound`], the one remote outcome callers
    /// may react to by pruning local state instead of failing the run.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound)
    }
}
