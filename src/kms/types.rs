//! # Key Management Types
//!
//! Data shapes returned by the key management service for key versions.
//!
//! These structs match the JSON wire shape of the management API, so a
//! concrete client can deserialize responses into them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a key version as reported by the service.
///
/// The service owns every transition; this crate only observes the tags and
/// tests set membership against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Creating,
    Enabling,
    Enabled,
    Disabled,
    Deleting,
    Deleted,
    SchedulingDeletion,
    PendingDeletion,
}

impl LifecycleState {
    /// Every lifecycle state the service publishes.
    pub const ALL: [LifecycleState; 8] = [
        LifecycleState::Creating,
        LifecycleState::Enabling,
        LifecycleState::Enabled,
        LifecycleState::Disabled,
        LifecycleState::Deleting,
        LifecycleState::Deleted,
        LifecycleState::SchedulingDeletion,
        LifecycleState::PendingDeletion,
    ];

    /// Wire representation of the state
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Creating => "CREATING",
            LifecycleState::Enabling => "ENABLING",
            LifecycleState::Enabled => "ENABLED",
            LifecycleState::Disabled => "DISABLED",
            LifecycleState::Deleting => "DELETING",
            LifecycleState::Deleted => "DELETED",
            LifecycleState::SchedulingDeletion => "SCHEDULING_DELETION",
            LifecycleState::PendingDeletion => "PENDING_DELETION",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one remote key version.
///
/// Refreshed on every successful create or get; the synchronizer never
/// mutates it locally. `id` and `key_id` are server-assigned and always
/// present; the remaining fields may be absent depending on the version's
/// lifecycle phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVersion {
    /// Server-assigned identifier of this key version.
    pub id: String,
    /// Identifier of the key this version belongs to.
    pub key_id: String,
    /// Compartment holding the owning key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    /// Vault holding the owning key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<String>,
    /// Where the version sits in its provisioning/deprovisioning process.
    pub lifecycle_state: LifecycleState,
    /// Creation time of the version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
    /// Scheduled deletion time, set once deletion has been requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_deletion: Option<DateTime<Utc>>,
}
