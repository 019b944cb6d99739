//! # Key Version Resource
//!
//! Synchronizes one declared key version against the key management
//! service. A key version carries no mutable declared fields, so
//! reconciliation is create, read and scheduled deletion; the service owns
//! every lifecycle transition in between and the synchronizer only observes
//! them.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::SyncError;
use crate::kms::{KeyManagementApi, KeyVersion, LifecycleState, RetryPolicy};
use crate::store::ResourceData;
use crate::sync::composite_id;
use crate::sync::crud::{self, ResourceSynchronizer};
use crate::sync::poller::Poller;

/// Declared field names.
pub const KEY_ID: &str = "key_id";
pub const MANAGEMENT_ENDPOINT: &str = "management_endpoint";
pub const TIME_OF_DELETION: &str = "time_of_deletion";

/// Computed field names.
pub const COMPARTMENT_ID: &str = "compartment_id";
pub const STATE: &str = "state";
pub const KEY_VERSION_ID: &str = "key_version_id";
pub const TIME_CREATED: &str = "time_created";
pub const VAULT_ID: &str = "vault_id";

/// Shape of an import string.
const IMPORT_ID_PATTERN: &str = "^managementEndpoint/(.*)/keys/(.*)/keyVersions/(.*)$";

const CREATED_PENDING: &[LifecycleState] =
    &[LifecycleState::Creating, LifecycleState::Enabling];
const CREATED_TARGET: &[LifecycleState] = &[LifecycleState::Enabled];
const DELETED_PENDING: &[LifecycleState] = &[
    LifecycleState::Disabled,
    LifecycleState::Deleting,
    LifecycleState::SchedulingDeletion,
];
const DELETED_TARGET: &[LifecycleState] =
    &[LifecycleState::Deleted, LifecycleState::PendingDeletion];

/// Synchronizer for one declared key version.
pub struct KeyVersionSynchronizer {
    client: Arc<dyn KeyManagementApi>,
    data: ResourceData,
    config: ReconcilerConfig,
    cancel: Option<Arc<AtomicBool>>,
    res: Option<KeyVersion>,
}

impl std::fmt::Debug for KeyVersionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVersionSynchronizer")
            .field("data", &self.data)
            .field("res", &self.res)
            .finish_non_exhaustive()
    }
}

impl KeyVersionSynchronizer {
    #[must_use]
    pub fn new(
        client: Arc<dyn KeyManagementApi>,
        data: ResourceData,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            client,
            data,
            config,
            cancel: None,
            res: None,
        }
    }

    /// Cooperative cancellation flag honored by every lifecycle wait.
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Declared state after the last projection.
    #[must_use]
    pub fn data(&self) -> &ResourceData {
        &self.data
    }

    /// Hand the declared state back to the driver for persistence.
    #[must_use]
    pub fn into_data(self) -> ResourceData {
        self.data
    }

    /// Latest snapshot, if a create or get has completed.
    #[must_use]
    pub fn snapshot(&self) -> Option<&KeyVersion> {
        self.res.as_ref()
    }

    /// Entry point for a freshly declared resource: create, wait for
    /// `ENABLED`, project.
    pub async fn reconcile_create(&mut self) -> Result<(), SyncError> {
        if self.data.get(MANAGEMENT_ENDPOINT).is_none() {
            return Err(SyncError::MissingField("management endpoint"));
        }
        let poller = self.poller(self.config.create_timeout);
        crud::create_resource(self, &poller).await
    }

    /// Entry point for refresh. When local state carries no
    /// `management_endpoint`, the stored id is treated as an import string
    /// first.
    pub async fn reconcile_read(&mut self) -> Result<(), SyncError> {
        if self.data.get(MANAGEMENT_ENDPOINT).is_none() {
            self.import_state()?;
        }
        crud::read_resource(self).await
    }

    /// Entry point for destroy: suppressed entirely while the deletion
    /// guard is engaged, otherwise schedule deletion and wait for a terminal
    /// state or absence.
    pub async fn reconcile_delete(&mut self) -> Result<(), SyncError> {
        if self.config.suppress_version_deletion {
            info!("key version deletion disabled by configuration, skipping teardown");
            return Ok(());
        }
        if self.data.get(MANAGEMENT_ENDPOINT).is_none() {
            return Err(SyncError::MissingField("management endpoint"));
        }
        let poller = self.poller(self.config.delete_timeout);
        crud::delete_resource(self, &poller).await
    }

    /// Populate declared fields from an import string of the shape
    /// `managementEndpoint/{endpoint}/keys/{keyId}/keyVersions/{keyVersionId}`
    /// and synthesize the composite id. Never partially imports.
    pub fn import_state(&mut self) -> Result<(), SyncError> {
        let id = self.data.id().to_string();
        let pattern = Regex::new(IMPORT_ID_PATTERN)
            .map_err(|e| anyhow!("failed to compile import id pattern: {e}"))?;
        let Some(captures) = pattern.captures(&id) else {
            return Err(SyncError::InvalidImportFormat { id });
        };

        let endpoint = &captures[1];
        let key_id = &captures[2];
        let key_version_id = &captures[3];
        debug!(key_id = %key_id, key_version_id = %key_version_id, "importing key version");

        self.data.set(MANAGEMENT_ENDPOINT, endpoint);
        self.data.set(KEY_ID, key_id);
        self.data.set(KEY_VERSION_ID, key_version_id);
        self.data
            .set_id(composite_id::encode(key_id, key_version_id));
        Ok(())
    }

    fn poller(&self, deadline: Duration) -> Poller {
        let mut poller = Poller::new(self.config.poll_interval, deadline)
            .with_jitter(self.config.poll_jitter);
        if let Some(cancel) = &self.cancel {
            poller = poller.with_cancel(Arc::clone(cancel));
        }
        poller
    }

    fn decode_stored_id(&self) -> Result<(String, String), SyncError> {
        composite_id::decode(self.data.id()).map_err(|err| {
            warn!(id = %self.data.id(), "unable to parse stored composite id");
            err
        })
    }
}

#[async_trait]
impl ResourceSynchronizer for KeyVersionSynchronizer {
    fn id(&self) -> String {
        // The snapshot is authoritative once a create or get has completed.
        match &self.res {
            Some(res) => composite_id::encode(&res.key_id, &res.id),
            None => self.data.id().to_string(),
        }
    }

    async fn create(&mut self) -> Result<(), SyncError> {
        let key_id = self
            .data
            .get(KEY_ID)
            .ok_or(SyncError::MissingField("key_id"))?
            .to_string();

        debug!(key_id = %key_id, "creating key version");
        let retry = RetryPolicy::mutating(self.config.disable_not_found_retries);
        let res = self.client.create_key_version(&key_id, &retry).await?;
        info!(
            key_version_id = %res.id,
            state = %res.lifecycle_state,
            "key version created"
        );

        self.data
            .set_id(composite_id::encode(&res.key_id, &res.id));
        self.res = Some(res);

        // The create is acknowledged before the version is queryable; give
        // the service the configured settle window before the first read.
        if !self.config.create_settle_delay.is_zero() {
            tokio::time::sleep(self.config.create_settle_delay).await;
        }
        Ok(())
    }

    async fn get(&mut self) -> Result<(), SyncError> {
        let (key_id, key_version_id) = self.decode_stored_id()?;
        let retry = RetryPolicy::read(self.config.disable_not_found_retries);
        let res = self
            .client
            .get_key_version(&key_id, &key_version_id, &retry)
            .await?;
        self.res = Some(res);
        Ok(())
    }

    async fn delete(&mut self) -> Result<(), SyncError> {
        if self.config.suppress_version_deletion {
            info!("key version deletion disabled by configuration, skipping remote call");
            return Ok(());
        }

        let (key_id, key_version_id) = self.decode_stored_id()?;
        let time_of_deletion = match self.data.get(TIME_OF_DELETION) {
            Some(raw) => Some(parse_deletion_time(raw)?),
            None => None,
        };

        debug!(key_id = %key_id, key_version_id = %key_version_id, "scheduling key version deletion");
        let retry = RetryPolicy::mutating(self.config.disable_not_found_retries);
        self.client
            .schedule_key_version_deletion(&key_id, &key_version_id, time_of_deletion, &retry)
            .await?;
        Ok(())
    }

    fn set_data(&mut self) -> Result<(), SyncError> {
        match composite_id::decode(self.data.id()) {
            Ok((key_id, key_version_id)) => {
                self.data.set(KEY_ID, key_id);
                self.data.set(KEY_VERSION_ID, key_version_id);
            }
            Err(_) => {
                // The decoded pair is the only loss; the rest still projects.
                warn!(id = %self.data.id(), "unable to parse stored composite id during projection");
            }
        }

        let Some(res) = &self.res else {
            return Err(SyncError::Remote(anyhow!("no snapshot to project")));
        };

        if let Some(compartment_id) = &res.compartment_id {
            self.data.set(COMPARTMENT_ID, compartment_id.as_str());
        }
        self.data.set(KEY_ID, res.key_id.as_str());
        self.data.set(STATE, res.lifecycle_state.as_str());
        if let Some(time_created) = &res.time_created {
            self.data.set(TIME_CREATED, time_created.to_rfc3339());
        }
        if let Some(time_of_deletion) = &res.time_of_deletion {
            self.data
                .set(TIME_OF_DELETION, time_of_deletion.to_rfc3339());
        }
        if let Some(vault_id) = &res.vault_id {
            self.data.set(VAULT_ID, vault_id.as_str());
        }
        Ok(())
    }

    fn observed_state(&self) -> Option<LifecycleState> {
        self.res.as_ref().map(|res| res.lifecycle_state)
    }

    fn created_pending(&self) -> &'static [LifecycleState] {
        CREATED_PENDING
    }

    fn created_target(&self) -> &'static [LifecycleState] {
        CREATED_TARGET
    }

    fn deleted_pending(&self) -> &'static [LifecycleState] {
        DELETED_PENDING
    }

    fn deleted_target(&self) -> &'static [LifecycleState] {
        DELETED_TARGET
    }

    fn deletion_suppressed(&self) -> bool {
        self.config.suppress_version_deletion
    }
}

/// Scheduled-deletion timestamps arrive as RFC 3339 with fractional
/// seconds.
fn parse_deletion_time(raw: &str) -> Result<DateTime<Utc>, SyncError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| SyncError::InvalidTimestamp {
            value: raw.to_string(),
            source,
        })
}
