//! # Resource CRUD Driver
//!
//! The reconciliation sequence every resource follows: mutate, poll the
//! lifecycle state into its target set, project the snapshot into local
//! state. Concrete resources supply the remote operations and their
//! pending/target tables; the driver owns the ordering and the two
//! documented tolerances (absence-as-deleted during teardown, suppressed
//! teardown under the deletion guard).

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::kms::LifecycleState;
use crate::sync::poller::{Absence, PollOutcome, Poller, StateObserver};

/// One reconcilable remote resource.
///
/// Implementations hold the declared local state, the remote client and the
/// latest snapshot; the driver never touches any of those directly.
#[async_trait]
pub trait ResourceSynchronizer: Send {
    /// Externally visible identifier, derived from the current snapshot once
    /// one is held.
    fn id(&self) -> String;

    /// Issue the remote create and record the assigned identity in local
    /// state. The snapshot after a successful create may not be queryable
    /// yet.
    async fn create(&mut self) -> Result<(), SyncError>;

    /// Refresh the snapshot from the remote service.
    async fn get(&mut self) -> Result<(), SyncError>;

    /// Issue the remote teardown call.
    async fn delete(&mut self) -> Result<(), SyncError>;

    /// Project the authoritative snapshot into the declared local state.
    fn set_data(&mut self) -> Result<(), SyncError>;

    /// Lifecycle state of the current snapshot, if one is held.
    fn observed_state(&self) -> Option<LifecycleState>;

    /// States to wait through after create.
    fn created_pending(&self) -> &'static [LifecycleState];
    /// States that complete a create.
    fn created_target(&self) -> &'static [LifecycleState];
    /// States to wait through after delete.
    fn deleted_pending(&self) -> &'static [LifecycleState];
    /// States that complete a delete.
    fn deleted_target(&self) -> &'static [LifecycleState];

    /// When `true` the whole teardown sequence is skipped.
    fn deletion_suppressed(&self) -> bool {
        false
    }
}

/// Adapter the driver polls through: a synchronizer observes lifecycle
/// state by refreshing its snapshot.
struct SnapshotObserver<'a, S: ?Sized>(&'a mut S);

#[async_trait]
impl<S> StateObserver for SnapshotObserver<'_, S>
where
    S: ResourceSynchronizer + ?Sized,
{
    async fn observe(&mut self) -> Result<LifecycleState, SyncError> {
        self.0.get().await?;
        self.0
            .observed_state()
            .ok_or_else(|| SyncError::Remote(anyhow!("no snapshot held after successful get")))
    }
}

/// Create the remote resource, wait for it to reach a created-target state,
/// then project the snapshot.
pub async fn create_resource<S>(sync: &mut S, poller: &Poller) -> Result<(), SyncError>
where
    S: ResourceSynchronizer,
{
    sync.create().await?;

    let pending = sync.created_pending();
    let target = sync.created_target();
    poller
        .wait_until(
            &mut SnapshotObserver(&mut *sync),
            pending,
            target,
            Absence::Fail,
        )
        .await?;

    sync.set_data()
}

/// Refresh the snapshot and project it.
pub async fn read_resource<S>(sync: &mut S) -> Result<(), SyncError>
where
    S: ResourceSynchronizer,
{
    sync.get().await?;
    sync.set_data()
}

/// Tear the remote resource down and wait for a terminal deleted state.
///
/// Absence during the wait counts as deleted. When the synchronizer reports
/// deletion as suppressed, the sequence is a successful no-op with zero
/// remote calls.
pub async fn delete_resource<S>(sync: &mut S, poller: &Poller) -> Result<(), SyncError>
where
    S: ResourceSynchronizer,
{
    if sync.deletion_suppressed() {
        info!(id = %sync.id(), "deletion suppressed by configuration, skipping teardown");
        return Ok(());
    }

    sync.delete().await?;

    let pending = sync.deleted_pending();
    let target = sync.deleted_target();
    match poller
        .wait_until(
            &mut SnapshotObserver(&mut *sync),
            pending,
            target,
            Absence::TreatAsDeleted,
        )
        .await?
    {
        PollOutcome::Reached(state) => {
            debug!(state = %state, "terminal deletion state reached");
        }
        PollOutcome::Absent => debug!("record already removed by the service"),
    }
    Ok(())
}
