//! # Lifecycle Poller
//!
//! Blocks until an observed lifecycle state leaves the pending set and lands
//! in the target set, within a deadline. Absence of the resource is a valid
//! outcome only during teardown polling; a state outside both sets is a
//! protocol violation and stops the wait immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::constants::DEFAULT_POLL_JITTER;
use crate::error::SyncError;
use crate::kms::LifecycleState;

/// Source of lifecycle observations, usually a synchronizer refreshing its
/// snapshot through Get.
#[async_trait]
pub trait StateObserver: Send {
    async fn observe(&mut self) -> Result<LifecycleState, SyncError>;
}

/// How the poller treats a [`SyncError::NotFound`] from the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// Propagate the error. Used while provisioning: a resource that
    /// vanishes mid-wait is genuine loss, not success.
    Fail,
    /// Accept absence as an implicit terminal deletion. Used only while
    /// polling a scheduled deletion: the service may physically remove the
    /// record instead of parking it in a terminal state.
    TreatAsDeleted,
}

/// Terminal outcome of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The observed state is a member of the target set.
    Reached(LifecycleState),
    /// The resource is gone and the absence policy accepts that.
    Absent,
}

/// Lifecycle poller with a fixed base interval, random jitter and a
/// deadline.
///
/// ```rust
/// use std::time::Duration;
/// use key_version_reconciler::sync::poller::Poller;
///
/// let poller = Poller::new(Duration::from_secs(3), Duration::from_secs(900))
///     .with_jitter(0.2);
/// ```
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    jitter: f64,
    deadline: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl Poller {
    #[must_use]
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            jitter: DEFAULT_POLL_JITTER,
            deadline,
            cancel: None,
        }
    }

    /// Fractional spread applied to every sleep, `0.2` = ±20%.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Cooperative cancellation flag, checked before every observation and
    /// after every sleep.
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Observe until the state reaches `target`, waiting through `pending`.
    ///
    /// - a state in `target` ends the wait with [`PollOutcome::Reached`];
    /// - a state in `pending` keeps waiting until the deadline, then fails
    ///   with [`SyncError::Timeout`];
    /// - a state in neither set fails with [`SyncError::UnexpectedState`]
    ///   immediately;
    /// - [`SyncError::NotFound`] ends the wait with [`PollOutcome::Absent`]
    ///   under [`Absence::TreatAsDeleted`] and propagates otherwise;
    /// - a set cancel flag fails with [`SyncError::Cancelled`].
    pub async fn wait_until<O>(
        &self,
        observer: &mut O,
        pending: &[LifecycleState],
        target: &[LifecycleState],
        absence: Absence,
    ) -> Result<PollOutcome, SyncError>
    where
        O: StateObserver + ?Sized,
    {
        let started = Instant::now();
        let mut last_state = None;

        loop {
            if self.cancelled() {
                return Err(SyncError::Cancelled);
            }

            match observer.observe().await {
                Ok(state) if target.contains(&state) => {
                    debug!(state = %state, "target lifecycle state reached");
                    return Ok(PollOutcome::Reached(state));
                }
                Ok(state) if pending.contains(&state) => {
                    debug!(state = %state, "lifecycle state still pending");
                    last_state = Some(state);
                }
                Ok(state) => {
                    warn!(state = %state, "lifecycle state outside pending and target sets");
                    return Err(SyncError::UnexpectedState { state });
                }
                Err(SyncError::NotFound) if absence == Absence::TreatAsDeleted => {
                    debug!("resource absent, accepted as deleted");
                    return Ok(PollOutcome::Absent);
                }
                Err(err) => return Err(err),
            }

            if started.elapsed() >= self.deadline {
                return Err(SyncError::Timeout {
                    waited: started.elapsed(),
                    last_state,
                });
            }

            tokio::time::sleep(self.next_interval()).await;
        }
    }

    /// Base interval spread by the jitter factor, never below one
    /// millisecond.
    fn next_interval(&self) -> Duration {
        let factor = 1.0 - self.jitter + rand::random::<f64>() * (self.jitter * 2.0);
        let millis = (self.interval.as_millis() as f64 * factor).max(1.0);
        Duration::from_millis(millis as u64)
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
