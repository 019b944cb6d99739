//! # Key Version Reconciliation Tests
//!
//! End-to-end reconciliation flows driven against a scripted in-memory key
//! management service that counts every remote call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use key_version_reconciler::prelude::*;

const KEY: &str = "ocid1.key.oc1..k1";
const VERSION: &str = "ocid1.keyversion.oc1..v1";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// What one scripted get should return.
enum ScriptedGet {
    State(LifecycleState),
    Missing,
}

/// Scripted key management service.
///
/// Gets pop states off a script; every call is counted so tests can assert
/// the guard really produced zero remote traffic.
#[derive(Default)]
struct MockKms {
    get_script: Mutex<VecDeque<ScriptedGet>>,
    create_calls: AtomicUsize,
    get_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    last_get_args: Mutex<Option<(String, String)>>,
    last_deletion_time: Mutex<Option<Option<DateTime<Utc>>>>,
}

impl MockKms {
    fn with_get_script(script: Vec<ScriptedGet>) -> Arc<Self> {
        Arc::new(Self {
            get_script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn remote_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.get_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }

    fn snapshot(&self, state: LifecycleState) -> KeyVersion {
        KeyVersion {
            id: VERSION.to_string(),
            key_id: KEY.to_string(),
            compartment_id: Some("ocid1.compartment.oc1..comp1".to_string()),
            vault_id: Some("ocid1.vault.oc1..vault1".to_string()),
            lifecycle_state: state,
            time_created: "2024-03-01T10:15:30Z".parse().ok(),
            time_of_deletion: None,
        }
    }
}

#[async_trait]
impl KeyManagementApi for MockKms {
    async fn create_key_version(
        &self,
        key_id: &str,
        _retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(key_id, KEY);
        Ok(self.snapshot(LifecycleState::Creating))
    }

    async fn get_key_version(
        &self,
        key_id: &str,
        key_version_id: &str,
        _retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_get_args.lock().unwrap() =
            Some((key_id.to_string(), key_version_id.to_string()));
        let next = self
            .get_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("get script exhausted");
        match next {
            ScriptedGet::State(state) => Ok(self.snapshot(state)),
            ScriptedGet::Missing => Err(SyncError::NotFound),
        }
    }

    async fn schedule_key_version_deletion(
        &self,
        key_id: &str,
        key_version_id: &str,
        time_of_deletion: Option<DateTime<Utc>>,
        _retry: &RetryPolicy,
    ) -> Result<KeyVersion, SyncError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(key_id, KEY);
        assert_eq!(key_version_id, VERSION);
        *self.last_deletion_time.lock().unwrap() = Some(time_of_deletion);
        Ok(self.snapshot(LifecycleState::SchedulingDeletion))
    }
}

/// Config tuned for tests: no settle pause, tight polling, short deadlines.
fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        create_settle_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(2),
        poll_jitter: 0.0,
        create_timeout: Duration::from_secs(2),
        delete_timeout: Duration::from_secs(2),
        ..ReconcilerConfig::default()
    }
}

fn declared_data() -> ResourceData {
    ResourceData::new()
        .with_field(KEY_ID, KEY)
        .with_field(MANAGEMENT_ENDPOINT, "https://kms.example.test")
}

#[tokio::test]
async fn test_create_waits_for_enabled_and_projects() {
    init_tracing();
    let kms = MockKms::with_get_script(vec![
        ScriptedGet::State(LifecycleState::Creating),
        ScriptedGet::State(LifecycleState::Enabling),
        ScriptedGet::State(LifecycleState::Enabled),
    ]);
    let mut sync =
        KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, declared_data(), fast_config());

    sync.reconcile_create().await.unwrap();

    assert_eq!(kms.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(kms.get_calls.load(Ordering::SeqCst), 3);

    let data = sync.into_data();
    assert_eq!(data.id(), composite_id::encode(KEY, VERSION));
    assert_eq!(data.get(STATE), Some("ENABLED"));
    assert_eq!(data.get(KEY_VERSION_ID), Some(VERSION));
    assert_eq!(data.get(COMPARTMENT_ID), Some("ocid1.compartment.oc1..comp1"));
    assert_eq!(data.get(VAULT_ID), Some("ocid1.vault.oc1..vault1"));
    assert!(data.get(TIME_CREATED).is_some());
}

#[tokio::test]
async fn test_create_applies_settle_delay_before_first_get() {
    let kms = MockKms::with_get_script(vec![ScriptedGet::State(LifecycleState::Enabled)]);
    let config = ReconcilerConfig {
        create_settle_delay: Duration::from_millis(60),
        ..fast_config()
    };
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, declared_data(), config);

    let started = Instant::now();
    sync.reconcile_create().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_create_fails_on_divergent_state() {
    let kms = MockKms::with_get_script(vec![ScriptedGet::State(LifecycleState::Deleted)]);
    let mut sync =
        KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, declared_data(), fast_config());

    let err = sync.reconcile_create().await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::UnexpectedState {
            state: LifecycleState::Deleted
        }
    ));
    assert_eq!(kms.get_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_without_endpoint_is_rejected_locally() {
    let kms = MockKms::with_get_script(vec![]);
    let data = ResourceData::new().with_field(KEY_ID, KEY);
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    let err = sync.reconcile_create().await.unwrap_err();

    assert!(matches!(err, SyncError::MissingField(_)));
    assert_eq!(kms.remote_calls(), 0);
}

#[tokio::test]
async fn test_read_refreshes_snapshot_into_local_state() {
    let kms = MockKms::with_get_script(vec![ScriptedGet::State(LifecycleState::Enabled)]);
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_read().await.unwrap();

    assert_eq!(sync.data().get(STATE), Some("ENABLED"));
    let args = kms.last_get_args.lock().unwrap().clone();
    assert_eq!(args, Some((KEY.to_string(), VERSION.to_string())));
}

#[tokio::test]
async fn test_read_not_found_propagates_for_pruning() {
    let kms = MockKms::with_get_script(vec![ScriptedGet::Missing]);
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    let err = sync.reconcile_read().await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_read_with_malformed_id_never_reaches_remote() {
    let kms = MockKms::with_get_script(vec![]);
    let data = declared_data().with_id("corrupted");
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    let err = sync.reconcile_read().await.unwrap_err();

    assert!(matches!(err, SyncError::MalformedIdentifier { .. }));
    assert_eq!(kms.remote_calls(), 0);
}

#[tokio::test]
async fn test_import_then_read() {
    init_tracing();
    let kms = MockKms::with_get_script(vec![ScriptedGet::State(LifecycleState::Enabled)]);
    let data = ResourceData::new().with_id(format!(
        "managementEndpoint/https://kms.example.test/keys/{KEY}/keyVersions/{VERSION}"
    ));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_read().await.unwrap();

    let data = sync.into_data();
    assert_eq!(data.get(MANAGEMENT_ENDPOINT), Some("https://kms.example.test"));
    assert_eq!(data.get(KEY_ID), Some(KEY));
    assert_eq!(data.get(KEY_VERSION_ID), Some(VERSION));
    assert_eq!(data.id(), composite_id::encode(KEY, VERSION));
}

#[tokio::test]
async fn test_import_garbage_fails_before_any_remote_call() {
    let kms = MockKms::with_get_script(vec![]);
    let data = ResourceData::new().with_id("garbage");
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    let err = sync.reconcile_read().await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidImportFormat { .. }));
    assert_eq!(kms.remote_calls(), 0);
}

#[tokio::test]
async fn test_delete_schedules_and_waits_for_terminal_state() {
    init_tracing();
    let kms = MockKms::with_get_script(vec![
        ScriptedGet::State(LifecycleState::SchedulingDeletion),
        ScriptedGet::State(LifecycleState::PendingDeletion),
    ]);
    let data = declared_data()
        .with_id(composite_id::encode(KEY, VERSION))
        .with_field(TIME_OF_DELETION, "2026-09-01T12:00:00.000Z");
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_delete().await.unwrap();

    assert_eq!(kms.delete_calls.load(Ordering::SeqCst), 1);
    let recorded = kms.last_deletion_time.lock().unwrap().clone();
    let expected: DateTime<Utc> = "2026-09-01T12:00:00Z".parse().unwrap();
    assert_eq!(recorded, Some(Some(expected)));
}

#[tokio::test]
async fn test_delete_tolerates_absence_as_terminal() {
    let kms = MockKms::with_get_script(vec![
        ScriptedGet::State(LifecycleState::Deleting),
        ScriptedGet::Missing,
    ]);
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_delete().await.unwrap();

    assert_eq!(kms.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_without_timestamp_passes_none() {
    let kms = MockKms::with_get_script(vec![ScriptedGet::State(LifecycleState::Deleted)]);
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_delete().await.unwrap();

    assert_eq!(kms.last_deletion_time.lock().unwrap().clone(), Some(None));
}

#[tokio::test]
async fn test_delete_with_invalid_timestamp_never_reaches_remote() {
    let kms = MockKms::with_get_script(vec![]);
    let data = declared_data()
        .with_id(composite_id::encode(KEY, VERSION))
        .with_field(TIME_OF_DELETION, "next tuesday");
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    let err = sync.reconcile_delete().await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidTimestamp { .. }));
    assert_eq!(kms.remote_calls(), 0);
}

#[tokio::test]
async fn test_engaged_guard_suppresses_all_remote_traffic() {
    init_tracing();
    let kms = MockKms::with_get_script(vec![]);
    let config = ReconcilerConfig {
        suppress_version_deletion: true,
        ..fast_config()
    };
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, config);

    sync.reconcile_delete().await.unwrap();

    assert_eq!(kms.remote_calls(), 0);
}

#[tokio::test]
async fn test_projection_is_stable_across_repeated_reads() {
    let kms = MockKms::with_get_script(vec![
        ScriptedGet::State(LifecycleState::Enabled),
        ScriptedGet::State(LifecycleState::Enabled),
    ]);
    let data = declared_data().with_id(composite_id::encode(KEY, VERSION));
    let mut sync = KeyVersionSynchronizer::new(Arc::clone(&kms) as Arc<dyn KeyManagementApi>, data, fast_config());

    sync.reconcile_read().await.unwrap();
    let first = sync.data().clone();
    sync.reconcile_read().await.unwrap();

    assert_eq!(sync.data(), &first);
}
