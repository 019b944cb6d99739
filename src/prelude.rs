//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use key_version_reconciler::prelude::*;
//! ```
//!
//! This brings into scope:
//! - The remote service contract (`KeyManagementApi`, `KeyVersion`,
//!   `LifecycleState`, `RetryPolicy`)
//! - The reconciliation core (`ResourceSynchronizer`, `Poller`,
//!   `StateObserver`, driver functions)
//! - The key-version synchronizer and its field names
//! - Config and error types

// Remote service contract
pub use crate::kms::{CallKind, KeyManagementApi, KeyVersion, LifecycleState, RetryPolicy};

// Reconciliation core
pub use crate::sync::composite_id;
pub use crate::sync::crud::{create_resource, delete_resource, read_resource};
pub use crate::sync::{Absence, PollOutcome, Poller, ResourceSynchronizer, StateObserver};

// Concrete resources
pub use crate::resource::key_version::{
    KeyVersionSynchronizer, COMPARTMENT_ID, KEY_ID, KEY_VERSION_ID, MANAGEMENT_ENDPOINT, STATE,
    TIME_CREATED, TIME_OF_DELETION, VAULT_ID,
};

// Local declarative store
pub use crate::store::ResourceData;

// Config and error types
pub use crate::config::ReconcilerConfig;
pub use crate::error::SyncError;
