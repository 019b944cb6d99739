//! Key Version Reconciler Library
//!
//! This library provides the reconciliation core for declared KMS key
//! versions: the composite identifier codec, the lifecycle poller, the CRUD
//! driver and the key-version synchronizer. Tests are included in the module
//! files and in `tests/`.
//!
//! ## Quick Start
//!
//! ```rust
//! use key_version_reconciler::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific
//! imports, use the individual modules.

// Re-export modules so they can be tested
pub mod config;
pub mod constants;
pub mod error;
pub mod kms;
pub mod prelude;
pub mod resource;
pub mod store;
pub mod sync;
