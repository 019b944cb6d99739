//! # Resource Synchronizers
//!
//! Concrete per-resource instances of the reconciliation protocol. Each
//! resource supplies its remote operations, pending/target state tables and
//! field projection; the sequencing lives in [`crate::sync`].

pub mod key_version;

pub use key_version::KeyVersionSynchronizer;
