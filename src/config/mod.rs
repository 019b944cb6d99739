//! # Configuration
//!
//! Configuration for the reconciliation protocol.

pub mod reconciler;

pub use reconciler::ReconcilerConfig;
