//! # Reconciliation Core
//!
//! The generic pieces every resource shares: the composite identifier
//! codec, the lifecycle poller and the CRUD driver. Concrete resources live
//! under [`crate::resource`].

pub mod composite_id;
pub mod crud;
pub mod poller;

pub use crud::ResourceSynchronizer;
pub use poller::{Absence, PollOutcome, Poller, StateObserver};
