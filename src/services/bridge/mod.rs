//! Session lifecycle management.
//!
//! The [`Reconciler`] periodically enumerates backend players and keeps the
//! [`SessionRegistry`] converged with that set, creating and destroying
//! sessions through a [`SessionFactory`] and notifying [`SessionHooks`].

/// Production session factory over BlueZ and the session bus
pub mod factory;
/// Collaborator notifications
pub mod hooks;
/// Reconciliation loop
pub mod reconcile;
/// Live session registry
pub mod registry;
/// One-shot reads of every player
pub mod snapshot;

pub use factory::*;
pub use hooks::*;
pub use reconcile::*;
pub use registry::*;
pub use snapshot::*;
