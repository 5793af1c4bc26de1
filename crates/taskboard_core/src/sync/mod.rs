//! Connectivity-driven reconciliation with a remote counterpart.
//!
//! # Responsibility
//! - Model online/offline transitions as a two-state machine.
//! - Keep the remote write step behind a pluggable `RemoteSync` seam.

pub mod reconciler;
pub mod remote;

pub use reconciler::{Connectivity, ConnectivityEvent, ConnectivityReconciler, ReconcileReport};
pub use remote::{RemoteError, RemoteSync, SimulatedRemote};
