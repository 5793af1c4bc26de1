//! Core of the task board: durable task storage, board state and
//! connectivity-driven reconciliation.
//!
//! Layering, leaf to root: `store` (durable records) → `repo` (typed CRUD
//! with validation) → `board` (in-memory view, selection, observers) →
//! `sync` (online/offline reconciliation).

pub mod board;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod sync;

pub use board::{BoardController, BoardEvent, SubscriptionId};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BoardConfig, ConfigError, LoggingConfig, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{
    Priority, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, TaskValidationError,
};
pub use repo::task_repo::{RepoError, RepoResult, TaskRepository};
pub use store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use sync::{
    Connectivity, ConnectivityEvent, ConnectivityReconciler, ReconcileReport, RemoteError,
    RemoteSync, SimulatedRemote,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
