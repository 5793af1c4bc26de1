//! Domain model for board tasks.
//!
//! # Responsibility
//! - Define the canonical task record shared by storage, board state and sync.
//! - Define partial-input shapes used by create/update boundaries.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` that is never reused.
//! - Deletion is a hard removal; there is no tombstone state.

pub mod task;
