//! Task repository layer.
//!
//! # Responsibility
//! - Expose typed CRUD use-cases over the durable store.
//! - Keep identity assignment and validation out of storage and UI code.
//!
//! # Invariants
//! - Repository APIs never swallow storage errors.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to storage faults.

pub mod task_repo;
