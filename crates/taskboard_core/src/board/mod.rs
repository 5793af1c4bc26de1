//! Board state: in-memory task view, selection and change notifications.
//!
//! # Responsibility
//! - Keep the view-facing task sequence consistent with the repository.
//! - Expose observer-style subscriptions so views react to changes.

pub mod controller;
pub mod events;

pub use controller::BoardController;
pub use events::{BoardEvent, SubscriptionId};
