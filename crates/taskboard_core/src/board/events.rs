//! Board change notifications and subscriber registry.

use crate::model::task::TaskId;
use crate::sync::Connectivity;

/// Change notification delivered to board subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The in-memory task sequence changed.
    TasksChanged,
    /// The selected task changed, was refreshed, or was cleared.
    SelectionChanged(Option<TaskId>),
    /// A task was created; any open creation form should close.
    CreateFormClosed,
    /// A mutation failed; carries a user-facing message.
    Error(String),
    /// Network state transitioned.
    Connectivity(Connectivity),
    /// A reconciliation pass finished.
    Reconciled { reconciled: usize, failed: usize },
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&BoardEvent)>;

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&mut self, event: &BoardEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
