//! Connectivity state machine and reconciliation pass.
//!
//! # Responsibility
//! - Track online/offline state from platform transition events.
//! - On reconnect, push in-memory tasks through the remote and write the
//!   results back through the repository.
//!
//! # Invariants
//! - Reconciliation is best-effort per task; one failed write never aborts
//!   the batch, and that task keeps its pre-sync copy in memory.
//! - Every in-memory task is counted exactly once in the report, whatever
//!   shape the remote reply takes.
//! - Going offline never mutates task state.
//! - Edits made while a pass is in flight may be overwritten by its write-back.

use super::remote::{RemoteError, RemoteSync};
use crate::board::{BoardController, BoardEvent};
use crate::model::task::TaskId;
use crate::store::TaskStore;
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Network reachability as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Offline,
    Online,
}

impl Display for Connectivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::Online => f.write_str("online"),
        }
    }
}

/// Platform-delivered transition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tasks whose synced copy was persisted and is now in memory.
    pub reconciled: usize,
    /// Tasks that kept their pre-sync copy, with the failure message.
    pub failed: Vec<(TaskId, String)>,
}

/// Long-lived connectivity listener bound to one remote.
pub struct ConnectivityReconciler<R: RemoteSync> {
    state: Connectivity,
    remote: R,
}

impl<R: RemoteSync> ConnectivityReconciler<R> {
    /// Starts in the connectivity state reported by the platform.
    pub fn new(initial: Connectivity, remote: R) -> Self {
        Self {
            state: initial,
            remote,
        }
    }

    pub fn state(&self) -> Connectivity {
        self.state
    }

    /// Applies a transition event.
    ///
    /// Returns a report only when the event moved the state to online.
    /// Events that do not change state are ignored.
    pub fn handle<S: TaskStore>(
        &mut self,
        event: ConnectivityEvent,
        board: &mut BoardController<S>,
    ) -> Option<ReconcileReport> {
        let next = match event {
            ConnectivityEvent::BecameOnline => Connectivity::Online,
            ConnectivityEvent::BecameOffline => Connectivity::Offline,
        };
        if next == self.state {
            return None;
        }

        info!(
            "event=connectivity module=sync status=ok from={} to={}",
            self.state, next
        );
        self.state = next;
        board.notify(BoardEvent::Connectivity(next));

        match next {
            Connectivity::Online => Some(self.reconcile(board)),
            Connectivity::Offline => None,
        }
    }

    /// Runs one reconciliation pass over the board's in-memory tasks.
    pub fn reconcile<S: TaskStore>(&self, board: &mut BoardController<S>) -> ReconcileReport {
        let started_at = Instant::now();
        let mut next = board.tasks().to_vec();
        let mut report = ReconcileReport::default();

        let synced = match self.remote.reconcile(&next) {
            Ok(synced) => synced,
            Err(err) => {
                error!(
                    "event=reconcile module=sync status=error duration_ms={} error_code={} retryable={}",
                    started_at.elapsed().as_millis(),
                    err.code,
                    err.retryable
                );
                report.failed = next
                    .iter()
                    .map(|task| (task.id, err.to_string()))
                    .collect();
                board.notify(BoardEvent::Reconciled {
                    reconciled: 0,
                    failed: report.failed.len(),
                });
                return report;
            }
        };

        let mut covered = HashSet::with_capacity(next.len());
        for task in synced {
            let Some(slot) = next.iter_mut().find(|local| local.id == task.id) else {
                warn!(
                    "event=reconcile module=sync status=skip task_id={} reason=unknown_task",
                    task.id
                );
                continue;
            };
            if !covered.insert(task.id) {
                warn!(
                    "event=reconcile module=sync status=skip task_id={} reason=duplicate_task",
                    task.id
                );
                continue;
            }
            match board.repository().replace(&task) {
                Ok(stored) => {
                    *slot = stored;
                    report.reconciled += 1;
                }
                Err(err) => {
                    warn!(
                        "event=reconcile module=sync status=error task_id={} error_code={}",
                        task.id,
                        err.code()
                    );
                    report.failed.push((task.id, err.to_string()));
                }
            }
        }

        for task in next.iter().filter(|task| !covered.contains(&task.id)) {
            let missing = RemoteError::new(
                "missing_from_remote",
                "remote reply did not include this task",
                true,
            );
            warn!(
                "event=reconcile module=sync status=error task_id={} error_code={}",
                task.id, missing.code
            );
            report.failed.push((task.id, missing.to_string()));
        }

        board.replace_tasks(next);
        info!(
            "event=reconcile module=sync status=ok duration_ms={} reconciled={} failed={}",
            started_at.elapsed().as_millis(),
            report.reconciled,
            report.failed.len()
        );
        board.notify(BoardEvent::Reconciled {
            reconciled: report.reconciled,
            failed: report.failed.len(),
        });
        report
    }
}
