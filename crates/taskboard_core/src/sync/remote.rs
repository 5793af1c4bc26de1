//! Remote reconciliation seam.
//!
//! # Responsibility
//! - Define the single-method contract a remote backend must satisfy.
//! - Provide the local simulation used until a real backend exists.

use crate::clock::{Clock, SystemClock};
use crate::model::task::Task;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a whole remote reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Stable machine-readable code, e.g. `remote_unreachable`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the caller may retry on the next reconnect.
    pub retryable: bool,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl Error for RemoteError {}

/// Remote counterpart that brings local tasks into agreement with itself.
pub trait RemoteSync {
    /// Returns the remote's view of `tasks`, keyed by the same ids.
    fn reconcile(&self, tasks: &[Task]) -> Result<Vec<Task>, RemoteError>;
}

/// Local stand-in for a sync backend: accepts every task as-is and stamps
/// `synced_at`.
pub struct SimulatedRemote {
    clock: Box<dyn Clock>,
}

impl SimulatedRemote {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }
}

impl Default for SimulatedRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSync for SimulatedRemote {
    fn reconcile(&self, tasks: &[Task]) -> Result<Vec<Task>, RemoteError> {
        let synced_at = self.clock.now();
        Ok(tasks
            .iter()
            .map(|task| Task {
                synced_at: Some(synced_at),
                ..task.clone()
            })
            .collect())
    }
}
