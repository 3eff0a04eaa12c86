//! Per-call execution context

use std::time::Duration;
use tokio::time::Instant;

/// Deadline carried into every store call
///
/// Cancellation is dropping the operation future; an elapsed deadline
/// surfaces as [`crate::DaoError::Timeout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecContext {
    deadline: Option<Instant>,
}

impl ExecContext {
    /// A context with no deadline of its own
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The effective deadline: our own, or `now + fallback` when we have none
    pub fn deadline_or(&self, fallback: Option<Duration>) -> Option<Instant> {
        self.deadline
            .or_else(|| fallback.map(|timeout| Instant::now() + timeout))
    }
}
