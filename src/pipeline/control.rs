use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Shared, idempotent cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Returns `true` only for the call that flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag so the token can guard another run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cancellation and deadline state handed to every job and engine call.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: CancelToken,
    interrupt: Option<CancelToken>,
    deadline: Option<(Instant, Duration)>,
}

impl RunControl {
    /// A control that is never cancelled and has no deadline.
    pub fn unbounded() -> Self {
        Self {
            cancel: CancelToken::new(),
            interrupt: None,
            deadline: None,
        }
    }

    /// Fresh run-local token, optional external interrupt, and a deadline
    /// `timeout` from now. A timeout too large to represent as an instant
    /// means no deadline.
    pub fn new(interrupt: Option<CancelToken>, timeout: Option<Duration>) -> Self {
        Self {
            cancel: CancelToken::new(),
            interrupt,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t).map(|at| (at, t))),
        }
    }

    /// The run-local token the scheduler trips on first failure.
    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
            || self.interrupt.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|(deadline, _)| Instant::now() >= deadline)
    }

    /// Time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|(deadline, _)| deadline.saturating_duration_since(Instant::now()))
    }

    /// `Err(Timeout)` once the deadline has passed, `Err(Cancelled)` once the
    /// run has been cancelled.
    pub fn check(&self) -> Result<()> {
        if let Some((deadline, timeout)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Timeout { timeout });
            }
        }
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
