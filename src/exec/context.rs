//! Per-execution context and planner configuration. The context carries an
//! optional deadline and a cancel flag; every stage checks it between clauses
//! and phases, so cancellation and timeouts surface as their own error kinds
//! instead of partially built tables.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Planner knobs: the capacity of the per-clause triple channels and the
/// slice size for bulked mutations.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub chan_size: usize,
    pub bulk_size: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig { chan_size: 100, bulk_size: 1000 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Context::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Context { deadline: Some(deadline), cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Context::with_deadline(Instant::now() + timeout)
    }

    /// Flag the context as cancelled; every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cooperative suspension point: fails once cancelled or past the
    /// deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
