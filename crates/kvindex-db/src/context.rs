use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::DbError;

/// Cooperative cancellation and deadline for one `find`/`iterate`/
/// `indexIterate` call (spec §4.5, §5). Checked once per candidate document
/// (full table scan) or per matched reference (index scan); there is no
/// ambient per-thread context, so this travels explicitly as an argument.
#[derive(Clone, Default)]
pub struct QueryContext {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl QueryContext {
    /// No deadline, no cancellation: runs to completion.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: None,
        }
    }

    pub fn with_cancel_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            deadline: None,
            cancelled: Some(flag),
        }
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub(crate) fn check(&self) -> Result<(), DbError> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::Relaxed) {
                return Err(DbError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DbError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
