use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::store::StoreError;

/// Cooperative cancellation flag shared between a caller and an operation
/// in flight. Mutations check it between per-row steps and roll back when
/// it trips; enumerations simply stop producing elements.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err(StoreError::Cancelled)` once the token has tripped.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
