//! The single execution slot shared by every run of one controller.
//!
//! At most one run holds the slot; the rest wait in arrival order. There is
//! no timeout: a waiting run blocks until the holder finishes.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Single-permit, FIFO-fair execution slot. Cheap to clone; clones share the permit.
#[derive(Debug, Clone)]
pub struct ExecutionSlot {
    permits: Arc<Semaphore>,
}

impl Default for ExecutionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionSlot {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait for the slot. The slot is released when the returned guard drops.
    pub async fn acquire(&self) -> Result<SlotGuard, AcquireError> {
        let permit = self.permits.clone().acquire_owned().await?;
        Ok(SlotGuard { _permit: permit })
    }

    /// True while some run holds the slot.
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

/// Holds the slot for the duration of one run.
#[derive(Debug)]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
}
