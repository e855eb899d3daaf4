//! Consume-loop plumbing shared by request servers and event consumers.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::domain::BrokerError;

/// Why a consume loop returned without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The caller's shutdown signal resolved.
    Requested,
    /// The broker ended the stream while no shutdown was requested.
    SourceClosed,
}

impl StopReason {
    /// Treats a stream that ended on its own as a failure.
    ///
    /// Long-running services use this so a dropped broker connection exits
    /// with a non-zero status instead of looking like a clean shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Closed`] for [`StopReason::SourceClosed`].
    pub const fn expect_requested(self) -> Result<(), BrokerError> {
        match self {
            Self::Requested => Ok(()),
            Self::SourceClosed => Err(BrokerError::Closed),
        }
    }
}

/// Bounds how many handlers run at once and waits for them on shutdown.
#[derive(Debug)]
pub struct InFlight {
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl InFlight {
    /// Allows up to `capacity` concurrent handlers. Zero is raised to one.
    #[must_use]
    pub fn new(capacity: u16) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(usize::from(capacity))),
            capacity: u32::from(capacity),
        }
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Closed`] if the pool has been shut.
    pub async fn reserve(&self) -> Result<Slot, BrokerError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| BrokerError::Closed)?;
        Ok(Slot { permit })
    }

    /// Number of slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits until every spawned handler has finished.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Closed`] if the pool has been shut.
    pub async fn drain(&self) -> Result<(), BrokerError> {
        let all = self
            .permits
            .acquire_many(self.capacity)
            .await
            .map_err(|_| BrokerError::Closed)?;
        drop(all);
        Ok(())
    }
}

/// A reserved handler slot, released when the spawned task finishes.
#[derive(Debug)]
pub struct Slot {
    permit: OwnedSemaphorePermit,
}

impl Slot {
    /// Runs `task` in the background while holding the slot.
    pub fn spawn<F>(self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self { permit } = self;
        tokio::spawn(async move {
            task.await;
            drop(permit);
        });
    }
}
