//! Inbound event stream.

use crate::broker::domain::{BrokerError, Delivery};
use async_trait::async_trait;

/// Yields event deliveries from a subscribed queue.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Waits for the next delivery.
    ///
    /// Returns `Ok(None)` once the source is closed and will yield nothing
    /// more.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on transport failure.
    async fn next_delivery(&self) -> Result<Option<Delivery>, BrokerError>;
}
