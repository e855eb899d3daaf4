//! Inbound event deliveries awaiting acknowledgement.

use super::{BrokerError, DomainEvent};
use async_trait::async_trait;

/// Settles one delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Confirms the delivery was processed.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the broker rejects the acknowledgement.
    async fn ack(&self) -> Result<(), BrokerError>;

    /// Rejects the delivery, optionally asking the broker to redeliver it.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the broker rejects the negative
    /// acknowledgement.
    async fn nack(&self, requeue: bool) -> Result<(), BrokerError>;
}

/// One event received from a queue, plus the handle used to settle it.
pub struct Delivery {
    event: DomainEvent,
    redelivered: bool,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    /// Wraps a received event.
    #[must_use]
    pub fn new(event: DomainEvent, redelivered: bool, acker: Box<dyn Acknowledger>) -> Self {
        Self {
            event,
            redelivered,
            acker,
        }
    }

    /// Returns the received event.
    #[must_use]
    pub const fn event(&self) -> &DomainEvent {
        &self.event
    }

    /// Whether the broker flagged this as a redelivery.
    #[must_use]
    pub const fn redelivered(&self) -> bool {
        self.redelivered
    }

    /// Acknowledges the delivery.
    ///
    /// # Errors
    ///
    /// Propagates acknowledgement failures from the adapter.
    pub async fn ack(self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    /// Negatively acknowledges the delivery.
    ///
    /// # Errors
    ///
    /// Propagates negative acknowledgement failures from the adapter.
    pub async fn nack(self, requeue: bool) -> Result<(), BrokerError> {
        self.acker.nack(requeue).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("event", &self.event)
            .field("redelivered", &self.redelivered)
            .finish_non_exhaustive()
    }
}
