//! Fire-and-forget event publication.

use crate::broker::domain::DomainEvent;
use async_trait::async_trait;

/// Publishes domain events to the topic exchange.
///
/// Delivery is best-effort: implementations log failures and negative
/// acknowledgements instead of returning them, because publication happens
/// after the originating state change has already committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event under its routing key.
    async fn publish(&self, event: &DomainEvent);
}
