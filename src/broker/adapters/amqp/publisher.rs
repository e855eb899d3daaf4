//! Topic-exchange event publisher.

use async_trait::async_trait;
use lapin::BasicProperties;
use lapin::options::BasicPublishOptions;
use std::sync::Arc;

use super::{AmqpConnector, JSON_CONTENT_TYPE};
use crate::broker::{
    domain::{BrokerError, DomainEvent},
    ports::EventPublisher,
};

const PERSISTENT: u8 = 2;

/// Publishes domain events as persistent JSON messages.
#[derive(Clone)]
pub struct AmqpEventPublisher {
    connector: Arc<AmqpConnector>,
}

impl AmqpEventPublisher {
    /// Creates a publisher on the shared connector.
    #[must_use]
    pub const fn new(connector: Arc<AmqpConnector>) -> Self {
        Self { connector }
    }

    async fn try_publish(&self, event: &DomainEvent) -> Result<(), BrokerError> {
        let body = serde_json::to_vec(event.payload())?;
        let channel = self.connector.channel().await?;
        let confirmation = channel
            .basic_publish(
                self.connector.exchange(),
                event.routing_key().as_str(),
                BasicPublishOptions::default(),
                &body,
                event_properties(event),
            )
            .await
            .map_err(BrokerError::operation)?
            .await
            .map_err(BrokerError::operation)?;

        if confirmation.is_nack() {
            tracing::warn!(
                routing_key = %event.routing_key(),
                event_id = %event.event_id(),
                "broker rejected event, dropping it"
            );
        }
        Ok(())
    }
}

fn event_properties(event: &DomainEvent) -> BasicProperties {
    let timestamp = u64::try_from(event.occurred_at().timestamp()).unwrap_or_default();
    BasicProperties::default()
        .with_message_id(event.event_id().to_string().into())
        .with_content_type(JSON_CONTENT_TYPE.into())
        .with_delivery_mode(PERSISTENT)
        .with_timestamp(timestamp)
}

#[async_trait]
impl EventPublisher for AmqpEventPublisher {
    async fn publish(&self, event: &DomainEvent) {
        match self.try_publish(event).await {
            Ok(()) => tracing::debug!(
                routing_key = %event.routing_key(),
                event_id = %event.event_id(),
                "event published"
            ),
            Err(err) => tracing::warn!(
                routing_key = %event.routing_key(),
                event_id = %event.event_id(),
                error = %err,
                "failed to publish event"
            ),
        }
    }
}
