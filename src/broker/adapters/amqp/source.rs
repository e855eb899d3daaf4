//! Queue consumer bound to event routing keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use lapin::acker::Acker;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::Consumer;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::AmqpConnector;
use crate::broker::{
    domain::{Acknowledger, BrokerError, Delivery, DomainEvent, RoutingKey},
    ports::EventSource,
};

/// Durable queue subscription with a bounded prefetch window.
pub struct AmqpEventSource {
    consumer: Mutex<Consumer>,
}

impl AmqpEventSource {
    /// Declares `queue`, binds it to `keys` on the event exchange, and starts
    /// consuming with at most `prefetch` unacknowledged deliveries.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when any declaration fails.
    pub async fn bind(
        connector: &AmqpConnector,
        queue: &str,
        keys: &[RoutingKey],
        prefetch: u16,
    ) -> Result<Self, BrokerError> {
        let channel = connector.create_channel().await?;
        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(BrokerError::connection)?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;
        for key in keys {
            channel
                .queue_bind(
                    queue,
                    connector.exchange(),
                    key.as_str(),
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(BrokerError::connection)?;
        }
        let consumer = channel
            .basic_consume(
                queue,
                &format!("{queue}-{}", Uuid::new_v4()),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;
        tracing::info!(queue, prefetch, "consuming events");
        Ok(Self {
            consumer: Mutex::new(consumer),
        })
    }
}

#[async_trait]
impl EventSource for AmqpEventSource {
    async fn next_delivery(&self) -> Result<Option<Delivery>, BrokerError> {
        loop {
            let next = self.consumer.lock().await.next().await;
            let Some(received) = next else {
                return Ok(None);
            };
            let delivery = received.map_err(BrokerError::operation)?;
            match decode_event(&delivery) {
                Ok(event) => {
                    let acker = AmqpAcker(delivery.acker);
                    return Ok(Some(Delivery::new(
                        event,
                        delivery.redelivered,
                        Box::new(acker),
                    )));
                }
                Err(err) => {
                    tracing::warn!(
                        routing_key = delivery.routing_key.as_str(),
                        error = %err,
                        "discarding undecodable delivery"
                    );
                    delivery
                        .acker
                        .ack(BasicAckOptions::default())
                        .await
                        .map_err(BrokerError::operation)?;
                }
            }
        }
    }
}

fn decode_event(delivery: &lapin::message::Delivery) -> Result<DomainEvent, BrokerError> {
    let routing_key = RoutingKey::try_from(delivery.routing_key.as_str())
        .map_err(|err| BrokerError::Serialization(err.to_string()))?;
    let payload: Value = serde_json::from_slice(&delivery.data)?;
    let event_id = delivery
        .properties
        .message_id()
        .as_ref()
        .and_then(|id| Uuid::parse_str(id.as_str()).ok())
        .unwrap_or_else(|| DomainEvent::content_id(routing_key, &delivery.data));
    let occurred_at = (*delivery.properties.timestamp())
        .and_then(|seconds| i64::try_from(seconds).ok())
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .unwrap_or_else(Utc::now);
    Ok(DomainEvent::from_parts(
        event_id,
        routing_key,
        occurred_at,
        payload,
    ))
}

struct AmqpAcker(Acker);

#[async_trait]
impl Acknowledger for AmqpAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map_err(BrokerError::operation)?;
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.0
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await
            .map_err(BrokerError::operation)?;
        Ok(())
    }
}
