//! Domain event envelope published on the topic exchange.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Topic routing keys understood by event consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingKey {
    /// A task was created.
    #[serde(rename = "task:created")]
    TaskCreated,
    /// One or more task fields changed.
    #[serde(rename = "task:updated")]
    TaskUpdated,
    /// A comment was added to a task.
    #[serde(rename = "comment:new")]
    CommentNew,
}

impl RoutingKey {
    /// Every routing key, in declaration order.
    pub const ALL: [Self; 3] = [Self::TaskCreated, Self::TaskUpdated, Self::CommentNew];

    /// Returns the wire representation of the routing key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task:created",
            Self::TaskUpdated => "task:updated",
            Self::CommentNew => "comment:new",
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a routing key string is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown routing key: {0}")]
pub struct ParseRoutingKeyError(pub String);

impl TryFrom<&str> for RoutingKey {
    type Error = ParseRoutingKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| ParseRoutingKeyError(value.to_owned()))
    }
}

/// A fire-and-forget change notification travelling through the broker.
///
/// The `event_id` is stable across redeliveries and is what consumers use to
/// deduplicate at-least-once traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    event_id: Uuid,
    routing_key: RoutingKey,
    occurred_at: DateTime<Utc>,
    payload: Value,
}

impl DomainEvent {
    /// Creates a new event with a fresh identifier stamped by `clock`.
    #[must_use]
    pub fn new(routing_key: RoutingKey, payload: Value, clock: &impl Clock) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            routing_key,
            occurred_at: clock.utc(),
            payload,
        }
    }

    /// Reconstructs an event received from the wire.
    #[must_use]
    pub const fn from_parts(
        event_id: Uuid,
        routing_key: RoutingKey,
        occurred_at: DateTime<Utc>,
        payload: Value,
    ) -> Self {
        Self {
            event_id,
            routing_key,
            occurred_at,
            payload,
        }
    }

    /// Derives a deterministic event identifier from the message content.
    ///
    /// Used when a producer did not stamp a message id, so identical
    /// redeliveries still collapse onto one identifier.
    #[must_use]
    pub fn content_id(routing_key: RoutingKey, body: &[u8]) -> Uuid {
        let mut hasher = Sha256::new();
        hasher.update(routing_key.as_str().as_bytes());
        hasher.update(body);
        let digest = hasher.finalize();
        let mut bytes = [0_u8; 16];
        bytes.copy_from_slice(digest.get(..16).unwrap_or(&[0_u8; 16]));
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Returns the routing key.
    #[must_use]
    pub const fn routing_key(&self) -> RoutingKey {
        self.routing_key
    }

    /// Returns when the event was produced.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the JSON payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}
