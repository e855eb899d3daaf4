//! Request/response messaging between services.

use super::EventPublisher;
use crate::broker::domain::{BrokerError, RequestPattern};
use async_trait::async_trait;
use serde_json::Value;

/// Client side of the inter-service messaging contract.
///
/// `send` performs a request/response round trip; event publication comes
/// from the [`EventPublisher`] supertrait.
#[async_trait]
pub trait MessageClient: EventPublisher {
    /// Sends a request and waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Remote`] when the callee rejected the request,
    /// [`BrokerError::Timeout`] when no reply arrived in time, and other
    /// variants for transport failures.
    async fn send(&self, pattern: RequestPattern, payload: Value) -> Result<Value, BrokerError>;
}
