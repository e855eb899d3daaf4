//! Message broker plumbing shared by the task and notification services.
//!
//! Services never talk to `RabbitMQ` directly. They publish [`DomainEvent`]s
//! through the [`EventPublisher`] port, issue request/response calls through
//! [`MessageClient`], and consume events from an [`EventSource`]. The module
//! follows the same hexagonal split as the rest of the crate:
//!
//! - Envelope and routing types in [`domain`]
//! - Transport contracts in [`ports`]
//! - In-memory and AMQP implementations in [`adapters`]
//! - Bounded handler concurrency for consume loops in [`runtime`]
//!
//! [`DomainEvent`]: domain::DomainEvent
//! [`EventPublisher`]: ports::EventPublisher
//! [`MessageClient`]: ports::MessageClient
//! [`EventSource`]: ports::EventSource

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod runtime;

#[cfg(test)]
mod tests;
