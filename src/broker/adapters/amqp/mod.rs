//! `RabbitMQ` adapters built on `lapin`.
//!
//! All adapters share one [`AmqpConnector`], which owns the connection and
//! opens it on first use. Events travel over a durable topic exchange;
//! requests use the default exchange with the direct reply-to queue for the
//! response leg.

mod connector;
mod publisher;
mod rpc;
mod source;

pub use connector::AmqpConnector;
pub use publisher::AmqpEventPublisher;
pub use rpc::{AmqpMessageClient, AmqpRpcServer};
pub use source::AmqpEventSource;

/// Pseudo-queue `RabbitMQ` uses for direct reply-to.
pub const DIRECT_REPLY_TO: &str = "amq.rabbitmq.reply-to";

/// Content type stamped on every message.
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[cfg(test)]
mod tests;
