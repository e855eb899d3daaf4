//! Transport contracts consumed by services.
//!
//! Services depend only on these traits so that tests can run against the
//! in-memory broker and production against `RabbitMQ`.

mod client;
mod handler;
mod publisher;
mod source;

pub use client::MessageClient;
pub use handler::RequestHandler;
#[cfg(test)]
pub use publisher::MockEventPublisher;
pub use publisher::EventPublisher;
pub use source::EventSource;
