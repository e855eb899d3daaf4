//! Broker adapter implementations.

pub mod amqp;
pub mod memory;
