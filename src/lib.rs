//! Tasktrack: collaborative task tracking with notification fan-out.
//!
//! Two services share this crate. The tasks service owns the task
//! lifecycle: every mutation is validated, stored together with its history
//! trail, and announced on the broker. The notifications service consumes
//! those announcements and turns them into per-user notifications that can be
//! listed and acknowledged. A gateway client sits in front of both and turns
//! broker failures into caller-friendly outcomes.
//!
//! # Architecture
//!
//! Each context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`,
//!   `RabbitMQ`, in-memory)
//! - **Services**: Use cases composed from ports
//!
//! # Modules
//!
//! - [`broker`]: Event envelope, request patterns and transports
//! - [`task`]: Task mutation pipeline and the tasks request surface
//! - [`notification`]: Fan-out consumer and notification queries
//! - [`gateway`]: Timeout-bounded client with read degradation
//! - [`config`]: Layered configuration
//! - [`telemetry`]: Structured logging

pub mod broker;
pub mod config;
pub mod gateway;
pub mod notification;
pub mod task;
pub mod telemetry;

#[cfg(test)]
mod test_support;
