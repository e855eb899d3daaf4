//! Client-facing aggregation over the task and notification services.
//!
//! The gateway never touches storage. Every call is a request/response
//! round trip through a [`MessageClient`] with a bounded wait. Failures are
//! treated asymmetrically:
//!
//! - Reads degrade to an empty collection or `None` and log a warning.
//! - Mutations surface [`GatewayError`] so the caller can report them.
//!
//! [`MessageClient`]: crate::broker::ports::MessageClient

pub mod domain;
pub mod services;

pub use domain::GatewayError;
pub use services::GatewayClient;

#[cfg(test)]
mod tests;
