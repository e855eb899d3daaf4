//! Gateway error model.

mod error;

pub use error::GatewayError;
