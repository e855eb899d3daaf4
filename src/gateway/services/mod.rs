//! Gateway services.

mod client;

pub use client::{DEFAULT_REQUEST_TIMEOUT, GatewayClient};
