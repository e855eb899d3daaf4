//! Server side of the request/response contract.

use crate::broker::domain::{RemoteError, RequestPattern};
use async_trait::async_trait;
use serde_json::Value;

/// Serves request patterns owned by one service.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles one request and produces the reply payload.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] that is relayed verbatim to the caller.
    async fn handle(&self, pattern: RequestPattern, payload: Value) -> Result<Value, RemoteError>;
}
