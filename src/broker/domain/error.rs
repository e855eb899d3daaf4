//! Broker transport errors and the remote error envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by broker adapters.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// The broker connection or channel could not be established.
    #[error("broker connection failed: {0}")]
    Connection(Arc<dyn std::error::Error + Send + Sync>),

    /// Publishing or acknowledging a message failed.
    #[error("broker operation failed: {0}")]
    Operation(Arc<dyn std::error::Error + Send + Sync>),

    /// The peer did not answer within the request timeout.
    #[error("no reply for {pattern} within {timeout:?}")]
    Timeout {
        /// Pattern that timed out.
        pattern: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// A payload could not be encoded or decoded.
    #[error("invalid broker payload: {0}")]
    Serialization(String),

    /// The callee handled the request and rejected it.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The broker or handler is gone.
    #[error("broker is closed")]
    Closed,
}

impl BrokerError {
    /// Wraps a connection-level failure.
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Arc::new(err))
    }

    /// Wraps an operation-level failure.
    pub fn operation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Operation(Arc::new(err))
    }

    /// Whether the failure means the peer was unreachable rather than the
    /// request being rejected.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Category of a rejection returned by a request handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The request payload was malformed or failed validation.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// The callee's storage was unavailable.
    Storage,
    /// The pattern is not served by the callee.
    UnknownPattern,
}

/// Rejection returned by a request handler to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct RemoteError {
    /// Rejection category.
    pub kind: RemoteErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl RemoteError {
    /// Creates a rejection.
    #[must_use]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a validation rejection.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }
}

/// Reply envelope carried on the response leg of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcReply {
    /// Successful handler result.
    Data(Value),
    /// Handler rejection.
    Error(RemoteError),
}

impl RpcReply {
    /// Converts the envelope into a handler result.
    ///
    /// # Errors
    ///
    /// Returns the carried [`RemoteError`] for an error reply.
    pub fn into_result(self) -> Result<Value, RemoteError> {
        match self {
            Self::Data(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

impl From<Result<Value, RemoteError>> for RpcReply {
    fn from(result: Result<Value, RemoteError>) -> Self {
        match result {
            Ok(value) => Self::Data(value),
            Err(err) => Self::Error(err),
        }
    }
}
