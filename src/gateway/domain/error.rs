//! Errors surfaced to gateway callers.

use crate::broker::domain::{BrokerError, RemoteErrorKind, RequestPattern};
use thiserror::Error;

/// Failure of a gateway mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The owning service did not answer in time or could not be reached.
    #[error("{service} service unavailable: {reason}")]
    ServiceUnavailable {
        /// Service prefix of the failed pattern.
        service: &'static str,
        /// Transport diagnostic.
        reason: String,
    },

    /// The owning service handled the request and rejected it.
    #[error("{pattern} rejected ({kind:?}): {message}")]
    Rejected {
        /// Rejected pattern.
        pattern: RequestPattern,
        /// Rejection category.
        kind: RemoteErrorKind,
        /// Rejection detail from the service.
        message: String,
    },

    /// A request or reply body did not match the expected shape.
    #[error("malformed {pattern} exchange: {reason}")]
    Serialization {
        /// Pattern whose body was malformed.
        pattern: RequestPattern,
        /// Codec diagnostic.
        reason: String,
    },
}

impl GatewayError {
    /// Classifies a transport failure for `pattern`.
    #[must_use]
    pub fn from_broker(pattern: RequestPattern, err: BrokerError) -> Self {
        match err {
            BrokerError::Remote(remote) => Self::Rejected {
                pattern,
                kind: remote.kind,
                message: remote.message,
            },
            BrokerError::Serialization(reason) => Self::Serialization { pattern, reason },
            other => Self::ServiceUnavailable {
                service: pattern.service(),
                reason: other.to_string(),
            },
        }
    }

    /// Whether the failure means the service was unreachable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }
}
