//! Envelope, routing, and error types for broker traffic.

mod delivery;
mod error;
mod event;
mod pattern;

pub use delivery::{Acknowledger, Delivery};
pub use error::{BrokerError, RemoteError, RemoteErrorKind, RpcReply};
pub use event::{DomainEvent, ParseRoutingKeyError, RoutingKey};
pub use pattern::{ParsePatternError, RequestPattern};
