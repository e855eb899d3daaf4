//! Task mutation for the tasks service.
//!
//! Creating, updating, deleting, and commenting on tasks each run as one
//! unit of work: the change and its history entries are stored together,
//! then a single domain event is published. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
