//! Per-user notifications derived from task events.
//!
//! The fan-out consumer subscribes to the task event topics, expands each
//! event into one record per interested user, and stores them. Records are
//! then read and marked read through [`services::NotificationService`].
//!
//! Redelivered events never produce duplicate records: every record carries
//! a [`domain::DedupeKey`] derived from the event id, the recipient, and the
//! notification type, and the repository ignores a second insert with the
//! same key.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

pub use services::NotificationError;

#[cfg(test)]
mod tests;
