//! `PostgreSQL` adapter for notification persistence.

mod models;
mod repository;
mod schema;

pub use repository::{NotificationPgPool, PostgresNotificationRepository};
