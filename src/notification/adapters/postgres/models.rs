//! Diesel row model for notifications.

use super::schema::notifications;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Notification row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub kind: String,
    pub message: String,
    pub related_task_id: Option<uuid::Uuid>,
    pub is_read: bool,
    pub dedupe_key: String,
    pub created_at: DateTime<Utc>,
}
