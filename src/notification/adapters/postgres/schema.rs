//! Diesel schema for notification persistence.

diesel::table! {
    /// Per-user notification records.
    notifications (id) {
        /// Record identifier.
        id -> Uuid,
        /// Recipient user id.
        user_id -> Uuid,
        /// Notification type tag.
        #[sql_name = "type"]
        #[max_length = 50]
        kind -> Varchar,
        /// Rendered message.
        message -> Text,
        /// Related task, if any.
        related_task_id -> Nullable<Uuid>,
        /// Read flag.
        is_read -> Bool,
        /// Hex SHA-256 idempotency key, unique.
        #[max_length = 64]
        dedupe_key -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
