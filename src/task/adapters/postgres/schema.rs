//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Validated title.
        #[max_length = 160]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Priority tag.
        #[max_length = 16]
        priority -> Varchar,
        /// Status tag.
        #[max_length = 16]
        status -> Varchar,
        /// Creator user id.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Assignee links, unique per task and user.
    task_assignees (task_id, user_id) {
        /// Owning task.
        task_id -> Uuid,
        /// Assigned user.
        user_id -> Uuid,
        /// Position in the assignee list as submitted.
        position -> Int4,
    }
}

diesel::table! {
    /// Task comments.
    task_comments (id) {
        /// Insertion sequence used to order comments sharing a timestamp.
        seq -> Int8,
        /// Comment identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Author user id.
        author_id -> Uuid,
        /// Comment text.
        content -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task history.
    task_history (id) {
        /// Insertion sequence used to order entries sharing a timestamp.
        seq -> Int8,
        /// Entry identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Action tag.
        #[max_length = 64]
        action -> Varchar,
        /// Optional JSON metadata.
        metadata -> Nullable<Jsonb>,
        /// Optional performer user id.
        performed_by -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
