//! Domain model for tasks, comments, and their audit trail.
//!
//! Validation lives here: titles, comment bodies, due dates, and the
//! field-by-field diff an update produces. Nothing in this module performs
//! I/O.

mod comment;
mod error;
mod events;
mod history;
mod ids;
mod query;
mod task;

pub use comment::{Comment, CommentContent};
pub use error::{
    ParseHistoryActionError, ParseTaskPriorityError, ParseTaskStatusError, TaskValidationError,
};
pub use events::{CommentCreatedEvent, TaskCreatedEvent, TaskUpdatedEvent};
pub use history::{HistoryAction, HistoryEntry, PersistedHistoryData};
pub use ids::{CommentId, HistoryEntryId, TaskId, UserId};
pub use query::{ListQuery, Page, Pagination, TaskFilter};
pub use task::{
    PersistedTaskData, Task, TaskChange, TaskPatch, TaskPriority, TaskStatus, TaskTitle,
    parse_due_date, unique_assignees,
};
