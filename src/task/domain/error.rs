//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while validating task input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskValidationError {
    /// The title is too short or too long after trimming.
    #[error("task title must be between 3 and 160 characters, got {0}")]
    TitleLength(usize),

    /// The due date could not be parsed.
    #[error("invalid due date '{0}', expected RFC 3339 or YYYY-MM-DD")]
    InvalidDueDate(String),

    /// The comment is empty after trimming.
    #[error("comment content must not be empty")]
    EmptyComment,

    /// The comment exceeds the length limit.
    #[error("comment content must be at most 2000 characters, got {0}")]
    CommentTooLong(usize),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing history actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history action: {0}")]
pub struct ParseHistoryActionError(pub String);
