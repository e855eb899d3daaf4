//! Immutable task comments.

use super::{CommentId, TaskId, TaskValidationError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Validated comment body: non-blank and at most 2000 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentContent(String);

impl CommentContent {
    const MAX_CHARS: usize = 2000;

    /// Validates comment content.
    ///
    /// # Errors
    ///
    /// Returns [`TaskValidationError::EmptyComment`] for blank content and
    /// [`TaskValidationError::CommentTooLong`] above 2000 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskValidationError> {
        let content = value.into();
        if content.trim().is_empty() {
            return Err(TaskValidationError::EmptyComment);
        }
        let length = content.chars().count();
        if length > Self::MAX_CHARS {
            return Err(TaskValidationError::CommentTooLong(length));
        }
        Ok(Self(content))
    }

    /// Returns the comment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A comment left on a task. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    task_id: TaskId,
    author_id: UserId,
    content: CommentContent,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment authored now.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        author_id: UserId,
        content: CommentContent,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: CommentId::new(),
            task_id,
            author_id,
            content,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a stored comment.
    #[must_use]
    pub const fn from_persisted(
        id: CommentId,
        task_id: TaskId,
        author_id: UserId,
        content: CommentContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            author_id,
            content,
            created_at,
        }
    }

    /// Returns the comment identifier.
    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> UserId {
        self.author_id
    }

    /// Returns the comment text.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
