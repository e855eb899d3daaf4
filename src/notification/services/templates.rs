//! Message templates for each notification type.

use crate::notification::{NotificationError, domain::NotificationType};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `minijinja` templates used to render notification messages.
///
/// Templates see `title` (task title) and, for status changes, `status`
/// (the new status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    /// Sent to each assignee of a new task.
    pub task_assigned: String,
    /// Sent to each assignee when the status changes.
    pub task_updated: String,
    /// Sent to each assignee other than the author of a new comment.
    pub comment_added: String,
    /// Sent when a task is completed.
    pub task_completed: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            task_assigned: "You were assigned to the task: {{ title }}".to_owned(),
            task_updated: "Task \"{{ title }}\" changed to: {{ status }}".to_owned(),
            comment_added: "New comment on task: {{ title }}".to_owned(),
            task_completed: "Task \"{{ title }}\" was completed".to_owned(),
        }
    }
}

impl MessageTemplates {
    /// Returns the template source for `kind`.
    #[must_use]
    pub fn template(&self, kind: NotificationType) -> &str {
        match kind {
            NotificationType::TaskAssigned => &self.task_assigned,
            NotificationType::TaskUpdated => &self.task_updated,
            NotificationType::CommentAdded => &self.comment_added,
            NotificationType::TaskCompleted => &self.task_completed,
        }
    }

    /// Renders the message for `kind` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Template`] when the template does not
    /// parse or fails to evaluate.
    pub fn render(
        &self,
        kind: NotificationType,
        context: &Map<String, Value>,
    ) -> Result<String, NotificationError> {
        let environment = Environment::new();
        environment
            .render_str(self.template(kind), context)
            .map_err(|error| NotificationError::Template {
                kind,
                reason: error.to_string(),
            })
    }
}
