//! Task aggregate root, its enumerations, and partial-update diffing.

use super::{
    HistoryAction, ParseTaskPriorityError, ParseTaskStatusError, TaskId, TaskValidationError,
    UserId,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Workflow status of a task.
///
/// Any status may follow any other; no transition is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
    /// Urgent.
    Urgent,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

/// Validated task title of 3 to 160 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    const MIN_CHARS: usize = 3;
    const MAX_CHARS: usize = 160;

    /// Creates a trimmed, length-checked title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskValidationError::TitleLength`] when the trimmed title
    /// has fewer than 3 or more than 160 characters.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TaskValidationError> {
        let trimmed = value.as_ref().trim();
        let length = trimmed.chars().count();
        if !(Self::MIN_CHARS..=Self::MAX_CHARS).contains(&length) {
            return Err(TaskValidationError::TitleLength(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses a client-supplied due date.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates, the latter
/// taken as midnight UTC.
///
/// # Errors
///
/// Returns [`TaskValidationError::InvalidDueDate`] for anything else.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, TaskValidationError> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| TaskValidationError::InvalidDueDate(raw.to_owned()))
}

/// Removes repeated assignees, keeping first-seen order.
#[must_use]
pub fn unique_assignees(ids: impl IntoIterator<Item = UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Task aggregate root.
///
/// Comments and history are separate records owned by the task and loaded
/// through the repository on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: TaskPriority,
    status: TaskStatus,
    created_by: UserId,
    assignee_ids: Vec<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Creator of the task.
    pub created_by: UserId,
    /// Assignees in stored order.
    pub assignee_ids: Vec<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task with status `todo` and priority `medium`.
    #[must_use]
    pub fn new(title: TaskTitle, created_by: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title,
            description: None,
            due_date: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            created_by,
            assignee_ids: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the description of a new task.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date of a new task.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the priority of a new task.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignees of a new task, dropping duplicates.
    #[must_use]
    pub fn with_assignees(mut self, assignee_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.assignee_ids = unique_assignees(assignee_ids);
        self
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            priority: data.priority,
            status: data.status,
            created_by: data.created_by,
            assignee_ids: data.assignee_ids,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the assignees without duplicates.
    #[must_use]
    pub fn assignee_ids(&self) -> &[UserId] {
        &self.assignee_ids
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update and reports each field that changed.
    ///
    /// All input is validated before any field is touched, so a rejected
    /// patch leaves the task unchanged. Fields equal to the current value
    /// are not changes; assignees compare as a set. `updated_at` moves only
    /// when at least one change is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskValidationError`] for an out-of-range title or an
    /// unparseable due date.
    pub fn apply_patch(
        &mut self,
        patch: &TaskPatch,
        clock: &impl Clock,
    ) -> Result<Vec<TaskChange>, TaskValidationError> {
        let title = patch.title.as_deref().map(TaskTitle::new).transpose()?;
        let due_date = patch.due_date.as_deref().map(parse_due_date).transpose()?;

        let mut changes = Vec::new();
        if let Some(new_title) = title.filter(|candidate| *candidate != self.title) {
            changes.push(TaskChange::Title(new_title.as_str().to_owned()));
            self.title = new_title;
        }
        if let Some(description) = patch
            .description
            .as_ref()
            .filter(|candidate| self.description.as_ref() != Some(*candidate))
        {
            changes.push(TaskChange::Description(description.clone()));
            self.description = Some(description.clone());
        }
        if let Some(new_due) = due_date.filter(|candidate| self.due_date != Some(*candidate)) {
            changes.push(TaskChange::DueDate(new_due));
            self.due_date = Some(new_due);
        }
        if let Some(priority) = patch.priority.filter(|candidate| *candidate != self.priority) {
            changes.push(TaskChange::Priority(priority));
            self.priority = priority;
        }
        if let Some(status) = patch.status.filter(|candidate| *candidate != self.status) {
            changes.push(TaskChange::Status {
                old: self.status,
                new: status,
            });
            self.status = status;
        }
        if let Some(incoming) = patch.assignee_ids.as_ref() {
            let current: BTreeSet<_> = self.assignee_ids.iter().copied().collect();
            let requested: BTreeSet<_> = incoming.iter().copied().collect();
            if current != requested {
                let assignees = unique_assignees(incoming.iter().copied());
                changes.push(TaskChange::Assignees(assignees.clone()));
                self.assignee_ids = assignees;
            }
        }

        if !changes.is_empty() {
            self.updated_at = clock.utc();
        }
        Ok(changes)
    }

    /// Sets the status unconditionally and returns the previous one.
    ///
    /// Unlike [`Task::apply_patch`], setting the current status again still
    /// counts as a modification.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) -> TaskStatus {
        let previous = self.status;
        self.status = status;
        self.updated_at = clock.utc();
        previous
    }
}

/// Partial update of a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement due date, unparsed.
    pub due_date: Option<String>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Replacement status.
    pub status: Option<TaskStatus>,
    /// Replacement assignee set.
    pub assignee_ids: Option<Vec<UserId>>,
}

impl TaskPatch {
    /// Whether the patch names no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.assignee_ids.is_none()
    }
}

/// One field that an update actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// New title.
    Title(String),
    /// New description.
    Description(String),
    /// New due date.
    DueDate(DateTime<Utc>),
    /// New priority.
    Priority(TaskPriority),
    /// Status moved from `old` to `new`.
    Status {
        /// Status before the update.
        old: TaskStatus,
        /// Status after the update.
        new: TaskStatus,
    },
    /// New assignee set.
    Assignees(Vec<UserId>),
}

impl TaskChange {
    /// Returns the history action recorded for this change.
    #[must_use]
    pub const fn action(&self) -> HistoryAction {
        match self {
            Self::Status { .. } => HistoryAction::StatusChanged,
            Self::Assignees(_) => HistoryAction::AssigneeChanged,
            Self::Title(_) | Self::Description(_) | Self::DueDate(_) | Self::Priority(_) => {
                HistoryAction::TaskUpdated
            }
        }
    }

    /// Returns the history metadata describing this change.
    #[must_use]
    pub fn metadata(&self) -> Value {
        match self {
            Self::Title(title) => field_change("title", json!(title)),
            Self::Description(description) => field_change("description", json!(description)),
            Self::DueDate(due_date) => field_change(
                "dueDate",
                json!(due_date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
            Self::Priority(priority) => field_change("priority", json!(priority.as_str())),
            Self::Status { old, new } => {
                json!({ "oldStatus": old.as_str(), "newStatus": new.as_str() })
            }
            Self::Assignees(ids) => json!({ "assigneeIds": ids }),
        }
    }
}

fn field_change(field: &str, value: Value) -> Value {
    json!({ "field": field, "value": value })
}
