//! Expands task events into per-user notification records.

use mockable::Clock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::MessageTemplates;
use crate::broker::domain::{DomainEvent, RoutingKey};
use crate::notification::{
    NotificationError,
    domain::{
        CommentEventPayload, DedupeKey, NotificationRecord, NotificationType, TaskEventPayload,
    },
    ports::NotificationRepository,
};
use crate::task::domain::{TaskId, UserId, unique_assignees};

/// Switches for optional fan-out rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSettings {
    /// Notify assignees about new comments.
    pub notify_on_comment: bool,
}

/// Derives notifications from task events and stores them.
///
/// - `task:created` notifies every assignee with `task_assigned`.
/// - `task:updated` notifies every assignee with `task_updated`, but only
///   when the status actually changed.
/// - `comment:new` notifies assignees other than the author with
///   `comment_added` when [`FanOutSettings::notify_on_comment`] is set.
pub struct NotificationFanOut<R, C>
where
    R: NotificationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    templates: MessageTemplates,
    settings: FanOutSettings,
}

/// One recipient group for an event.
struct Audience<'a> {
    event_id: uuid::Uuid,
    task_id: TaskId,
    kind: NotificationType,
    recipients: Vec<UserId>,
    context: &'a Map<String, Value>,
}

impl<R, C> NotificationFanOut<R, C>
where
    R: NotificationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a fan-out with default templates and settings.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            templates: MessageTemplates::default(),
            settings: FanOutSettings::default(),
        }
    }

    /// Replaces the message templates.
    #[must_use]
    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Replaces the fan-out settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: FanOutSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the records an event should produce without storing them.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Payload`] when the event body is
    /// malformed and [`NotificationError::Template`] when a message fails to
    /// render.
    pub fn expand(&self, event: &DomainEvent) -> Result<Vec<NotificationRecord>, NotificationError> {
        match event.routing_key() {
            RoutingKey::TaskCreated => {
                let payload: TaskEventPayload = decode(event)?;
                let context = context_for(&payload.title, None);
                self.build(&Audience {
                    event_id: event.event_id(),
                    task_id: payload.id,
                    kind: NotificationType::TaskAssigned,
                    recipients: unique_assignees(payload.assignee_ids),
                    context: &context,
                })
            }
            RoutingKey::TaskUpdated => {
                let payload: TaskEventPayload = decode(event)?;
                let Some(status) = payload.status_transition() else {
                    return Ok(Vec::new());
                };
                let context = context_for(&payload.title, Some(status));
                self.build(&Audience {
                    event_id: event.event_id(),
                    task_id: payload.id,
                    kind: NotificationType::TaskUpdated,
                    recipients: unique_assignees(payload.assignee_ids.iter().copied()),
                    context: &context,
                })
            }
            RoutingKey::CommentNew => {
                if !self.settings.notify_on_comment {
                    return Ok(Vec::new());
                }
                let payload: CommentEventPayload = decode(event)?;
                let context = context_for(&payload.title, None);
                let author = payload.author_id;
                self.build(&Audience {
                    event_id: event.event_id(),
                    task_id: payload.task_id,
                    kind: NotificationType::CommentAdded,
                    recipients: unique_assignees(
                        payload.assignee_ids.into_iter().filter(|user| *user != author),
                    ),
                    context: &context,
                })
            }
        }
    }

    /// Expands `event` and stores the resulting records.
    ///
    /// Returns how many records were newly stored; records already stored
    /// by an earlier delivery of the same event are not counted.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when expansion or storage fails.
    pub async fn handle(&self, event: &DomainEvent) -> Result<usize, NotificationError> {
        let records = self.expand(event)?;
        if records.is_empty() {
            tracing::debug!(
                routing_key = %event.routing_key(),
                event_id = %event.event_id(),
                "event produced no notifications"
            );
            return Ok(0);
        }
        let inserted = self.repository.insert(&records).await?;
        tracing::info!(
            routing_key = %event.routing_key(),
            event_id = %event.event_id(),
            derived = records.len(),
            inserted,
            "notifications stored"
        );
        Ok(inserted)
    }

    fn build(&self, audience: &Audience<'_>) -> Result<Vec<NotificationRecord>, NotificationError> {
        if audience.recipients.is_empty() {
            return Ok(Vec::new());
        }
        let message = self.templates.render(audience.kind, audience.context)?;
        Ok(audience
            .recipients
            .iter()
            .map(|user| {
                NotificationRecord::new(
                    DedupeKey::derive(audience.event_id, *user, audience.kind),
                    *user,
                    audience.kind,
                    message.clone(),
                    &*self.clock,
                )
                .with_related_task(audience.task_id)
            })
            .collect())
    }
}

fn decode<T: DeserializeOwned>(event: &DomainEvent) -> Result<T, NotificationError> {
    serde_json::from_value(event.payload().clone()).map_err(|err| NotificationError::Payload {
        routing_key: event.routing_key(),
        reason: err.to_string(),
    })
}

fn context_for(title: &str, status: Option<&str>) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("title".to_owned(), Value::String(title.to_owned()));
    if let Some(new_status) = status {
        context.insert("status".to_owned(), Value::String(new_status.to_owned()));
    }
    context
}
