//! Serves the `notifications.*` request patterns.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

use super::{
    ListNotificationsPayload, NotificationRefPayload, NotificationResponse, NotificationService,
    SuccessResponse, UserPayload,
};
use crate::broker::{
    domain::{RemoteError, RemoteErrorKind, RequestPattern},
    ports::RequestHandler,
};
use crate::notification::{NotificationError, ports::NotificationRepository};

/// Request handler registered for the `notifications` service prefix.
pub struct NotificationRequestHandler<R: NotificationRepository + ?Sized> {
    service: Arc<NotificationService<R>>,
}

impl<R: NotificationRepository + ?Sized> NotificationRequestHandler<R> {
    /// Creates a handler dispatching to `service`.
    #[must_use]
    pub const fn new(service: Arc<NotificationService<R>>) -> Self {
        Self { service }
    }

    async fn list(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: ListNotificationsPayload = decode(payload)?;
        let page = self
            .service
            .list(request.user_id, request.limit, request.offset)
            .await?;
        encode(&page.map(|record| NotificationResponse::from(&record)))
    }

    async fn get(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: NotificationRefPayload = decode(payload)?;
        let found = self
            .service
            .get(request.notification_id, request.user_id)
            .await?;
        encode(&found.as_ref().map(NotificationResponse::from))
    }

    async fn mark_read(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: NotificationRefPayload = decode(payload)?;
        let updated = self
            .service
            .mark_read(request.notification_id, request.user_id)
            .await?
            .ok_or_else(|| {
                RemoteError::new(
                    RemoteErrorKind::NotFound,
                    format!("notification not found: {}", request.notification_id),
                )
            })?;
        encode(&NotificationResponse::from(&updated))
    }

    async fn mark_all_read(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: UserPayload = decode(payload)?;
        self.service.mark_all_read(request.user_id).await?;
        encode(&SuccessResponse::OK)
    }

    async fn delete(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: NotificationRefPayload = decode(payload)?;
        self.service
            .delete(request.notification_id, request.user_id)
            .await?;
        encode(&SuccessResponse::OK)
    }
}

#[async_trait]
impl<R: NotificationRepository + ?Sized + 'static> RequestHandler for NotificationRequestHandler<R> {
    async fn handle(&self, pattern: RequestPattern, payload: Value) -> Result<Value, RemoteError> {
        match pattern {
            RequestPattern::NotificationGetByUser => self.list(payload).await,
            RequestPattern::NotificationGetById => self.get(payload).await,
            RequestPattern::NotificationMarkAsRead => self.mark_read(payload).await,
            RequestPattern::NotificationMarkAllAsRead => self.mark_all_read(payload).await,
            RequestPattern::NotificationDelete => self.delete(payload).await,
            other => Err(RemoteError::new(
                RemoteErrorKind::UnknownPattern,
                format!("{other} is not served by the notifications service"),
            )),
        }
    }
}

impl From<NotificationError> for RemoteError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Repository(inner) => {
                tracing::error!(error = %inner, "notification storage failure");
                Self::new(RemoteErrorKind::Storage, "notification storage unavailable")
            }
            NotificationError::Template { .. } | NotificationError::Payload { .. } => {
                Self::validation(err.to_string())
            }
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, RemoteError> {
    serde_json::from_value(payload)
        .map_err(|err| RemoteError::validation(format!("malformed payload: {err}")))
}

fn encode(body: &impl Serialize) -> Result<Value, RemoteError> {
    serde_json::to_value(body).map_err(|err| {
        RemoteError::new(
            RemoteErrorKind::Storage,
            format!("response not serializable: {err}"),
        )
    })
}
