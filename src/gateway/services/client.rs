//! Typed request/response calls to the task and notification services.

use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

use crate::broker::{
    adapters::amqp::{AmqpConnector, AmqpMessageClient},
    domain::RequestPattern,
    ports::MessageClient,
};
use crate::config::AppConfig;
use crate::gateway::GatewayError;
use crate::notification::{
    domain::{NotificationId, NotificationPage},
    services::{
        DEFAULT_LIMIT, ListNotificationsPayload, MAX_LIMIT, NotificationRefPayload,
        NotificationResponse, UserPayload,
    },
};
use crate::task::{
    domain::{Page, TaskFilter, TaskId, TaskStatus, UserId},
    services::{
        CommentResponse, CreateCommentPayload, CreateTaskPayload, DeleteTaskPayload,
        HistoryResponse, ListTasksPayload, TaskIdPayload, TaskResponse, TasksByUserPayload,
        UpdateStatusPayload, UpdateTaskPayload,
    },
};

/// How long a call waits for its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway-side client for every request pattern.
pub struct GatewayClient<M: MessageClient + ?Sized> {
    client: Arc<M>,
    timeout: Duration,
}

impl GatewayClient<AmqpMessageClient> {
    /// Creates a gateway that reaches both services through `RabbitMQ`,
    /// using the queues and request timeout from `config`.
    #[must_use]
    pub fn over_amqp(connector: Arc<AmqpConnector>, config: &AppConfig) -> Self {
        let timeout = config.gateway.request_timeout();
        let client = AmqpMessageClient::for_services(connector, &config.broker, timeout);
        Self::new(Arc::new(client)).with_timeout(timeout)
    }

    /// Returns the queue a pattern is routed to.
    #[must_use]
    pub fn route(&self, pattern: RequestPattern) -> Option<&str> {
        self.client.route(pattern)
    }
}

impl<M: MessageClient + ?Sized> GatewayClient<M> {
    /// Creates a client with the default request timeout.
    #[must_use]
    pub const fn new(client: Arc<M>) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns how long each call waits for its reply.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the tasks service is unavailable or
    /// rejects the request.
    pub async fn create_task(
        &self,
        payload: &CreateTaskPayload,
    ) -> Result<TaskResponse, GatewayError> {
        self.mutate(RequestPattern::TaskCreate, payload).await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the tasks service is unavailable or
    /// rejects the request.
    pub async fn update_task(
        &self,
        payload: &UpdateTaskPayload,
    ) -> Result<TaskResponse, GatewayError> {
        self.mutate(RequestPattern::TaskUpdate, payload).await
    }

    /// Sets the status of a task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the tasks service is unavailable or
    /// rejects the request.
    pub async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        user_id: UserId,
    ) -> Result<TaskResponse, GatewayError> {
        let payload = UpdateStatusPayload {
            task_id,
            status,
            user_id,
        };
        self.mutate(RequestPattern::TaskUpdateStatus, &payload).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the tasks service is unavailable or
    /// rejects the request.
    pub async fn delete_task(&self, task_id: TaskId, user_id: UserId) -> Result<(), GatewayError> {
        let payload = DeleteTaskPayload { task_id, user_id };
        self.mutate::<serde_json::Value>(RequestPattern::TaskDelete, &payload)
            .await
            .map(drop)
    }

    /// Adds a comment to a task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the tasks service is unavailable or
    /// rejects the request.
    pub async fn add_comment(
        &self,
        task_id: TaskId,
        user_id: UserId,
        content: impl Into<String> + Send,
    ) -> Result<CommentResponse, GatewayError> {
        let payload = CreateCommentPayload {
            task_id,
            user_id,
            content: content.into(),
        };
        self.mutate(RequestPattern::CommentCreate, &payload).await
    }

    /// Returns one task with its comments and history, or `None`.
    pub async fn task(&self, task_id: TaskId) -> Option<TaskResponse> {
        self.read(RequestPattern::TaskGetById, &TaskIdPayload::Wrapped { task_id })
            .await
    }

    /// Returns every task.
    pub async fn all_tasks(&self) -> Vec<TaskResponse> {
        self.read(RequestPattern::TaskGetAll, &serde_json::json!({}))
            .await
    }

    /// Returns one page of tasks.
    ///
    /// When the service cannot answer, an empty page with the clamped page
    /// coordinates of the request is returned.
    pub async fn list_tasks(&self, payload: &ListTasksPayload) -> Page<TaskResponse> {
        let pagination = payload.to_query().pagination;
        self.read_or_else(RequestPattern::TaskList, payload, || Page {
            items: Vec::new(),
            total: 0,
            page: pagination.page(),
            page_size: pagination.page_size(),
        })
        .await
    }

    /// Returns tasks created by `user_id` that pass `filter`.
    pub async fn tasks_by_user(&self, user_id: UserId, filter: TaskFilter) -> Vec<TaskResponse> {
        let payload = TasksByUserPayload {
            user_id,
            status: filter.status,
            priority: filter.priority,
        };
        self.read(RequestPattern::TaskGetByUser, &payload).await
    }

    /// Returns the comments of a task, newest first.
    pub async fn comments(&self, task_id: TaskId) -> Vec<CommentResponse> {
        self.read(RequestPattern::CommentGetByTask, &TaskIdPayload::Wrapped { task_id })
            .await
    }

    /// Returns the history of a task, newest first.
    pub async fn history(&self, task_id: TaskId) -> Vec<HistoryResponse> {
        self.read(RequestPattern::TaskGetHistory, &TaskIdPayload::Wrapped { task_id })
            .await
    }

    /// Returns a window of the notifications of `user_id`.
    pub async fn notifications(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> NotificationPage<NotificationResponse> {
        let payload = ListNotificationsPayload {
            user_id,
            limit,
            offset,
        };
        self.read_or_else(RequestPattern::NotificationGetByUser, &payload, || {
            NotificationPage {
                items: Vec::new(),
                total: 0,
                limit: limit
                    .filter(|requested| *requested > 0)
                    .unwrap_or(DEFAULT_LIMIT)
                    .min(MAX_LIMIT),
                offset: offset.unwrap_or_default(),
            }
        })
        .await
    }

    /// Returns one notification of `user_id`, or `None`.
    pub async fn notification(
        &self,
        notification_id: NotificationId,
        user_id: UserId,
    ) -> Option<NotificationResponse> {
        let payload = NotificationRefPayload {
            notification_id,
            user_id,
        };
        self.read(RequestPattern::NotificationGetById, &payload)
            .await
    }

    /// Marks one notification read.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the notifications service is
    /// unavailable or the notification does not exist.
    pub async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
        user_id: UserId,
    ) -> Result<NotificationResponse, GatewayError> {
        let payload = NotificationRefPayload {
            notification_id,
            user_id,
        };
        self.mutate(RequestPattern::NotificationMarkAsRead, &payload)
            .await
    }

    /// Marks every notification of `user_id` read.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the notifications service is
    /// unavailable or rejects the request.
    pub async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.mutate::<serde_json::Value>(
            RequestPattern::NotificationMarkAllAsRead,
            &UserPayload { user_id },
        )
        .await
        .map(drop)
    }

    /// Deletes one notification of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the notifications service is
    /// unavailable or rejects the request.
    pub async fn delete_notification(
        &self,
        notification_id: NotificationId,
        user_id: UserId,
    ) -> Result<(), GatewayError> {
        let payload = NotificationRefPayload {
            notification_id,
            user_id,
        };
        self.mutate::<serde_json::Value>(RequestPattern::NotificationDelete, &payload)
            .await
            .map(drop)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        pattern: RequestPattern,
        payload: &(impl Serialize + Sync),
    ) -> Result<T, GatewayError> {
        let body = serde_json::to_value(payload).map_err(|err| GatewayError::Serialization {
            pattern,
            reason: err.to_string(),
        })?;
        tracing::debug!(%pattern, "forwarding request");
        let reply = tokio::time::timeout(self.timeout, self.client.send(pattern, body))
            .await
            .map_err(|_| GatewayError::ServiceUnavailable {
                service: pattern.service(),
                reason: format!("no reply within {:?}", self.timeout),
            })?
            .map_err(|err| GatewayError::from_broker(pattern, err))?;
        serde_json::from_value(reply).map_err(|err| GatewayError::Serialization {
            pattern,
            reason: err.to_string(),
        })
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        pattern: RequestPattern,
        payload: &(impl Serialize + Sync),
    ) -> Result<T, GatewayError> {
        self.call(pattern, payload).await.inspect_err(|err| {
            tracing::error!(%pattern, error = %err, "mutation failed");
        })
    }

    async fn read<T: DeserializeOwned + Default>(
        &self,
        pattern: RequestPattern,
        payload: &(impl Serialize + Sync),
    ) -> T {
        self.read_or_else(pattern, payload, T::default).await
    }

    async fn read_or_else<T: DeserializeOwned>(
        &self,
        pattern: RequestPattern,
        payload: &(impl Serialize + Sync),
        fallback: impl FnOnce() -> T + Send,
    ) -> T {
        match self.call(pattern, payload).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%pattern, error = %err, "read degraded to fallback");
                fallback()
            }
        }
    }
}
