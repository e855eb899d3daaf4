//! Serves the `tasks.*` request patterns on top of [`TaskMutator`].

use async_trait::async_trait;
use mockable::Clock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

use super::{
    CommentResponse, CreateCommentPayload, CreateTaskPayload, DeleteTaskPayload, HistoryResponse,
    ListTasksPayload, TaskIdPayload, TaskMutationError, TaskMutator, TaskResponse,
    TasksByUserPayload, UpdateStatusPayload, UpdateTaskPayload,
};
use crate::broker::{
    domain::{RemoteError, RemoteErrorKind, RequestPattern},
    ports::{EventPublisher, RequestHandler},
};
use crate::task::ports::TaskRepository;

/// Request handler registered for the `tasks` service prefix.
pub struct TaskRequestHandler<R, P, C>
where
    R: TaskRepository,
    P: EventPublisher + ?Sized,
    C: Clock + Send + Sync,
{
    mutator: Arc<TaskMutator<R, P, C>>,
}

impl<R, P, C> TaskRequestHandler<R, P, C>
where
    R: TaskRepository,
    P: EventPublisher + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a handler dispatching to `mutator`.
    #[must_use]
    pub const fn new(mutator: Arc<TaskMutator<R, P, C>>) -> Self {
        Self { mutator }
    }

    async fn create(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: CreateTaskPayload = decode(payload)?;
        let author = request.user_id;
        let task = self.mutator.create(author, request.into_request()).await?;
        encode(&TaskResponse::from(&task))
    }

    async fn get_by_id(&self, payload: Value) -> Result<Value, RemoteError> {
        let task_id = decode::<TaskIdPayload>(payload)?.task_id();
        let task = match self.mutator.get(task_id).await {
            Ok(found) => found,
            Err(TaskMutationError::NotFound(_)) => return Ok(Value::Null),
            Err(err) => return Err(err.into()),
        };
        let comments = self.mutator.comments(task_id).await?;
        let history = self.mutator.history(task_id).await?;
        encode(&TaskResponse::from(&task).with_details(&comments, &history))
    }

    async fn get_all(&self) -> Result<Value, RemoteError> {
        let tasks = self.mutator.list_all().await?;
        encode(&tasks.iter().map(TaskResponse::from).collect::<Vec<_>>())
    }

    async fn list(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: ListTasksPayload = decode(payload)?;
        let page = self.mutator.list(&request.to_query()).await?;
        encode(&page.map(|task| TaskResponse::from(&task)))
    }

    async fn update(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: UpdateTaskPayload = decode(payload)?;
        let task = self
            .mutator
            .update(request.id, request.user_id, request.to_patch())
            .await?;
        encode(&TaskResponse::from(&task))
    }

    async fn delete(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: DeleteTaskPayload = decode(payload)?;
        self.mutator.remove(request.task_id).await?;
        Ok(Value::Null)
    }

    async fn get_by_user(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: TasksByUserPayload = decode(payload)?;
        let tasks = self
            .mutator
            .list_by_user(request.user_id, request.filter())
            .await?;
        encode(&tasks.iter().map(TaskResponse::from).collect::<Vec<_>>())
    }

    async fn update_status(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: UpdateStatusPayload = decode(payload)?;
        let task = self
            .mutator
            .update_status(request.task_id, request.status, request.user_id)
            .await?;
        encode(&TaskResponse::from(&task))
    }

    async fn get_history(&self, payload: Value) -> Result<Value, RemoteError> {
        let task_id = decode::<TaskIdPayload>(payload)?.task_id();
        let history = self.mutator.history(task_id).await?;
        encode(&history.iter().map(HistoryResponse::from).collect::<Vec<_>>())
    }

    async fn create_comment(&self, payload: Value) -> Result<Value, RemoteError> {
        let request: CreateCommentPayload = decode(payload)?;
        let comment = self
            .mutator
            .add_comment(request.task_id, request.user_id, request.content)
            .await?;
        encode(&CommentResponse::from(&comment))
    }

    async fn comments_by_task(&self, payload: Value) -> Result<Value, RemoteError> {
        let task_id = decode::<TaskIdPayload>(payload)?.task_id();
        let comments = self.mutator.comments(task_id).await?;
        encode(&comments.iter().map(CommentResponse::from).collect::<Vec<_>>())
    }
}

#[async_trait]
impl<R, P, C> RequestHandler for TaskRequestHandler<R, P, C>
where
    R: TaskRepository + 'static,
    P: EventPublisher + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn handle(&self, pattern: RequestPattern, payload: Value) -> Result<Value, RemoteError> {
        match pattern {
            RequestPattern::TaskCreate => self.create(payload).await,
            RequestPattern::TaskGetById => self.get_by_id(payload).await,
            RequestPattern::TaskGetAll => self.get_all().await,
            RequestPattern::TaskList => self.list(payload).await,
            RequestPattern::TaskUpdate => self.update(payload).await,
            RequestPattern::TaskDelete => self.delete(payload).await,
            RequestPattern::TaskGetByUser => self.get_by_user(payload).await,
            RequestPattern::TaskUpdateStatus => self.update_status(payload).await,
            RequestPattern::TaskGetHistory => self.get_history(payload).await,
            RequestPattern::CommentCreate => self.create_comment(payload).await,
            RequestPattern::CommentGetByTask => self.comments_by_task(payload).await,
            RequestPattern::NotificationGetByUser
            | RequestPattern::NotificationGetById
            | RequestPattern::NotificationMarkAsRead
            | RequestPattern::NotificationMarkAllAsRead
            | RequestPattern::NotificationDelete => Err(RemoteError::new(
                RemoteErrorKind::UnknownPattern,
                format!("{pattern} is not served by the tasks service"),
            )),
        }
    }
}

impl From<TaskMutationError> for RemoteError {
    fn from(err: TaskMutationError) -> Self {
        match err {
            TaskMutationError::Validation(inner) => Self::validation(inner.to_string()),
            TaskMutationError::NotFound(_) => Self::new(RemoteErrorKind::NotFound, err.to_string()),
            TaskMutationError::Storage(inner) => {
                tracing::error!(error = %inner, "task storage failure");
                Self::new(RemoteErrorKind::Storage, "task storage unavailable")
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
