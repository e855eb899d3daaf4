//! Append-only history recording.

use crate::task::{
    domain::{HistoryAction, HistoryEntry, HistoryEntryId, PersistedHistoryData, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryResult},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// Builds and appends audit entries for task changes.
///
/// Entries are never updated or removed here; only task deletion removes
/// them.
pub struct HistoryRecorder<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for HistoryRecorder<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> HistoryRecorder<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a recorder writing through `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Builds an entry stamped with the current time without storing it.
    ///
    /// Used when the entry must be committed together with the change it
    /// describes.
    #[must_use]
    pub fn stage(
        &self,
        task_id: TaskId,
        action: HistoryAction,
        metadata: Option<Value>,
        performed_by: Option<UserId>,
    ) -> HistoryEntry {
        HistoryEntry::from_persisted(PersistedHistoryData {
            id: HistoryEntryId::new(),
            task_id,
            action,
            metadata,
            performed_by,
            created_at: self.clock.utc(),
        })
    }

    /// Builds and appends an entry on its own.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the entry could not be stored.
    pub async fn record(
        &self,
        task_id: TaskId,
        action: HistoryAction,
        metadata: Option<Value>,
        performed_by: Option<UserId>,
    ) -> TaskRepositoryResult<HistoryEntry> {
        let entry = self.stage(task_id, action, metadata, performed_by);
        self.repository.append_history(&entry).await?;
        tracing::debug!(%task_id, action = %action, "history entry recorded");
        Ok(entry)
    }
}
