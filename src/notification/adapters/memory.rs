//! In-memory notification repository.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::notification::{
    domain::{NotificationId, NotificationRecord},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::task::domain::UserId;

/// Thread-safe in-memory notification store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NotificationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn owned_by(record: &NotificationRecord, id: NotificationId, user: UserId) -> bool {
    record.id() == id && record.user_id() == user
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, records: &[NotificationRecord]) -> NotificationRepositoryResult<usize> {
        let mut stored = self.lock();
        let mut inserted = 0;
        for record in records {
            let duplicate = stored
                .iter()
                .any(|existing| existing.dedupe_key() == record.dedupe_key());
            if !duplicate {
                stored.push(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> NotificationRepositoryResult<(Vec<NotificationRecord>, u64)> {
        let stored = self.lock();
        let mut owned: Vec<NotificationRecord> = stored
            .iter()
            .rev()
            .filter(|record| record.user_id() == user)
            .cloned()
            .collect();
        owned.sort_by_key(|record| Reverse(record.created_at()));
        let total = u64::try_from(owned.len()).map_err(NotificationRepositoryError::persistence)?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = owned.into_iter().skip(skip).take(take).collect();
        Ok((items, total))
    }

    async fn find(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        Ok(self
            .lock()
            .iter()
            .find(|record| owned_by(record, id, user))
            .cloned())
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        let mut stored = self.lock();
        Ok(stored
            .iter_mut()
            .find(|record| owned_by(record, id, user))
            .map(|record| {
                record.mark_read();
                record.clone()
            }))
    }

    async fn mark_all_read(&self, user: UserId) -> NotificationRepositoryResult<u64> {
        let mut stored = self.lock();
        let changed = stored
            .iter_mut()
            .filter(|record| record.user_id() == user)
            .map(NotificationRecord::mark_read)
            .filter(|changed| *changed)
            .count();
        u64::try_from(changed).map_err(NotificationRepositoryError::persistence)
    }

    async fn delete(&self, id: NotificationId, user: UserId) -> NotificationRepositoryResult<bool> {
        let mut stored = self.lock();
        let before = stored.len();
        stored.retain(|record| !owned_by(record, id, user));
        Ok(stored.len() != before)
    }
}
