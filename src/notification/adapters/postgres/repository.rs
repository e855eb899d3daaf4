//! `PostgreSQL` repository implementation for notifications.

use super::{models::NotificationRow, schema::notifications};
use crate::notification::{
    domain::{
        DedupeKey, NotificationId, NotificationRecord, NotificationType,
        PersistedNotificationData,
    },
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::task::domain::{TaskId, UserId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;

/// `PostgreSQL` connection pool type used by notification adapters.
pub type NotificationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed notification repository.
///
/// Duplicate deliveries are absorbed by the unique `dedupe_key` column with
/// `ON CONFLICT DO NOTHING`.
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: NotificationPgPool,
}

impl PostgresNotificationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: NotificationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> NotificationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NotificationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(NotificationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(NotificationRepositoryError::persistence)?
    }
}

impl From<DieselError> for NotificationRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, records: &[NotificationRecord]) -> NotificationRepositoryResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NotificationRow> = records.iter().map(to_row).collect();
        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(notifications::table)
                .values(&rows)
                .on_conflict(notifications::dedupe_key)
                .do_nothing()
                .execute(connection)?;
            Ok(inserted)
        })
        .await
    }

    async fn list_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> NotificationRepositoryResult<(Vec<NotificationRecord>, u64)> {
        self.run_blocking(move |connection| {
            let total: i64 = notifications::table
                .filter(notifications::user_id.eq(user.into_inner()))
                .count()
                .get_result(connection)?;
            let items = notifications::table
                .filter(notifications::user_id.eq(user.into_inner()))
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)?
                .into_iter()
                .map(row_to_record)
                .collect::<NotificationRepositoryResult<Vec<_>>>()?;
            let count = u64::try_from(total).map_err(NotificationRepositoryError::persistence)?;
            Ok((items, count))
        })
        .await
    }

    async fn find(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        self.run_blocking(move |connection| {
            notifications::table
                .filter(notifications::id.eq(id.into_inner()))
                .filter(notifications::user_id.eq(user.into_inner()))
                .select(NotificationRow::as_select())
                .first::<NotificationRow>(connection)
                .optional()?
                .map(row_to_record)
                .transpose()
        })
        .await
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        self.run_blocking(move |connection| {
            diesel::update(
                notifications::table
                    .filter(notifications::id.eq(id.into_inner()))
                    .filter(notifications::user_id.eq(user.into_inner())),
            )
            .set(notifications::is_read.eq(true))
            .returning(NotificationRow::as_returning())
            .get_result::<NotificationRow>(connection)
            .optional()?
            .map(row_to_record)
            .transpose()
        })
        .await
    }

    async fn mark_all_read(&self, user: UserId) -> NotificationRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let changed = diesel::update(
                notifications::table
                    .filter(notifications::user_id.eq(user.into_inner()))
                    .filter(notifications::is_read.eq(false)),
            )
            .set(notifications::is_read.eq(true))
            .execute(connection)?;
            u64::try_from(changed).map_err(NotificationRepositoryError::persistence)
        })
        .await
    }

    async fn delete(&self, id: NotificationId, user: UserId) -> NotificationRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                notifications::table
                    .filter(notifications::id.eq(id.into_inner()))
                    .filter(notifications::user_id.eq(user.into_inner())),
            )
            .execute(connection)?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn to_row(record: &NotificationRecord) -> NotificationRow {
    NotificationRow {
        id: record.id().into_inner(),
        user_id: record.user_id().into_inner(),
        kind: record.kind().as_str().to_owned(),
        message: record.message().to_owned(),
        related_task_id: record.related_task_id().map(TaskId::into_inner),
        is_read: record.is_read(),
        dedupe_key: record.dedupe_key().as_str().to_owned(),
        created_at: record.created_at(),
    }
}

fn row_to_record(row: NotificationRow) -> NotificationRepositoryResult<NotificationRecord> {
    let kind = NotificationType::try_from(row.kind.as_str())
        .map_err(NotificationRepositoryError::persistence)?;
    Ok(NotificationRecord::from_persisted(PersistedNotificationData {
        id: NotificationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        kind,
        message: row.message,
        related_task_id: row.related_task_id.map(TaskId::from_uuid),
        read: row.is_read,
        dedupe_key: DedupeKey::from_persisted(row.dedupe_key),
        created_at: row.created_at,
    }))
}
