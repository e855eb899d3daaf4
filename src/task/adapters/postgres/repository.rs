//! `PostgreSQL` repository implementation for tasks, comments, and history.

use super::{
    models::{AssigneeRow, CommentRow, HistoryRow, NewTaskRow, TaskChangeset, TaskRow},
    schema::{task_assignees, task_comments, task_history, tasks},
};
use crate::task::{
    domain::{
        Comment, CommentContent, CommentId, HistoryAction, HistoryEntry, HistoryEntryId,
        ListQuery, Page, PersistedHistoryData, PersistedTaskData, Task, TaskFilter, TaskId,
        TaskPriority, TaskStatus, TaskTitle, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Each write runs inside one transaction. Child rows are deleted
/// explicitly before the task row rather than relying on cascades.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert(&self, task: &Task, entry: &HistoryEntry) -> TaskRepositoryResult<()> {
        let new_row = to_new_row(task);
        let assignees = to_assignee_rows(task)?;
        let history_row = to_history_row(entry);

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::insert_into(tasks::table)
                    .values(&new_row)
                    .execute(tx)?;
                insert_assignees(tx, &assignees)?;
                diesel::insert_into(task_history::table)
                    .values(&history_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn save(&self, task: &Task, entries: &[HistoryEntry]) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task);
        let assignees = to_assignee_rows(task)?;
        let history_rows: Vec<HistoryRow> = entries.iter().map(to_history_row).collect();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let updated = diesel::update(tasks::table.find(task_id.into_inner()))
                    .set(&changeset)
                    .execute(tx)?;
                if updated == 0 {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                diesel::delete(
                    task_assignees::table.filter(task_assignees::task_id.eq(task_id.into_inner())),
                )
                .execute(tx)?;
                insert_assignees(tx, &assignees)?;
                if !history_rows.is_empty() {
                    diesel::insert_into(task_history::table)
                        .values(&history_rows)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let raw_id = id.into_inner();
                diesel::delete(task_assignees::table.filter(task_assignees::task_id.eq(raw_id)))
                    .execute(tx)?;
                diesel::delete(task_comments::table.filter(task_comments::task_id.eq(raw_id)))
                    .execute(tx)?;
                diesel::delete(task_history::table.filter(task_history::task_id.eq(raw_id)))
                    .execute(tx)?;
                let deleted = diesel::delete(tasks::table.find(raw_id)).execute(tx)?;
                if deleted == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn insert_comment(
        &self,
        comment: &Comment,
        entry: &HistoryEntry,
    ) -> TaskRepositoryResult<()> {
        let task_id = comment.task_id();
        let comment_row = to_comment_row(comment);
        let history_row = to_history_row(entry);

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                ensure_task_exists(tx, task_id)?;
                diesel::insert_into(task_comments::table)
                    .values(&comment_row)
                    .execute(tx)?;
                diesel::insert_into(task_history::table)
                    .values(&history_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> TaskRepositoryResult<()> {
        let task_id = entry.task_id();
        let history_row = to_history_row(entry);
        self.run_blocking(move |connection| {
            ensure_task_exists(connection, task_id)?;
            diesel::insert_into(task_history::table)
                .values(&history_row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            let Some(found) = row else {
                return Ok(None);
            };
            let mut hydrated = hydrate(connection, vec![found])?;
            Ok(hydrated.pop())
        })
        .await
    }

    async fn list(&self, query: &ListQuery) -> TaskRepositoryResult<Page<Task>> {
        let owned_query = query.clone();
        self.run_blocking(move |connection| {
            let total: i64 = filtered(&owned_query).count().get_result(connection)?;
            let offset = i64::try_from(owned_query.pagination.offset())
                .map_err(TaskRepositoryError::persistence)?;
            let rows = filtered(&owned_query)
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .limit(i64::from(owned_query.pagination.page_size()))
                .offset(offset)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            Ok(Page {
                items: hydrate(connection, rows)?,
                total: u64::try_from(total).map_err(TaskRepositoryError::persistence)?,
                page: owned_query.pagination.page(),
                page_size: owned_query.pagination.page_size(),
            })
        })
        .await
    }

    async fn find_by_creator(
        &self,
        user: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let by_creator = ListQuery {
                filter,
                ..ListQuery::default()
            };
            let rows = filtered(&by_creator)
                .filter(tasks::created_by.eq(user.into_inner()))
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            hydrate(connection, rows)
        })
        .await
    }

    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            hydrate(connection, rows)
        })
        .await
    }

    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<Comment>> {
        self.run_blocking(move |connection| {
            task_comments::table
                .filter(task_comments::task_id.eq(id.into_inner()))
                .order((task_comments::created_at.desc(), task_comments::seq.desc()))
                .select(CommentRow::as_select())
                .load::<CommentRow>(connection)?
                .into_iter()
                .map(row_to_comment)
                .collect()
        })
        .await
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<HistoryEntry>> {
        self.run_blocking(move |connection| {
            task_history::table
                .filter(task_history::task_id.eq(id.into_inner()))
                .order((task_history::created_at.desc(), task_history::seq.desc()))
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)?
                .into_iter()
                .map(row_to_history)
                .collect()
        })
        .await
    }
}

/// Builds the filtered task query shared by listing and counting.
fn filtered(query: &ListQuery) -> tasks::BoxedQuery<'static, Pg> {
    let mut statement = tasks::table.into_boxed();
    if let Some(status) = query.filter.status {
        statement = statement.filter(tasks::status.eq(status.as_str()));
    }
    if let Some(priority) = query.filter.priority {
        statement = statement.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        statement = statement.filter(
            tasks::title
                .ilike(pattern.clone())
                .or(tasks::description.ilike(pattern)),
        );
    }
    statement
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for character in term.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

fn insert_assignees(
    connection: &mut PgConnection,
    rows: &[AssigneeRow],
) -> TaskRepositoryResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(task_assignees::table)
        .values(rows)
        .execute(connection)?;
    Ok(())
}

fn ensure_task_exists(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<()> {
    let found = diesel::select(diesel::dsl::exists(tasks::table.find(id.into_inner())))
        .get_result::<bool>(connection)?;
    if found {
        Ok(())
    } else {
        Err(TaskRepositoryError::NotFound(id))
    }
}

/// Loads assignees for `rows` in one query and builds the aggregates.
fn hydrate(connection: &mut PgConnection, rows: Vec<TaskRow>) -> TaskRepositoryResult<Vec<Task>> {
    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
    let links = task_assignees::table
        .filter(task_assignees::task_id.eq_any(ids))
        .order((task_assignees::task_id, task_assignees::position))
        .select(AssigneeRow::as_select())
        .load::<AssigneeRow>(connection)?;

    let mut assignees: HashMap<uuid::Uuid, Vec<UserId>> = HashMap::new();
    for link in links {
        assignees
            .entry(link.task_id)
            .or_default()
            .push(UserId::from_uuid(link.user_id));
    }

    rows.into_iter()
        .map(|row| {
            let assignee_ids = assignees.remove(&row.id).unwrap_or_default();
            row_to_task(row, assignee_ids)
        })
        .collect()
}

fn to_new_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        due_date: task.due_date(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        created_by: task.created_by().into_inner(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn to_changeset(task: &Task) -> TaskChangeset {
    TaskChangeset {
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        due_date: task.due_date(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        updated_at: task.updated_at(),
    }
}

fn to_assignee_rows(task: &Task) -> TaskRepositoryResult<Vec<AssigneeRow>> {
    task.assignee_ids()
        .iter()
        .enumerate()
        .map(|(index, user)| {
            Ok(AssigneeRow {
                task_id: task.id().into_inner(),
                user_id: user.into_inner(),
                position: i32::try_from(index).map_err(TaskRepositoryError::persistence)?,
            })
        })
        .collect()
}

fn to_comment_row(comment: &Comment) -> CommentRow {
    CommentRow {
        id: comment.id().into_inner(),
        task_id: comment.task_id().into_inner(),
        author_id: comment.author_id().into_inner(),
        content: comment.content().to_owned(),
        created_at: comment.created_at(),
    }
}

fn to_history_row(entry: &HistoryEntry) -> HistoryRow {
    HistoryRow {
        id: entry.id().into_inner(),
        task_id: entry.task_id().into_inner(),
        action: entry.action().as_str().to_owned(),
        metadata: entry.metadata().cloned(),
        performed_by: entry.performed_by().map(UserId::into_inner),
        created_at: entry.created_at(),
    }
}

fn row_to_task(row: TaskRow, assignee_ids: Vec<UserId>) -> TaskRepositoryResult<Task> {
    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title: TaskTitle::new(&row.title).map_err(TaskRepositoryError::persistence)?,
        description: row.description,
        due_date: row.due_date,
        priority: TaskPriority::try_from(row.priority.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        status: TaskStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        created_by: UserId::from_uuid(row.created_by),
        assignee_ids,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_comment(row: CommentRow) -> TaskRepositoryResult<Comment> {
    let content = CommentContent::new(row.content).map_err(TaskRepositoryError::persistence)?;
    Ok(Comment::from_persisted(
        CommentId::from_uuid(row.id),
        TaskId::from_uuid(row.task_id),
        UserId::from_uuid(row.author_id),
        content,
        row.created_at,
    ))
}

fn row_to_history(row: HistoryRow) -> TaskRepositoryResult<HistoryEntry> {
    let action =
        HistoryAction::try_from(row.action.as_str()).map_err(TaskRepositoryError::persistence)?;
    Ok(HistoryEntry::from_persisted(PersistedHistoryData {
        id: HistoryEntryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        action,
        metadata: row.metadata,
        performed_by: row.performed_by.map(UserId::from_uuid),
        created_at: row.created_at,
    }))
}
