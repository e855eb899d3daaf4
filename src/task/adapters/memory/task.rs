//! In-memory repository for tasks, comments, and history.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Comment, HistoryEntry, ListQuery, Page, Task, TaskFilter, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Writes take a single write lock, which makes each operation atomic in
/// the same way a storage transaction would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    history: Vec<HistoryEntry>,
}

impl InMemoryTaskState {
    fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id() == id)
    }

    fn ensure_exists(&self, id: TaskId) -> TaskRepositoryResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TaskRepositoryError::NotFound(id))
        }
    }

    /// Tasks passing `keep`, newest first; ties keep the later insert first.
    fn newest_first(&self, keep: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .rev()
            .filter(|task| keep(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| Reverse(task.created_at()));
        tasks
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task, entry: &HistoryEntry) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.contains(task.id()) {
            return Err(TaskRepositoryError::persistence(std::io::Error::other(
                format!("duplicate task identifier: {}", task.id()),
            )));
        }
        state.tasks.push(task.clone());
        state.history.push(entry.clone());
        Ok(())
    }

    async fn save(&self, task: &Task, entries: &[HistoryEntry]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .iter_mut()
            .find(|stored| stored.id() == task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        *stored = task.clone();
        state.history.extend_from_slice(entries);
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_exists(id)?;
        state.comments.retain(|comment| comment.task_id() != id);
        state.history.retain(|entry| entry.task_id() != id);
        state.tasks.retain(|task| task.id() != id);
        Ok(())
    }

    async fn insert_comment(
        &self,
        comment: &Comment,
        entry: &HistoryEntry,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_exists(comment.task_id())?;
        state.comments.push(comment.clone());
        state.history.push(entry.clone());
        Ok(())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_exists(entry.task_id())?;
        state.history.push(entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.iter().find(|task| task.id() == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> TaskRepositoryResult<Page<Task>> {
        let state = self.read()?;
        let matching = state.newest_first(|task| query.matches(task));
        let total = u64::try_from(matching.len()).map_err(TaskRepositoryError::persistence)?;
        let skip = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.pagination.page_size()).unwrap_or(usize::MAX);
        Ok(Page {
            items: matching.into_iter().skip(skip).take(take).collect(),
            total,
            page: query.pagination.page(),
            page_size: query.pagination.page_size(),
        })
    }

    async fn find_by_creator(
        &self,
        user: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.newest_first(|task| task.created_by() == user && filter.matches(task)))
    }

    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.newest_first(|_| true))
    }

    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<Comment>> {
        let state = self.read()?;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .rev()
            .filter(|comment| comment.task_id() == id)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| Reverse(comment.created_at()));
        Ok(comments)
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<HistoryEntry>> {
        let state = self.read()?;
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .rev()
            .filter(|entry| entry.task_id() == id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| Reverse(entry.created_at()));
        Ok(entries)
    }
}
