//! Listing filters and pagination.

use super::{Task, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};

/// Status and priority filter shared by all listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    /// Whether `task` passes the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status() == status)
            && self.priority.is_none_or(|priority| task.priority() == priority)
    }
}

/// Clamped page selection.
///
/// Pages start at 1. A missing or non-positive page size becomes 10 and
/// anything above 100 becomes 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Page size used when none is requested.
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    /// Largest page size served.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Clamps raw client input into a valid page selection.
    #[must_use]
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let clamped_page = page
            .filter(|value| *value >= 1)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(1);
        let clamped_size = match page_size {
            Some(value) if value > i64::from(Self::MAX_PAGE_SIZE) => Self::MAX_PAGE_SIZE,
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(Self::DEFAULT_PAGE_SIZE),
            _ => Self::DEFAULT_PAGE_SIZE,
        };
        Self {
            page: clamped_page,
            page_size: clamped_size,
        }
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Returns how many items precede this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Filtered, searchable, paginated task listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Status and priority filter.
    pub filter: TaskFilter,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    /// Page selection.
    pub pagination: Pagination,
}

impl ListQuery {
    /// Returns the trimmed search term, ignoring blank input.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Whether `task` passes the filter and search term.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if !self.filter.matches(task) {
            return false;
        }
        let Some(term) = self.search_term() else {
            return true;
        };
        let needle = term.to_lowercase();
        task.title().to_lowercase().contains(&needle)
            || task
                .description()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
    }
}

/// One page of results with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of matches across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Converts every item, keeping the paging fields.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
