//! Page and list state types

use serde::Serialize;

use crate::error::{DashboardError, ErrorKind};

/// One page of records as returned by a fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Server-issued position for the next page
    pub cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>, has_more: bool) -> Self {
        Self { items, cursor, has_more }
    }

    /// Final page: no cursor, nothing more to fetch
    pub fn last(items: Vec<T>) -> Self {
        Self { items, cursor: None, has_more: false }
    }

    /// A page only continues when it both says so and carries a cursor.
    pub fn continues(&self) -> bool {
        self.has_more && self.cursor.is_some()
    }
}

/// Error recorded in a view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DashboardError> for ListError {
    fn from(err: &DashboardError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Renderable state of an incremental list
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// Accumulated records, append-only until the next reset
    pub items: Vec<T>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub is_loading: bool,
    /// A search-term change is waiting for its results
    pub is_searching: bool,
    pub error: Option<ListError>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_more: true,
            is_loading: false,
            is_searching: false,
            error: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Nothing loading and nothing to show
    pub fn is_settled_empty(&self) -> bool {
        self.items.is_empty() && !self.is_loading && !self.is_searching
    }
}
