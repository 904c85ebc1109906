//! Incremental list controller
//!
//! Owns one [`ListState`] per view and is its only writer. Bookkeeping
//! (current query, generation, in-flight marker) sits behind a mutex that is
//! never held across a fetch; every completion re-checks the generation it
//! captured at dispatch and drops itself if a reset happened in between.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::config::ListConfig;
use crate::error::{ErrorKind, Result};
use crate::list::{Debouncer, ListError, ListState, Page, PageFetcher, PageRequest, Query};

/// Controller tuning
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page_size: u32,
    pub debounce: Duration,
    /// Filters that must be non-blank before anything is fetched
    pub required_filters: Vec<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        ListOptions::from(&ListConfig::default())
    }
}

impl From<&ListConfig> for ListOptions {
    fn from(config: &ListConfig) -> Self {
        Self {
            page_size: config.page_size,
            debounce: config.debounce(),
            required_filters: Vec::new(),
        }
    }
}

impl ListOptions {
    pub fn with_required_filter(mut self, key: impl Into<String>) -> Self {
        self.required_filters.push(key.into());
        self
    }
}

/// Why an operation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The last page has been received
    Exhausted,
    /// Another fetch is still running
    InFlight,
    /// No query yet, or a required filter is blank
    NoActiveQuery,
    /// A debounced reset has not fired yet
    ResetPending,
    /// Search results are still on their way
    Searching,
    /// The sentinel is not in view
    NotIntersecting,
}

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { received: usize },
    Skipped(SkipReason),
    /// A newer reset superseded this fetch while it was running
    Discarded,
    Failed(ErrorKind),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Merge {
    Replace,
    Append,
}

#[derive(Debug, Default)]
struct Bookkeeping {
    query: Option<Query>,
    /// Query the visible rows were fetched for
    shown: Option<Query>,
    generation: u64,
    /// Generation of the fetch currently running
    in_flight: Option<u64>,
    reset_pending: bool,
}

impl Bookkeeping {
    fn active_query(&self, required: &[String]) -> Option<&Query> {
        self.query.as_ref().filter(|q| q.satisfies(required))
    }
}

struct Shared<F: PageFetcher> {
    fetcher: F,
    options: ListOptions,
    book: Mutex<Bookkeeping>,
    state: watch::Sender<ListState<F::Item>>,
    debouncer: Debouncer,
}

impl<F: PageFetcher> Shared<F> {
    async fn complete(
        &self,
        generation: u64,
        result: Result<Page<F::Item>>,
        merge: Merge,
    ) -> LoadOutcome {
        let mut book = self.book.lock().await;
        if book.generation != generation {
            debug!(generation, current = book.generation, "Discarding stale page");
            return LoadOutcome::Discarded;
        }
        book.in_flight = None;

        match result {
            Ok(page) => {
                let received = page.items.len();
                let has_more = page.continues();
                self.state.send_modify(|s| {
                    match merge {
                        Merge::Replace => s.items = page.items,
                        Merge::Append => s.items.extend(page.items),
                    }
                    s.cursor = page.cursor;
                    s.has_more = has_more;
                    s.is_loading = false;
                    s.is_searching = false;
                    s.error = None;
                });
                LoadOutcome::Applied { received }
            }
            Err(err) => {
                warn!(generation, error = %err, "Page fetch failed");
                let error = ListError::from(&err);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.is_searching = false;
                    s.error = Some(error);
                });
                LoadOutcome::Failed(err.kind())
            }
        }
    }

    /// Clear the in-flight marker of a fetch that never completed.
    async fn release(&self, generation: u64) {
        let mut book = self.book.lock().await;
        if book.in_flight == Some(generation) {
            book.in_flight = None;
            self.state.send_modify(|s| s.is_loading = false);
        }
    }
}

/// Paginated, searchable list backed by a [`PageFetcher`].
///
/// Cloning yields another handle to the same list. Dropping the last handle
/// cancels any scheduled reset.
///
/// # Example
///
/// ```rust,ignore
/// use fleet_dashboard::list::{ListController, ListOptions, Query};
///
/// let list = ListController::new(fetcher, ListOptions::default());
/// list.mount(Query::new()).await;
///
/// // user scrolled to the bottom
/// list.load_more().await;
///
/// // user typed into the search box
/// list.set_query(Query::new().with_search("8607")).await;
///
/// let state = list.snapshot();
/// println!("{} rows", state.items.len());
/// ```
pub struct ListController<F: PageFetcher> {
    shared: Arc<Shared<F>>,
}

impl<F: PageFetcher> Clone for ListController<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: PageFetcher> ListController<F> {
    pub fn new(fetcher: F, options: ListOptions) -> Self {
        let (state, _) = watch::channel(ListState::default());
        let debouncer = Debouncer::new(options.debounce);
        Self {
            shared: Arc::new(Shared {
                fetcher,
                options,
                book: Mutex::new(Bookkeeping::default()),
                state,
                debouncer,
            }),
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.shared.options
    }

    /// Receiver that observes every state publication
    pub fn subscribe(&self) -> watch::Receiver<ListState<F::Item>> {
        self.shared.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ListState<F::Item> {
        self.shared.state.borrow().clone()
    }

    /// The query the list currently answers to
    pub async fn query(&self) -> Option<Query> {
        self.shared.book.lock().await.query.clone()
    }

    /// Set the query and load the first page right away.
    pub async fn mount(&self, query: Query) -> LoadOutcome {
        self.shared.debouncer.cancel();
        {
            let mut book = self.shared.book.lock().await;
            book.query = Some(query);
        }
        self.reset().await
    }

    /// Replace the query; a reset follows after the debounce delay.
    ///
    /// Returns `false` when `query` equals the current one. A newer call
    /// within the delay supersedes this one.
    pub async fn set_query(&self, query: Query) -> bool {
        {
            let mut book = self.shared.book.lock().await;
            if book.query.as_ref() == Some(&query) {
                return false;
            }

            let search_changed = match &book.query {
                Some(current) => current.search_term != query.search_term,
                None => !query.search_term.is_empty(),
            };

            book.query = Some(query);
            book.generation += 1;
            book.in_flight = None;
            book.reset_pending = true;

            self.shared.state.send_modify(|s| {
                s.is_loading = false;
                if search_changed {
                    s.is_searching = true;
                }
            });

            debug!(generation = book.generation, search_changed, "Query changed, reset scheduled");
        }

        // The timer must not keep an unmounted list alive
        let shared = Arc::downgrade(&self.shared);
        self.shared.debouncer.schedule(move || async move {
            if let Some(shared) = shared.upgrade() {
                ListController { shared }.reset().await;
            }
        });
        true
    }

    /// Clear the list and fetch the first page for the current query.
    ///
    /// Supersedes a reset still waiting on the debounce delay.
    pub async fn reset(&self) -> LoadOutcome {
        self.shared.debouncer.cancel();

        let (generation, query) = {
            let mut book = self.shared.book.lock().await;
            book.generation += 1;
            book.reset_pending = false;
            book.shown = book.query.clone();
            let generation = book.generation;

            let active = book
                .active_query(&self.shared.options.required_filters)
                .cloned();
            book.in_flight = active.as_ref().map(|_| generation);

            let loading = active.is_some();
            self.shared.state.send_modify(|s| {
                s.items.clear();
                s.cursor = None;
                s.has_more = true;
                s.error = None;
                s.is_loading = loading;
                if !loading {
                    s.is_searching = false;
                }
            });

            match active {
                Some(query) => (generation, query),
                None => return LoadOutcome::Skipped(SkipReason::NoActiveQuery),
            }
        };

        debug!(generation, "Fetching first page");
        self.dispatch(generation, query, None, Merge::Replace).await
    }

    /// Fetch the page after the stored cursor and append it.
    pub async fn load_more(&self) -> LoadOutcome {
        let (generation, query, cursor) = {
            let mut book = self.shared.book.lock().await;

            if book.in_flight.is_some() {
                return LoadOutcome::Skipped(SkipReason::InFlight);
            }
            if book.reset_pending {
                return LoadOutcome::Skipped(SkipReason::ResetPending);
            }
            let query = match book.active_query(&self.shared.options.required_filters) {
                Some(query) => query.clone(),
                None => return LoadOutcome::Skipped(SkipReason::NoActiveQuery),
            };

            let (has_more, cursor) = {
                let state = self.shared.state.borrow();
                (state.has_more, state.cursor.clone())
            };
            if !has_more {
                return LoadOutcome::Skipped(SkipReason::Exhausted);
            }

            let generation = book.generation;
            book.in_flight = Some(generation);
            self.shared.state.send_modify(|s| {
                s.is_loading = true;
                s.error = None;
            });

            (generation, query, cursor)
        };

        debug!(generation, cursor = ?cursor, "Fetching next page");
        self.dispatch(generation, query, cursor, Merge::Append).await
    }

    /// Drop a scheduled reset that has not fired yet.
    ///
    /// The list goes back to answering the query its rows were fetched for,
    /// so paging continues from the stored cursor.
    pub async fn cancel_pending(&self) -> bool {
        let cancelled = self.shared.debouncer.cancel();
        if cancelled {
            let mut book = self.shared.book.lock().await;
            book.reset_pending = false;
            book.query = book.shown.clone();
            debug!(generation = book.generation, "Scheduled reset cancelled");
            self.shared.state.send_modify(|s| s.is_searching = false);
        }
        cancelled
    }

    /// Fetch on a task of its own and apply the result.
    ///
    /// The fetch runs to completion even if the caller stops waiting, so the
    /// in-flight marker is always cleared.
    async fn dispatch(
        &self,
        generation: u64,
        query: Query,
        cursor: Option<String>,
        merge: Merge,
    ) -> LoadOutcome {
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let result = shared
                .fetcher
                .fetch_page(PageRequest {
                    query: &query,
                    cursor: cursor.as_deref(),
                    page_size: shared.options.page_size,
                })
                .await;
            shared.complete(generation, result, merge).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(generation, error = %err, "Page fetch task ended early");
                self.shared.release(generation).await;
                LoadOutcome::Discarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pages of `page_size` numbers up to `total`; cursor is the next start.
    struct Numbers {
        total: u32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for Numbers {
        type Item = u32;

        async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start: u32 = request.cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let end = (start + request.page_size).min(self.total);
            Ok(Page::new(
                (start..end).collect(),
                Some(end.to_string()),
                end < self.total,
            ))
        }
    }

    struct Failing;

    #[async_trait]
    impl PageFetcher for Failing {
        type Item = u32;

        async fn fetch_page(&self, _request: PageRequest<'_>) -> Result<Page<u32>> {
            Err(DashboardError::Network("connection refused".into()))
        }
    }

    fn numbers(total: u32) -> ListController<Numbers> {
        ListController::new(
            Numbers { total, calls: AtomicUsize::new(0) },
            ListOptions { page_size: 10, ..Default::default() },
        )
    }

    #[tokio::test]
    async fn test_mount_then_drain() {
        let list = numbers(25);
        assert_eq!(list.mount(Query::new()).await, LoadOutcome::Applied { received: 10 });
        assert_eq!(list.load_more().await, LoadOutcome::Applied { received: 10 });
        assert_eq!(list.load_more().await, LoadOutcome::Applied { received: 5 });
        assert_eq!(list.load_more().await, LoadOutcome::Skipped(SkipReason::Exhausted));

        let state = list.snapshot();
        assert_eq!(state.items, (0..25).collect::<Vec<_>>());
        assert!(!state.has_more);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_no_query_means_no_fetch() {
        let list = numbers(25);
        assert_eq!(list.load_more().await, LoadOutcome::Skipped(SkipReason::NoActiveQuery));
        assert_eq!(list.shared.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_required_filter_gates_fetching() {
        let list = ListController::new(
            Numbers { total: 5, calls: AtomicUsize::new(0) },
            ListOptions::default().with_required_filter("cliente"),
        );
        assert_eq!(
            list.mount(Query::new().with_filter("cliente", " ")).await,
            LoadOutcome::Skipped(SkipReason::NoActiveQuery)
        );
        assert_eq!(
            list.mount(Query::new().with_filter("cliente", "C1")).await,
            LoadOutcome::Applied { received: 5 }
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_items_and_is_retryable() {
        let list = ListController::new(Failing, ListOptions::default());
        assert_eq!(list.mount(Query::new()).await, LoadOutcome::Failed(ErrorKind::Network));

        let state = list.snapshot();
        assert!(state.items.is_empty());
        assert_eq!(state.error.as_ref().map(|e| e.kind), Some(ErrorKind::Network));
        assert!(!state.is_loading);

        // Still usable for a manual retry
        assert_eq!(list.reset().await, LoadOutcome::Failed(ErrorKind::Network));
    }

    #[tokio::test]
    async fn test_same_query_is_not_a_change() {
        let list = numbers(5);
        list.mount(Query::new().with_search("x")).await;
        assert!(!list.set_query(Query::new().with_search("x")).await);
        assert!(list.set_query(Query::new().with_search("y")).await);
        assert!(list.snapshot().is_searching);
    }
}
