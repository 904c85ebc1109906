//! Periodically refreshed view
//!
//! Re-fetches the whole result set on a fixed period and swaps it in
//! wholesale. The refresh indicator stays up for a fixed linger after each
//! refresh so fast responses do not flicker.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::LiveConfig;
use crate::error::Result;
use crate::list::{Debouncer, ListError, LoadOutcome, SkipReason};

/// Source of a complete snapshot for a [`LiveView`]
#[async_trait]
pub trait SnapshotFetcher: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    async fn fetch_snapshot(&self) -> Result<Self::Output>;
}

#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub interval: Duration,
    pub indicator_linger: Duration,
}

impl Default for LiveOptions {
    fn default() -> Self {
        LiveOptions::from(&LiveConfig::default())
    }
}

impl From<&LiveConfig> for LiveOptions {
    fn from(config: &LiveConfig) -> Self {
        Self {
            interval: config.refresh_interval(),
            indicator_linger: config.indicator_linger(),
        }
    }
}

/// Renderable state of a live view
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState<T> {
    /// Latest successful snapshot
    pub data: Option<T>,
    /// First load, nothing to show yet
    pub is_loading: bool,
    /// A refetch is running while older data is shown
    pub is_refreshing: bool,
    /// Refresh indicator, cleared a linger after the refetch completes
    pub show_refresh_indicator: bool,
    pub error: Option<ListError>,
}

impl<T> Default for LiveState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_refreshing: false,
            show_refresh_indicator: false,
            error: None,
        }
    }
}

struct Shared<F: SnapshotFetcher> {
    fetcher: F,
    options: LiveOptions,
    in_flight: AtomicBool,
    state: watch::Sender<LiveState<F::Output>>,
    indicator: Debouncer,
}

/// Holds the single refresh slot until dropped.
struct RefreshSlot<'a, F: SnapshotFetcher> {
    shared: &'a Shared<F>,
}

impl<'a, F: SnapshotFetcher> RefreshSlot<'a, F> {
    fn acquire(shared: &'a Shared<F>) -> Option<Self> {
        shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { shared })
    }
}

impl<F: SnapshotFetcher> Drop for RefreshSlot<'_, F> {
    fn drop(&mut self) {
        // Still busy only when the refresh was abandoned mid-fetch
        self.shared.state.send_if_modified(|s| {
            let busy = s.is_loading || s.is_refreshing;
            if busy {
                s.is_loading = false;
                s.is_refreshing = false;
                s.show_refresh_indicator = false;
            }
            busy
        });
        self.shared.in_flight.store(false, Ordering::Release);
    }
}

/// Whole-set view refreshed on an interval.
///
/// # Example
///
/// ```rust,ignore
/// let view = LiveView::new(MonitorFetcher::new(api), LiveOptions::default());
/// let _refresh = view.spawn();
///
/// let mut rx = view.subscribe();
/// while rx.changed().await.is_ok() {
///     if let Some(board) = &rx.borrow().data {
///         println!("{} terminals with problems", board.terminals_with_problems);
///     }
/// }
/// ```
pub struct LiveView<F: SnapshotFetcher> {
    shared: Arc<Shared<F>>,
}

impl<F: SnapshotFetcher> Clone for LiveView<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: SnapshotFetcher> LiveView<F> {
    pub fn new(fetcher: F, options: LiveOptions) -> Self {
        let (state, _) = watch::channel(LiveState::default());
        let indicator = Debouncer::new(options.indicator_linger);
        Self {
            shared: Arc::new(Shared {
                fetcher,
                options,
                in_flight: AtomicBool::new(false),
                state,
                indicator,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState<F::Output>> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> LiveState<F::Output> {
        self.shared.state.borrow().clone()
    }

    /// Fetch a fresh snapshot and replace the current one.
    pub async fn refresh(&self) -> LoadOutcome {
        let slot = match RefreshSlot::acquire(&self.shared) {
            Some(slot) => slot,
            None => return LoadOutcome::Skipped(SkipReason::InFlight),
        };

        // A new refetch keeps the indicator up instead of letting an old linger clear it
        self.shared.indicator.cancel();
        self.shared.state.send_modify(|s| {
            if s.data.is_some() {
                s.is_refreshing = true;
                s.show_refresh_indicator = true;
            } else {
                s.is_loading = true;
            }
        });

        debug!("Refreshing live view");
        let result = self.shared.fetcher.fetch_snapshot().await;

        let outcome = match result {
            Ok(data) => {
                self.shared.state.send_modify(|s| {
                    s.data = Some(data);
                    s.error = None;
                    s.is_loading = false;
                    s.is_refreshing = false;
                });
                LoadOutcome::Applied { received: 1 }
            }
            Err(err) => {
                warn!(error = %err, "Live view refresh failed");
                let error = ListError::from(&err);
                self.shared.state.send_modify(|s| {
                    s.error = Some(error);
                    s.is_loading = false;
                    s.is_refreshing = false;
                });
                LoadOutcome::Failed(err.kind())
            }
        };
        drop(slot);

        let shared = Arc::downgrade(&self.shared);
        self.shared.indicator.schedule(move || async move {
            if let Some(shared) = shared.upgrade() {
                shared.state.send_modify(|s| s.show_refresh_indicator = false);
            }
        });

        outcome
    }

    /// Start the refresh loop; the first refresh runs immediately.
    pub fn spawn(&self) -> RefreshHandle {
        let view = self.clone();
        let period = self.shared.options.interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                view.refresh().await;
            }
        });
        RefreshHandle { task }
    }
}

/// Owns a running refresh loop; dropping it stops the loop.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {}

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
