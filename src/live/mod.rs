//! Live views refreshed on an interval
//!
//! Used by the monitoring table and the summary counters: the whole result
//! set is re-fetched periodically instead of paging.

mod counters;
mod view;

pub use counters::{Counter, CounterBoard, CounterFetcher};
pub use view::{LiveOptions, LiveState, LiveView, RefreshHandle, SnapshotFetcher};
