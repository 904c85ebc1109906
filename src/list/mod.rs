//! Incremental list loading
//!
//! One [`ListController`] per list view: page-by-page loading behind a
//! scroll sentinel, debounced resets on query changes, at most one fetch in
//! flight, and stale responses dropped by generation.

mod controller;
mod debounce;
mod fetcher;
mod query;
mod sentinel;
mod state;

pub use controller::{ListController, ListOptions, LoadOutcome, SkipReason};
pub use debounce::Debouncer;
pub use fetcher::{HttpPageSource, PageEndpoint, PageFetcher, PageRequest};
pub use query::Query;
pub use sentinel::{Bounds, ScrollGeometry, ScrollHandle};
pub use state::{ListError, ListState, Page};
