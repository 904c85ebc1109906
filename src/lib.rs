//! Fleet Dashboard - client management and monitoring for a bus fleet backend
//!
//! Headless view controllers for the fleet dashboard: paginated feeds that
//! load behind a scroll sentinel, live panels refreshed on an interval, and
//! the terminal monitoring table.
//!
//! # Architecture
//!
//! - **List views** (GPS feed, dispatches): [`ListController`] pages by
//!   cursor, debounces query changes and discards stale responses.
//! - **Live views** (counters, monitoring): [`LiveView`] re-fetches the whole
//!   result on an interval and lingers a refresh indicator.
//! - **Backend**: [`ApiClient`] talks to the single action-dispatching entry
//!   point (`{base_url}?action=<name>`).
//!
//! # Example
//!
//! ```rust,ignore
//! use fleet_dashboard::{resources, ApiClient, DashboardConfig, ListOptions, Query};
//!
//! let config = DashboardConfig::default();
//! let api = ApiClient::new(&config.api)?;
//!
//! let feed = resources::gps_feed(api, ListOptions::from(&config.list));
//! feed.mount(Query::new()).await;
//! feed.load_more().await;
//!
//! println!("{} devices", feed.snapshot().len());
//! ```

// Backend access
pub mod api;

// Configuration
pub mod config;

// Error types
pub mod error;

// Incremental list controller
pub mod list;

// Interval-refreshed views
pub mod live;

// Terminal monitoring
pub mod monitor;

// Backend records
pub mod resources;

// Login session
pub mod session;

pub use api::ApiClient;
pub use config::{ApiConfig, DashboardConfig, ListConfig, LiveConfig};
pub use error::{DashboardError, ErrorKind, Result};

pub use list::{
    Bounds, ListController, ListError, ListOptions, ListState, LoadOutcome, Page, PageFetcher,
    PageRequest, Query, ScrollHandle, SkipReason,
};
pub use live::{Counter, CounterBoard, LiveOptions, LiveState, LiveView, RefreshHandle, SnapshotFetcher};
pub use monitor::{MonitorBoard, MonitorFetcher, TerminalStatus};
pub use session::{AuthClient, Session, UserProfile};
