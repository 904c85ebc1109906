//! Dashboard summary counters

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::ApiClient;
use crate::error::Result;
use crate::live::{LiveOptions, LiveView, RefreshHandle, SnapshotFetcher};

/// Aggregate shown on the dashboard's first row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Counter {
    Clients,
    Vehicles,
    Shifts,
    Dispatches,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::Clients,
        Counter::Vehicles,
        Counter::Shifts,
        Counter::Dispatches,
    ];

    /// Backend action returning `{ success, total }`
    pub fn action(&self) -> &'static str {
        match self {
            Counter::Clients => "total_clientes",
            Counter::Vehicles => "total_vehiculos",
            Counter::Shifts => "total_turnos",
            Counter::Dispatches => "total_expediciones",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Counter::Clients => "Clients",
            Counter::Vehicles => "Vehicles",
            Counter::Shifts => "Shifts",
            Counter::Dispatches => "Dispatches",
        }
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

pub struct CounterFetcher {
    api: ApiClient,
    counter: Counter,
}

impl CounterFetcher {
    pub fn new(api: ApiClient, counter: Counter) -> Self {
        Self { api, counter }
    }
}

#[async_trait]
impl SnapshotFetcher for CounterFetcher {
    type Output = u64;

    async fn fetch_snapshot(&self) -> Result<u64> {
        self.api.count(self.counter).await
    }
}

/// One live view per counter
pub struct CounterBoard {
    views: BTreeMap<Counter, LiveView<CounterFetcher>>,
}

impl CounterBoard {
    pub fn new(api: &ApiClient, options: &LiveOptions) -> Self {
        let views = Counter::ALL
            .iter()
            .map(|&counter| {
                let fetcher = CounterFetcher::new(api.clone(), counter);
                (counter, LiveView::new(fetcher, options.clone()))
            })
            .collect();
        Self { views }
    }

    pub fn view(&self, counter: Counter) -> Option<&LiveView<CounterFetcher>> {
        self.views.get(&counter)
    }

    /// Start every refresh loop; keep the handles alive while displaying
    pub fn spawn_all(&self) -> Vec<RefreshHandle> {
        self.views.values().map(LiveView::spawn).collect()
    }

    /// Refresh every counter once, concurrently
    pub async fn refresh_all(&self) {
        let refreshes = self.views.values().map(|view| view.refresh());
        futures::future::join_all(refreshes).await;
    }

    /// Latest value per counter, `None` until first loaded
    pub fn totals(&self) -> BTreeMap<Counter, Option<u64>> {
        self.views
            .iter()
            .map(|(counter, view)| (*counter, view.snapshot().data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_are_distinct() {
        let mut actions: Vec<_> = Counter::ALL.iter().map(|c| c.action()).collect();
        actions.sort();
        actions.dedup();
        assert_eq!(actions.len(), 4);
    }
}
