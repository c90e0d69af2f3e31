#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Composition root for the operator dashboard.
//!
//! [`Dashboard::mount`] wires the pieces together exactly once: one
//! shared HTTP client, the alert store, the live feed subscription,
//! and both aggregation boards. [`Dashboard::unmount`] tears them down
//! deterministically; dropping without unmounting still aborts the
//! feed task through [`FeedSubscription`]'s own drop.

use std::sync::Arc;

use sentinel_alerts::AlertStore;
use sentinel_analytics::ChartBoard;
use sentinel_feed::sse::SseChannel;
use sentinel_feed::{FeedStatus, FeedSubscription};
use sentinel_map::MapBoard;
use tokio::sync::watch;

/// Where the dashboard's data comes from.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL for the analytics and map endpoints.
    pub api_base_url: String,
    /// URL of the SSE alert feed.
    pub feed_url: String,
    /// How many alerts the store keeps before dropping the oldest.
    pub alert_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            feed_url: "http://localhost:8000/stream".to_string(),
            alert_capacity: sentinel_alerts::DEFAULT_CAPACITY,
        }
    }
}

/// A mounted dashboard: alert store, feed subscription, chart board,
/// and map board, sharing one HTTP client.
pub struct Dashboard {
    store: AlertStore,
    charts: Arc<ChartBoard>,
    map: Arc<MapBoard>,
    feed: Option<FeedSubscription>,
    feed_status: watch::Receiver<FeedStatus>,
    client: reqwest::Client,
    api_base_url: String,
}

impl Dashboard {
    /// Mounts the dashboard: creates the store, opens the feed
    /// subscription, and activates both boards exactly once.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn mount(config: DashboardConfig) -> Self {
        let DashboardConfig {
            api_base_url,
            feed_url,
            alert_capacity,
        } = config;
        log::info!(
            "dashboard: mounting (api {api_base_url}, feed {feed_url}, capacity {alert_capacity})"
        );

        let client = reqwest::Client::new();
        let store = AlertStore::with_capacity(alert_capacity);
        let feed = FeedSubscription::start(
            SseChannel::new(client.clone(), feed_url),
            store.clone(),
        );
        let feed_status = feed.watch_status();

        let charts = Arc::new(ChartBoard::new());
        charts.activate(&client, &api_base_url);
        let map = Arc::new(MapBoard::new());
        map.activate(&client, &api_base_url);

        Self {
            store,
            charts,
            map,
            feed: Some(feed),
            feed_status,
            client,
            api_base_url,
        }
    }

    /// Shared handle to the alert store.
    #[must_use]
    pub fn store(&self) -> AlertStore {
        self.store.clone()
    }

    /// Chart aggregation board.
    #[must_use]
    pub fn charts(&self) -> Arc<ChartBoard> {
        Arc::clone(&self.charts)
    }

    /// Map aggregation board.
    #[must_use]
    pub fn map(&self) -> Arc<MapBoard> {
        Arc::clone(&self.map)
    }

    /// Current feed health.
    #[must_use]
    pub fn feed_status(&self) -> FeedStatus {
        *self.feed_status.borrow()
    }

    /// Subscribes to feed health transitions.
    #[must_use]
    pub fn watch_feed(&self) -> watch::Receiver<FeedStatus> {
        self.feed_status.clone()
    }

    /// Re-activates the chart board: every slot back to `Pending`, six
    /// fresh fetches, previous activation superseded.
    pub fn refresh_analytics(&self) {
        self.charts.activate(&self.client, &self.api_base_url);
    }

    /// Re-activates the map board.
    pub fn refresh_map(&self) {
        self.map.activate(&self.client, &self.api_base_url);
    }

    /// Tears the dashboard down: shuts the feed down (awaited) and
    /// detaches both boards. Stores and boards handed out earlier stay
    /// readable with whatever they last loaded.
    pub async fn unmount(mut self) {
        log::info!("dashboard: unmounting");
        if let Some(feed) = self.feed.take() {
            feed.shutdown().await;
        }
        self.charts.detach();
        self.map.detach();
    }
}
