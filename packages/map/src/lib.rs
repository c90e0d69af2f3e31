#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial point aggregation for the anomaly map.
//!
//! A [`MapBoard`] fetches the consolidated map endpoint once per
//! activation, classifies every record under the taxonomy, and
//! computes the bounding region for camera framing. It follows the
//! same tri-state status and activation-generation discipline as the
//! chart board; the map endpoint is simply the seventh tracked source.

use std::sync::{Arc, Mutex, RwLock};

use sentinel_analytics_models::SourceStatus;
use sentinel_map_models::{BoundingRegion, MapPoint, RawMapPoint};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Errors that can occur while loading the map point list.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the map endpoint.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// URL that failed.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Endpoint path for the consolidated point list.
const MAP_PATH: &str = "/analytics/map-all";

#[derive(Debug)]
struct BoardState {
    generation: u64,
    status: SourceStatus,
    points: Vec<MapPoint>,
    region: Option<BoundingRegion>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            generation: 0,
            status: SourceStatus::Pending,
            points: Vec::new(),
            region: None,
        }
    }
}

/// Aggregation board behind the geospatial anomaly view.
///
/// Shared by `Arc`; reads are snapshots, changes are announced on a
/// [`watch`] revision channel. Lock poisoning is treated as fatal.
pub struct MapBoard {
    state: Arc<RwLock<BoardState>>,
    revision: Arc<watch::Sender<u64>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for MapBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MapBoard {
    /// Creates a board with status `Pending`, no points, and no fetch
    /// running.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(BoardState::default())),
            revision: Arc::new(revision),
            task: Mutex::new(None),
        }
    }

    /// Starts a new activation: resets the board to `Pending`, bumps
    /// the generation, and launches the fetch.
    ///
    /// Safe to call again at any time (manual refresh); a still-running
    /// fetch from the previous activation is aborted and anything that
    /// still resolves is discarded by the generation check.
    pub fn activate(&self, client: &reqwest::Client, base_url: &str) {
        let url = format!("{}{MAP_PATH}", base_url.trim_end_matches('/'));
        let generation = {
            let mut state = self.state.write().expect("map board lock poisoned");
            state.generation += 1;
            state.status = SourceStatus::Pending;
            state.points = Vec::new();
            state.region = None;
            state.generation
        };
        self.revision.send_modify(|rev| *rev += 1);
        log::info!("map: activation {generation} against {url}");

        let state = Arc::clone(&self.state);
        let revision = Arc::clone(&self.revision);
        let client = client.clone();
        let handle = tokio::spawn(async move {
            let (status, points) = match fetch_points(&client, &url).await {
                Ok(points) => {
                    log::info!("map: loaded {} points", points.len());
                    (SourceStatus::Loaded, points)
                }
                Err(e) => {
                    log::error!("map: fetch failed: {e}");
                    (SourceStatus::Failed, Vec::new())
                }
            };
            apply_fetch(&state, &revision, generation, status, points);
        });
        if let Some(previous) = self
            .task
            .lock()
            .expect("map board task slot poisoned")
            .replace(handle)
        {
            previous.abort();
        }
    }

    /// Aborts a still-running fetch and invalidates its generation, so
    /// nothing resolves into the board after teardown. Loaded points
    /// are kept.
    pub fn detach(&self) {
        log::debug!("map: detaching");
        self.state
            .write()
            .expect("map board lock poisoned")
            .generation += 1;
        if let Some(handle) = self.task.lock().expect("map board task slot poisoned").take() {
            handle.abort();
        }
    }

    /// Classified points from the last completed load, newest
    /// activation wins.
    #[must_use]
    pub fn points(&self) -> Vec<MapPoint> {
        self.read().points.clone()
    }

    /// Camera framing for the current points; `None` when the list is
    /// empty (surfaces keep their previous or default view).
    #[must_use]
    pub fn region(&self) -> Option<BoundingRegion> {
        self.read().region
    }

    /// Load state of the map source.
    #[must_use]
    pub fn status(&self) -> SourceStatus {
        self.read().status
    }

    /// Current activation generation (0 before the first activation).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Monotonic revision, bumped whenever the board changes.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribes to revision bumps.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BoardState> {
        self.state.read().expect("map board lock poisoned")
    }
}

impl Drop for MapBoard {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

/// Writes a completed fetch into the board unless a newer activation
/// has superseded `generation`. Returns whether the write happened.
fn apply_fetch(
    state: &RwLock<BoardState>,
    revision: &watch::Sender<u64>,
    generation: u64,
    status: SourceStatus,
    points: Vec<MapPoint>,
) -> bool {
    let region = BoundingRegion::enclosing(&points);
    let applied = {
        let mut state = state.write().expect("map board lock poisoned");
        if state.generation == generation {
            state.status = status;
            state.points = points;
            state.region = region;
            true
        } else {
            log::debug!(
                "map: discarding stale result (generation {generation}, current {})",
                state.generation,
            );
            false
        }
    };
    if applied {
        revision.send_modify(|rev| *rev += 1);
    }
    applied
}

/// Fetches the consolidated point list and classifies every record.
async fn fetch_points(client: &reqwest::Client, url: &str) -> Result<Vec<MapPoint>, MapError> {
    log::debug!("map: fetching {url}");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MapError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let raw = response.json::<Vec<RawMapPoint>>().await?;
    Ok(raw.into_iter().map(MapPoint::classify).collect())
}
