#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-source analytics aggregation for the dashboard charts.
//!
//! A [`ChartBoard`] issues six independent fetches per activation, one
//! per anomaly pattern, against the endpoints in [`registry`]. Each
//! source resolves on its own: a slow or failing endpoint never blanks
//! out the other five charts, and no slot waits on a sibling.
//!
//! Every activation bumps a generation counter; completions are
//! applied only if they belong to the current generation, so late
//! responses from an earlier activation can never overwrite fresh
//! data.

pub mod registry;
pub mod source_def;

use std::sync::{Arc, Mutex, RwLock};

use sentinel_analytics_models::{
    BypassSampleRow, ChildMismatchRow, DistrictZScoreRow, RoundShareRow, SourceSlot, SourceStatus,
    StateBreakdownRow, WeekdayTrendRow,
};
use sentinel_anomaly_models::AnomalyType;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Errors that can occur while loading one analytics source.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from a source endpoint.
    #[error("HTTP {status} for source {source_id}")]
    HttpStatus {
        /// Source that failed.
        source_id: String,
        /// HTTP status code.
        status: u16,
    },
}

/// One slot per analytics source, each with its own load state.
#[derive(Debug, Clone, Default)]
struct Slots {
    phantom_village: SourceSlot<StateBreakdownRow>,
    update_mill: SourceSlot<DistrictZScoreRow>,
    biometric_bypass: SourceSlot<BypassSampleRow>,
    scholarship_ghost: SourceSlot<ChildMismatchRow>,
    bot_operator: SourceSlot<RoundShareRow>,
    sunday_shift: SourceSlot<WeekdayTrendRow>,
}

/// Slots plus the activation generation they belong to.
#[derive(Debug, Default)]
struct BoardState {
    generation: u64,
    slots: Slots,
}

/// Aggregation board behind the six per-anomaly chart panels.
///
/// Shared by `Arc`; reads are snapshots, changes are announced on a
/// [`watch`] revision channel. Lock poisoning is treated as fatal.
pub struct ChartBoard {
    state: Arc<RwLock<BoardState>>,
    revision: Arc<watch::Sender<u64>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for ChartBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartBoard {
    /// Creates a board with every slot `Pending` and no fetches
    /// running.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(BoardState::default())),
            revision: Arc::new(revision),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Starts a new activation: resets every slot to `Pending`, bumps
    /// the generation, and launches the six fetches concurrently.
    ///
    /// Safe to call again at any time (manual refresh); in-flight
    /// fetches from the previous activation are aborted and anything
    /// that still resolves is discarded by the generation check.
    pub fn activate(&self, client: &reqwest::Client, base_url: &str) {
        let base = base_url.trim_end_matches('/');
        let generation = {
            let mut state = self.state.write().expect("chart board lock poisoned");
            state.generation += 1;
            state.slots = Slots::default();
            state.generation
        };
        self.revision.send_modify(|rev| *rev += 1);
        log::info!("analytics: activation {generation} against {base}");

        let mut tasks = self.tasks.lock().expect("chart board task list poisoned");
        for handle in tasks.drain(..) {
            handle.abort();
        }
        for source in registry::all_sources() {
            let url = format!("{base}{}", source.path);
            let handle = match source.anomaly {
                AnomalyType::PhantomVillage => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.phantom_village = slot,
                ),
                AnomalyType::UpdateMill => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.update_mill = slot,
                ),
                AnomalyType::BiometricBypass => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.biometric_bypass = slot,
                ),
                AnomalyType::ScholarshipGhost => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.scholarship_ghost = slot,
                ),
                AnomalyType::BotOperator => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.bot_operator = slot,
                ),
                AnomalyType::SundayShift => self.spawn_fetch(
                    generation,
                    client.clone(),
                    url,
                    source.id,
                    |slots, slot| slots.sunday_shift = slot,
                ),
            };
            tasks.push(handle);
        }
    }

    /// Aborts in-flight fetches and invalidates their generation, so
    /// nothing resolves into the board after teardown. Loaded slots
    /// keep their last rows.
    pub fn detach(&self) {
        log::debug!("analytics: detaching");
        self.state
            .write()
            .expect("chart board lock poisoned")
            .generation += 1;
        let mut tasks = self.tasks.lock().expect("chart board task list poisoned");
        for handle in tasks.drain(..) {
            handle.abort();
        }
    }

    #[must_use]
    pub fn phantom_village(&self) -> SourceSlot<StateBreakdownRow> {
        self.read().slots.phantom_village.clone()
    }

    #[must_use]
    pub fn update_mill(&self) -> SourceSlot<DistrictZScoreRow> {
        self.read().slots.update_mill.clone()
    }

    #[must_use]
    pub fn biometric_bypass(&self) -> SourceSlot<BypassSampleRow> {
        self.read().slots.biometric_bypass.clone()
    }

    #[must_use]
    pub fn scholarship_ghost(&self) -> SourceSlot<ChildMismatchRow> {
        self.read().slots.scholarship_ghost.clone()
    }

    #[must_use]
    pub fn bot_operator(&self) -> SourceSlot<RoundShareRow> {
        self.read().slots.bot_operator.clone()
    }

    #[must_use]
    pub fn sunday_shift(&self) -> SourceSlot<WeekdayTrendRow> {
        self.read().slots.sunday_shift.clone()
    }

    /// Per-source load state, in dashboard display order.
    #[must_use]
    pub fn statuses(&self) -> Vec<(AnomalyType, SourceStatus)> {
        let state = self.read();
        AnomalyType::all()
            .into_iter()
            .map(|anomaly| {
                let status = match anomaly {
                    AnomalyType::PhantomVillage => state.slots.phantom_village.status,
                    AnomalyType::UpdateMill => state.slots.update_mill.status,
                    AnomalyType::BiometricBypass => state.slots.biometric_bypass.status,
                    AnomalyType::ScholarshipGhost => state.slots.scholarship_ghost.status,
                    AnomalyType::BotOperator => state.slots.bot_operator.status,
                    AnomalyType::SundayShift => state.slots.sunday_shift.status,
                };
                (anomaly, status)
            })
            .collect()
    }

    /// Current activation generation (0 before the first activation).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Monotonic revision, bumped whenever any slot changes.
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
        self.state.read().expect("chart board lock poisoned")
    }

    fn spawn_fetch<T, F>(
        &self,
        generation: u64,
        client: reqwest::Client,
        url: String,
        source_id: String,
        write: F,
    ) -> JoinHandle<()>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(&mut Slots, SourceSlot<T>) + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let revision = Arc::clone(&self.revision);
        tokio::spawn(async move {
            let slot = match fetch_rows::<T>(&client, &source_id, &url).await {
                Ok(rows) => {
                    log::info!("analytics: {source_id} loaded {} rows", rows.len());
                    SourceSlot::loaded(rows)
                }
                Err(e) => {
                    log::error!("analytics: {source_id} failed: {e}");
                    SourceSlot::failed()
                }
            };
            apply_slot(&state, &revision, generation, &source_id, slot, write);
        })
    }
}

impl Drop for ChartBoard {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for handle in tasks.drain(..) {
                handle.abort();
            }
        }
    }
}

/// Writes a completed slot into the board unless a newer activation
/// has superseded `generation`. Returns whether the write happened.
fn apply_slot<T, F>(
    state: &RwLock<BoardState>,
    revision: &watch::Sender<u64>,
    generation: u64,
    source_id: &str,
    slot: SourceSlot<T>,
    write: F,
) -> bool
where
    F: FnOnce(&mut Slots, SourceSlot<T>),
{
    let applied = {
        let mut state = state.write().expect("chart board lock poisoned");
        if state.generation == generation {
            write(&mut state.slots, slot);
            true
        } else {
            log::debug!(
                "analytics: discarding stale {source_id} result \
                 (generation {generation}, current {})",
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

/// Fetches and decodes one source's rows.
async fn fetch_rows<T>(
    client: &reqwest::Client,
    source_id: &str,
    url: &str,
) -> Result<Vec<T>, AnalyticsError>
where
    T: DeserializeOwned,
{
    log::debug!("analytics: fetching {source_id} from {url}");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AnalyticsError::HttpStatus {
            source_id: source_id.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json::<Vec<T>>().await?)
}
