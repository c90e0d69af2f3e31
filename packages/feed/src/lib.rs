#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Live alert feed subscription.
//!
//! Consumes the backend's push channel and applies every detection
//! event to an [`AlertStore`] as it arrives. The transport sits behind
//! the [`PushChannel`] trait so tests can script whole sessions;
//! production uses the server-sent-events transport in [`sse`].
//!
//! The subscription owns one background task for its entire life:
//! connect, pump events, and on any disconnect or server close retry
//! forever with capped exponential backoff. Events missed while
//! disconnected are lost; the protocol has no acknowledgment or replay.
//! Feed health is observable through a [`FeedStatus`] watch channel.

pub mod sse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sentinel_alert_models::{Alert, PushEvent};
use sentinel_alerts::AlertStore;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

/// Errors that can occur on the push channel.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the feed endpoint.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A frame or session could not be decoded.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },
}

/// Health of the live feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No session established yet.
    Connecting,
    /// Attached to the push channel and applying events.
    Live,
    /// Connection lost after having been live. The store keeps its
    /// last data while the task reconnects in the background.
    Stale,
    /// Shut down; no further events will be applied.
    Stopped,
}

/// One established push-channel session.
#[async_trait]
pub trait EventStream: Send {
    /// Waits for the next event on this session.
    ///
    /// Returns `Ok(None)` when the server closes the stream cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the connection breaks or a frame
    /// cannot be read.
    async fn next_event(&mut self) -> Result<Option<PushEvent>, FeedError>;
}

/// Transport seam for the live feed.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Opens a fresh session against the feed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the session cannot be established.
    async fn open(&self) -> Result<Box<dyn EventStream>, FeedError>;
}

/// Reconnect backoff ladder: 2s, 4s, 8s, ... capped at 60s.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub base_delay: Duration,
    /// Ceiling for the ladder.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << shift) // 2s, 4s, 8s
            .min(self.max_delay)
    }
}

/// Handle to the live feed task.
///
/// [`Self::shutdown`] tears the task down and waits for it; dropping
/// the handle without shutting down aborts the task at its next await
/// point.
pub struct FeedSubscription {
    handle: Option<JoinHandle<()>>,
    stop: Arc<Notify>,
    status: watch::Receiver<FeedStatus>,
}

impl FeedSubscription {
    /// Starts the feed task with the default reconnect policy.
    #[must_use]
    pub fn start<C>(channel: C, store: AlertStore) -> Self
    where
        C: PushChannel + 'static,
    {
        Self::start_with_policy(channel, store, ReconnectPolicy::default())
    }

    #[must_use]
    pub fn start_with_policy<C>(channel: C, store: AlertStore, policy: ReconnectPolicy) -> Self
    where
        C: PushChannel + 'static,
    {
        let (status_tx, status) = watch::channel(FeedStatus::Connecting);
        let stop = Arc::new(Notify::new());
        let handle = tokio::spawn(run_feed(
            channel,
            store,
            policy,
            status_tx,
            Arc::clone(&stop),
        ));
        Self {
            handle: Some(handle),
            stop,
            status,
        }
    }

    /// Current connection health.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        *self.status.borrow()
    }

    /// Subscribes to connection health transitions.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<FeedStatus> {
        self.status.clone()
    }

    /// Stops the feed task and waits for it to exit.
    ///
    /// After this returns no further events are applied to the store.
    pub async fn shutdown(mut self) {
        log::info!("feed: shutting down");
        self.stop.notify_one();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::warn!("feed: task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// Connect/pump/reconnect loop driven by [`FeedSubscription`].
async fn run_feed<C>(
    channel: C,
    store: AlertStore,
    policy: ReconnectPolicy,
    status: watch::Sender<FeedStatus>,
    stop: Arc<Notify>,
) where
    C: PushChannel,
{
    let mut attempt: u32 = 0;

    'outer: loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("feed: reconnect attempt {attempt} in {delay:?}");
            tokio::select! {
                () = stop.notified() => break 'outer,
                () = tokio::time::sleep(delay) => {}
            }
        }

        let opened = tokio::select! {
            () = stop.notified() => break 'outer,
            opened = channel.open() => opened,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                // Status is left alone here: still Connecting if we
                // never had a session, Stale if a live one dropped.
                log::error!("feed: connect failed: {e}");
                attempt += 1;
                continue;
            }
        };

        log::info!("feed: live");
        attempt = 1;
        status.send_replace(FeedStatus::Live);

        loop {
            let next = tokio::select! {
                () = stop.notified() => break 'outer,
                next = stream.next_event() => next,
            };
            match next {
                Ok(Some(event)) => store.insert(Alert::from_event(event)),
                Ok(None) => {
                    log::warn!("feed: server closed the stream");
                    break;
                }
                Err(e) => {
                    log::warn!("feed: stream error: {e}");
                    break;
                }
            }
        }

        status.send_replace(FeedStatus::Stale);
    }

    status.send_replace(FeedStatus::Stopped);
    log::info!("feed: stopped");
}
