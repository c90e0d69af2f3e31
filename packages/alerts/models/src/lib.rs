#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Alert data models for the live feed.
//!
//! A [`PushEvent`] is what the detection backend emits on the wire. An
//! [`Alert`] is that event decorated with the client-side metadata the
//! operator screen needs: a stable identity, the local arrival time,
//! and a severity band.

use chrono::{DateTime, Local};
use sentinel_anomaly_models::{AnomalyClass, Criticality};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for the operator-facing arrival time.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Raw event pushed over the alert feed.
///
/// The backend names the pattern field `type`, which is reserved in
/// Rust, so it is carried here as `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub pincode: u32,
    pub message: String,
}

/// A feed event decorated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: String,
    pub pincode: u32,
    pub message: String,
    /// Wall-clock arrival time, already formatted with
    /// [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    pub severity: Criticality,
}

impl Alert {
    /// Decorates a push event with identity and arrival metadata,
    /// stamped with the current local time.
    #[must_use]
    pub fn from_event(event: PushEvent) -> Self {
        Self::from_event_at(event, Local::now())
    }

    /// Decorates a push event, stamping the given arrival time.
    ///
    /// Everything arriving over the live feed is a confirmed detection
    /// and is banded [`Criticality::Critical`]. The per-pattern
    /// criticality matrix applies to briefing panels, not the stream.
    #[must_use]
    pub fn from_event_at(event: PushEvent, arrived: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: event.kind,
            pincode: event.pincode,
            message: event.message,
            timestamp: arrived.format(TIMESTAMP_FORMAT).to_string(),
            severity: Criticality::Critical,
        }
    }

    /// Classifies the alert's pattern tag against the known taxonomy.
    #[must_use]
    pub fn class(&self) -> AnomalyClass {
        AnomalyClass::of(&self.kind)
    }
}
