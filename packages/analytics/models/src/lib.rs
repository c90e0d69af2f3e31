#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart row types for the six per-anomaly analytics sources, plus the
//! per-source load state the board exposes.
//!
//! Field names mirror the backend's JSON keys exactly (including the
//! trailing-underscore age-band columns) so the rows deserialize
//! straight off the wire.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

// ── Chart rows, one type per anomaly source ──────────────────────────────

/// Phantom Village: normal vs anomalous enrolment counts by state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBreakdownRow {
    pub state: String,
    pub normal_count: u64,
    pub anomaly_count: u64,
}

/// Update Mill: demographic-update volume z-score by district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictZScoreRow {
    pub district: String,
    pub z_score: f64,
}

/// Biometric Bypass: one flagged operator sample for the risk scatter.
///
/// `demo_age_17_` / `bio_age_17_` are the backend's names for the
/// adult (17+) demographic and biometric update counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BypassSampleRow {
    pub demo_age_17_: f64,
    pub bio_age_17_: f64,
    pub risk_score: f64,
}

/// Scholarship Ghost: child demographic vs biometric updates by
/// district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildMismatchRow {
    pub district: String,
    pub demo_age_5_17: u64,
    pub bio_age_5_17: u64,
    pub mismatch_ratio: f64,
}

/// Bot Operator: one share of the round-number enrolment split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundShareRow {
    pub name: String,
    pub value: u64,
}

/// Sunday Shift: mean adult enrolments per weekday.
///
/// `age_18_greater` is `None` for a weekday the backend has no data
/// for; `Some(0.0)` is a real measured zero and renders as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayTrendRow {
    pub day_of_week: String,
    #[serde(default)]
    pub age_18_greater: Option<f64>,
}

// ── Per-source load state ────────────────────────────────────────────────

/// Load state of one analytics source. Each source transitions on its
/// own request's completion, never on a sibling's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum SourceStatus {
    /// Fetch issued, no response yet.
    Pending,
    /// Rows replaced by a successful response.
    Loaded,
    /// Request failed; rows are empty. Not retried automatically.
    Failed,
}

/// One source's rows together with its load state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSlot<T> {
    pub status: SourceStatus,
    pub rows: Vec<T>,
}

impl<T> Default for SourceSlot<T> {
    fn default() -> Self {
        Self {
            status: SourceStatus::Pending,
            rows: Vec::new(),
        }
    }
}

impl<T> SourceSlot<T> {
    /// Slot for a source that resolved successfully.
    #[must_use]
    pub const fn loaded(rows: Vec<T>) -> Self {
        Self {
            status: SourceStatus::Loaded,
            rows,
        }
    }

    /// Slot for a source whose request failed.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: SourceStatus::Failed,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, SourceStatus::Pending)
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self.status, SourceStatus::Loaded)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        BypassSampleRow, RoundShareRow, SourceSlot, SourceStatus, StateBreakdownRow,
        WeekdayTrendRow,
    };

    #[test]
    fn slots_start_pending_and_empty() {
        let slot = SourceSlot::<StateBreakdownRow>::default();
        assert!(slot.is_pending());
        assert!(slot.rows.is_empty());
    }

    #[test]
    fn failed_slots_carry_no_rows() {
        let slot = SourceSlot::<RoundShareRow>::failed();
        assert_eq!(slot.status, SourceStatus::Failed);
        assert!(slot.rows.is_empty());
    }

    #[test]
    fn state_breakdown_decodes_from_backend_keys() {
        let rows: Vec<StateBreakdownRow> = serde_json::from_value(json!([
            { "state": "Bihar", "normal_count": 120, "anomaly_count": 30 }
        ]))
        .unwrap();
        assert_eq!(rows[0].state, "Bihar");
        assert_eq!(rows[0].anomaly_count, 30);
    }

    #[test]
    fn bypass_rows_keep_trailing_underscore_keys() {
        let rows: Vec<BypassSampleRow> = serde_json::from_value(json!([
            { "demo_age_17_": 41.0, "bio_age_17_": 3.0, "risk_score": 0.93 }
        ]))
        .unwrap();
        assert!((rows[0].demo_age_17_ - 41.0).abs() < f64::EPSILON);
        assert!((rows[0].risk_score - 0.93).abs() < f64::EPSILON);
    }

    #[test]
    fn weekday_mean_distinguishes_null_from_zero() {
        let rows: Vec<WeekdayTrendRow> = serde_json::from_value(json!([
            { "day_of_week": "Sunday", "age_18_greater": 44.5 },
            { "day_of_week": "Monday", "age_18_greater": 0.0 },
            { "day_of_week": "Tuesday", "age_18_greater": null },
            { "day_of_week": "Wednesday" }
        ]))
        .unwrap();
        assert_eq!(rows[0].age_18_greater, Some(44.5));
        assert_eq!(rows[1].age_18_greater, Some(0.0));
        assert_eq!(rows[2].age_18_greater, None);
        assert_eq!(rows[3].age_18_greater, None);
    }

    #[test]
    fn source_status_round_trips_through_strum() {
        assert_eq!(SourceStatus::Loaded.to_string(), "Loaded");
        assert_eq!("Failed".parse::<SourceStatus>(), Ok(SourceStatus::Failed));
    }
}
