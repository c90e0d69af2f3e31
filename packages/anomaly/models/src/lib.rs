#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Anomaly taxonomy shared across the dashboard crates.
//!
//! Every alert and analytics source is keyed by one of six anomaly
//! patterns. The wire tag (`"Phantom Village"`, `"Update Mill"`, ...)
//! is the canonical identifier; everything else here is presentation
//! metadata derived from it.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Operator-facing criticality of an anomaly pattern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Criticality {
    Critical,
    High,
    Medium,
}

/// The six anomaly patterns the dashboard tracks.
///
/// Wire tags carry spaces, so both `serde` and `strum` serialise each
/// variant through an explicit rename rather than a case convention.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum AnomalyType {
    #[serde(rename = "Phantom Village")]
    #[strum(serialize = "Phantom Village")]
    PhantomVillage,
    #[serde(rename = "Update Mill")]
    #[strum(serialize = "Update Mill")]
    UpdateMill,
    #[serde(rename = "Biometric Bypass")]
    #[strum(serialize = "Biometric Bypass")]
    BiometricBypass,
    #[serde(rename = "Scholarship Ghost")]
    #[strum(serialize = "Scholarship Ghost")]
    ScholarshipGhost,
    #[serde(rename = "Bot Operator")]
    #[strum(serialize = "Bot Operator")]
    BotOperator,
    #[serde(rename = "Sunday Shift")]
    #[strum(serialize = "Sunday Shift")]
    SundayShift,
}

impl AnomalyType {
    /// All patterns, in dashboard display order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::PhantomVillage,
            Self::UpdateMill,
            Self::BiometricBypass,
            Self::ScholarshipGhost,
            Self::BotOperator,
            Self::SundayShift,
        ]
    }

    /// Canonical wire tag, e.g. `"Phantom Village"`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::PhantomVillage => "Phantom Village",
            Self::UpdateMill => "Update Mill",
            Self::BiometricBypass => "Biometric Bypass",
            Self::ScholarshipGhost => "Scholarship Ghost",
            Self::BotOperator => "Bot Operator",
            Self::SundayShift => "Sunday Shift",
        }
    }

    /// Short label shown in legends and panel headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.tag()
    }

    /// Hex colour used for markers and chart series of this pattern.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::PhantomVillage => "#EF4444",
            Self::UpdateMill => "#F59E0B",
            Self::BiometricBypass => "#8B5CF6",
            Self::ScholarshipGhost => "#3B82F6",
            Self::BotOperator => "#10B981",
            Self::SundayShift => "#EC4899",
        }
    }

    #[must_use]
    pub const fn criticality(self) -> Criticality {
        match self {
            Self::PhantomVillage => Criticality::Critical,
            Self::UpdateMill | Self::BiometricBypass | Self::SundayShift => Criticality::High,
            Self::ScholarshipGhost | Self::BotOperator => Criticality::Medium,
        }
    }

    /// One-line operator briefing for the pattern.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PhantomVillage => {
                "Bulk enrolments registered from villages with little or no resident population"
            }
            Self::UpdateMill => {
                "A single centre pushing abnormally high volumes of demographic updates"
            }
            Self::BiometricBypass => {
                "Adult enrolments completed with biometric capture skipped or overridden"
            }
            Self::ScholarshipGhost => {
                "Child demographic updates far outpacing biometric updates for the same district"
            }
            Self::BotOperator => {
                "Operator activity with machine-regular timing and suspiciously round volumes"
            }
            Self::SundayShift => {
                "Enrolment spikes on Sundays and holidays when centres should be closed"
            }
        }
    }
}

/// Classification of an arbitrary wire tag against the known taxonomy.
///
/// Feeds occasionally carry pattern names this build does not know yet.
/// Those alerts are still stored and rendered, they just fall back to
/// the neutral theme instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyClass {
    Known(AnomalyType),
    Unknown,
}

impl AnomalyClass {
    /// Colour used when a tag does not match any known pattern.
    pub const UNKNOWN_COLOR: &'static str = "#333333";

    /// Classifies a raw wire tag. Unrecognised tags are preserved as
    /// [`Self::Unknown`] rather than rejected.
    #[must_use]
    pub fn of(tag: &str) -> Self {
        tag.parse::<AnomalyType>().map_or(Self::Unknown, Self::Known)
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Known(kind) => kind.color(),
            Self::Unknown => Self::UNKNOWN_COLOR,
        }
    }

    #[must_use]
    pub const fn known(self) -> Option<AnomalyType> {
        match self {
            Self::Known(kind) => Some(kind),
            Self::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnomalyClass, AnomalyType, Criticality};

    #[test]
    fn tags_round_trip_through_strum() {
        for kind in AnomalyType::all() {
            let tag = kind.to_string();
            assert_eq!(tag, kind.tag());
            assert_eq!(tag.parse::<AnomalyType>(), Ok(kind));
        }
    }

    #[test]
    fn all_patterns_are_distinct() {
        let all = AnomalyType::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(a.tag(), b.tag());
                assert_ne!(a.color(), b.color());
            }
        }
    }

    #[test]
    fn criticality_matches_briefing_matrix() {
        assert_eq!(
            AnomalyType::PhantomVillage.criticality(),
            Criticality::Critical
        );
        assert_eq!(AnomalyType::UpdateMill.criticality(), Criticality::High);
        assert_eq!(
            AnomalyType::BiometricBypass.criticality(),
            Criticality::High
        );
        assert_eq!(
            AnomalyType::ScholarshipGhost.criticality(),
            Criticality::Medium
        );
        assert_eq!(AnomalyType::BotOperator.criticality(), Criticality::Medium);
        assert_eq!(AnomalyType::SundayShift.criticality(), Criticality::High);
    }

    #[test]
    fn criticality_serialises_screaming() {
        assert_eq!(Criticality::Critical.to_string(), "CRITICAL");
        assert_eq!("HIGH".parse::<Criticality>(), Ok(Criticality::High));
    }

    #[test]
    fn known_tags_classify_to_their_pattern() {
        assert_eq!(
            AnomalyClass::of("Phantom Village"),
            AnomalyClass::Known(AnomalyType::PhantomVillage)
        );
        assert_eq!(
            AnomalyClass::of("Phantom Village").color(),
            AnomalyType::PhantomVillage.color()
        );
    }

    #[test]
    fn unknown_tags_fall_back_to_neutral_theme() {
        let class = AnomalyClass::of("Ghost Exam Centre");
        assert_eq!(class, AnomalyClass::Unknown);
        assert_eq!(class.color(), "#333333");
        assert_eq!(class.known(), None);
    }
}
