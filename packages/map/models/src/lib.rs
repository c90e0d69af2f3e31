#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial point model for the anomaly map.
//!
//! The consolidated map endpoint returns a flat list of records whose
//! optional metric fields depend entirely on the record's anomaly tag.
//! Classification turns each record into a [`MapPoint`] carrying only
//! the metrics defined for its type, so rendering never has to guess
//! which fields apply.

use sentinel_anomaly_models::{AnomalyClass, AnomalyType};
use serde::Deserialize;

/// Degrees of padding added on each side of the minimal rectangle when
/// framing the camera around a point set.
pub const FRAME_PADDING_DEG: f64 = 0.5;

/// Initial camera over India, used when no bounding region is
/// available (empty point list, or nothing loaded yet).
pub const DEFAULT_VIEW: MapView = MapView {
    lat: 22.5937,
    lng: 78.9629,
    zoom: 5,
};

/// A camera position for the map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

/// One record from the consolidated map endpoint, as sent on the wire.
///
/// Which optional metric fields are populated depends entirely on the
/// `type` tag. An absent field means "not applicable to this type",
/// never zero. The `demo_age_17_` spelling (trailing underscore) is
/// the backend's column name and is kept verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMapPoint {
    pub pincode: u32,
    pub district: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    /// Anomaly-type tag, e.g. `"Phantom Village"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub age_18_greater: Option<u64>,
    #[serde(default)]
    pub z_score: Option<f64>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub round_pct: Option<f64>,
    #[serde(default)]
    pub demo_age_5_17: Option<u64>,
    #[serde(default)]
    pub bio_age_5_17: Option<u64>,
    #[serde(default)]
    pub demo_age_17_: Option<u64>,
}

/// A classified map point ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub pincode: u32,
    pub district: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    /// Taxonomy entry the point's tag classified under.
    pub class: AnomalyClass,
    /// Metrics defined for the point's type, and nothing else.
    pub metrics: PointMetrics,
}

impl MapPoint {
    /// Classifies a wire record under the taxonomy and extracts the
    /// metrics defined for its type. Unrecognized tags are kept under
    /// the neutral theme with no metrics, never dropped.
    #[must_use]
    pub fn classify(raw: RawMapPoint) -> Self {
        let class = AnomalyClass::of(&raw.kind);
        let metrics = PointMetrics::extract(class, &raw);
        Self {
            pincode: raw.pincode,
            district: raw.district,
            state: raw.state,
            lat: raw.lat,
            lng: raw.lng,
            class,
            metrics,
        }
    }

    /// Marker color for this point.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        self.class.color()
    }
}

/// Type-specific metrics carried by a map point.
///
/// One variant per anomaly type, enumerating exactly the metric fields
/// that type's detector emits. `Option` distinguishes "absent in the
/// record" from "present and zero".
#[derive(Debug, Clone, PartialEq)]
pub enum PointMetrics {
    PhantomVillage {
        adult_enrolments: Option<u64>,
    },
    UpdateMill {
        z_score: Option<f64>,
        demo_updates: Option<u64>,
    },
    BiometricBypass {
        risk_ratio: Option<f64>,
    },
    ScholarshipGhost {
        demo_child_updates: Option<u64>,
        bio_child_updates: Option<u64>,
    },
    BotOperator {
        round_share_pct: Option<f64>,
    },
    SundayShift {
        adult_enrolments: Option<u64>,
    },
    /// Unknown tag; no metrics apply.
    Unclassified,
}

impl PointMetrics {
    fn extract(class: AnomalyClass, raw: &RawMapPoint) -> Self {
        match class {
            AnomalyClass::Known(AnomalyType::PhantomVillage) => Self::PhantomVillage {
                adult_enrolments: raw.age_18_greater,
            },
            AnomalyClass::Known(AnomalyType::UpdateMill) => Self::UpdateMill {
                z_score: raw.z_score,
                demo_updates: raw.demo_age_17_,
            },
            AnomalyClass::Known(AnomalyType::BiometricBypass) => Self::BiometricBypass {
                risk_ratio: raw.risk_score,
            },
            AnomalyClass::Known(AnomalyType::ScholarshipGhost) => Self::ScholarshipGhost {
                demo_child_updates: raw.demo_age_5_17,
                bio_child_updates: raw.bio_age_5_17,
            },
            AnomalyClass::Known(AnomalyType::BotOperator) => Self::BotOperator {
                round_share_pct: raw.round_pct,
            },
            AnomalyClass::Known(AnomalyType::SundayShift) => Self::SundayShift {
                adult_enrolments: raw.age_18_greater,
            },
            AnomalyClass::Unknown => Self::Unclassified,
        }
    }

    /// Display pairs for exactly the metrics present on this point.
    ///
    /// Floats are formatted to two decimals. A present zero renders as
    /// `"0"`; an absent field is omitted entirely.
    #[must_use]
    pub fn details(&self) -> Vec<MetricDetail> {
        let mut details = Vec::new();
        match self {
            Self::PhantomVillage { adult_enrolments } | Self::SundayShift { adult_enrolments } => {
                push_count(&mut details, "Adult Vol", *adult_enrolments);
            }
            Self::UpdateMill {
                z_score,
                demo_updates,
            } => {
                push_scaled(&mut details, "Z-Score", *z_score);
                push_count(&mut details, "Demo Updates", *demo_updates);
            }
            Self::BiometricBypass { risk_ratio } => {
                push_scaled(&mut details, "Risk Ratio", *risk_ratio);
            }
            Self::ScholarshipGhost {
                demo_child_updates,
                bio_child_updates,
            } => {
                push_count(&mut details, "Demo Updates (5-17)", *demo_child_updates);
                push_count(&mut details, "Bio Updates (5-17)", *bio_child_updates);
            }
            Self::BotOperator { round_share_pct } => {
                push_scaled(&mut details, "Round Share %", *round_share_pct);
            }
            Self::Unclassified => {}
        }
        details
    }
}

/// One labelled, formatted metric for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDetail {
    pub label: &'static str,
    pub value: String,
}

fn push_count(details: &mut Vec<MetricDetail>, label: &'static str, value: Option<u64>) {
    if let Some(value) = value {
        details.push(MetricDetail {
            label,
            value: value.to_string(),
        });
    }
}

fn push_scaled(details: &mut Vec<MetricDetail>, label: &'static str, value: Option<f64>) {
    if let Some(value) = value {
        details.push(MetricDetail {
            label,
            value: format!("{value:.2}"),
        });
    }
}

/// Latitude/longitude rectangle framing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingRegion {
    /// Minimal rectangle containing every point's coordinates,
    /// expanded by [`FRAME_PADDING_DEG`] on each side.
    ///
    /// Returns `None` for an empty list: with nothing to frame, the
    /// surface keeps its previous or default view.
    #[must_use]
    pub fn enclosing(points: &[MapPoint]) -> Option<Self> {
        let mut points = points.iter();
        let first = points.next()?;
        let mut south = first.lat;
        let mut west = first.lng;
        let mut north = first.lat;
        let mut east = first.lng;
        for point in points {
            south = south.min(point.lat);
            west = west.min(point.lng);
            north = north.max(point.lat);
            east = east.max(point.lng);
        }
        Some(Self {
            south: south - FRAME_PADDING_DEG,
            west: west - FRAME_PADDING_DEG,
            north: north + FRAME_PADDING_DEG,
            east: east + FRAME_PADDING_DEG,
        })
    }

    /// Whether the rectangle contains the coordinate.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: serde_json::Value) -> RawMapPoint {
        serde_json::from_value(value).unwrap()
    }

    fn point(lat: f64, lng: f64) -> MapPoint {
        MapPoint::classify(raw(json!({
            "pincode": 800_001,
            "district": "Patna",
            "state": "Bihar",
            "lat": lat,
            "lng": lng,
            "type": "Phantom Village",
        })))
    }

    #[test]
    fn classifies_known_tag_with_its_metrics() {
        let point = MapPoint::classify(raw(json!({
            "pincode": 110_001,
            "district": "New Delhi",
            "state": "Delhi",
            "lat": 28.6139,
            "lng": 77.209,
            "type": "Update Mill",
            "z_score": 4.267,
            "demo_age_17_": 180,
        })));

        assert_eq!(point.class, AnomalyClass::Known(AnomalyType::UpdateMill));
        assert_eq!(point.color(), "#F59E0B");
        let details = point.metrics.details();
        assert_eq!(details[0].label, "Z-Score");
        assert_eq!(details[0].value, "4.27");
        assert_eq!(details[1].label, "Demo Updates");
        assert_eq!(details[1].value, "180");
    }

    #[test]
    fn unknown_tags_are_kept_not_dropped() {
        let point = MapPoint::classify(raw(json!({
            "pincode": 560_001,
            "district": "Bengaluru",
            "state": "Karnataka",
            "lat": 12.9716,
            "lng": 77.5946,
            "type": "Quantum Fraud",
        })));

        assert_eq!(point.class, AnomalyClass::Unknown);
        assert_eq!(point.color(), AnomalyClass::UNKNOWN_COLOR);
        assert_eq!(point.metrics, PointMetrics::Unclassified);
        assert!(point.metrics.details().is_empty());
    }

    #[test]
    fn each_type_reads_only_its_own_fields() {
        // Every optional field populated; extraction must still pick
        // out only the fields defined for the tag.
        let with_everything = |tag: &str| {
            raw(json!({
                "pincode": 1,
                "district": "D",
                "state": "S",
                "lat": 0.0,
                "lng": 0.0,
                "type": tag,
                "age_18_greater": 7,
                "z_score": 1.5,
                "risk_score": 2.5,
                "round_pct": 88.0,
                "demo_age_5_17": 40,
                "bio_age_5_17": 4,
                "demo_age_17_": 100,
            }))
        };

        assert_eq!(
            MapPoint::classify(with_everything("Biometric Bypass")).metrics,
            PointMetrics::BiometricBypass {
                risk_ratio: Some(2.5)
            }
        );
        assert_eq!(
            MapPoint::classify(with_everything("Bot Operator")).metrics,
            PointMetrics::BotOperator {
                round_share_pct: Some(88.0)
            }
        );
        assert_eq!(
            MapPoint::classify(with_everything("Scholarship Ghost")).metrics,
            PointMetrics::ScholarshipGhost {
                demo_child_updates: Some(40),
                bio_child_updates: Some(4)
            }
        );
        assert_eq!(
            MapPoint::classify(with_everything("Sunday Shift")).metrics,
            PointMetrics::SundayShift {
                adult_enrolments: Some(7)
            }
        );
    }

    #[test]
    fn zero_metric_renders_as_zero_absent_is_omitted() {
        let zero = MapPoint::classify(raw(json!({
            "pincode": 1,
            "district": "D",
            "state": "S",
            "lat": 0.0,
            "lng": 0.0,
            "type": "Phantom Village",
            "age_18_greater": 0,
        })));
        assert_eq!(
            zero.metrics.details(),
            vec![MetricDetail {
                label: "Adult Vol",
                value: "0".to_string()
            }]
        );

        let absent = MapPoint::classify(raw(json!({
            "pincode": 1,
            "district": "D",
            "state": "S",
            "lat": 0.0,
            "lng": 0.0,
            "type": "Phantom Village",
        })));
        assert!(absent.metrics.details().is_empty());
    }

    #[test]
    fn region_contains_every_point_with_padding() {
        let points = vec![
            point(28.6139, 77.209),
            point(19.076, 72.8777),
            point(13.0827, 80.2707),
        ];

        let region = BoundingRegion::enclosing(&points).unwrap();
        for p in &points {
            assert!(region.contains(p.lat, p.lng));
        }
        assert!((region.south - (13.0827 - 0.5)).abs() < 1e-9);
        assert!((region.north - (28.6139 + 0.5)).abs() < 1e-9);
        assert!((region.west - (72.8777 - 0.5)).abs() < 1e-9);
        assert!((region.east - (80.2707 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn single_point_region_is_padding_sized() {
        let region = BoundingRegion::enclosing(&[point(22.0, 78.0)]).unwrap();
        assert!((region.north - region.south - 1.0).abs() < 1e-9);
        assert!((region.east - region.west - 1.0).abs() < 1e-9);
        assert!(region.contains(22.0, 78.0));
    }

    #[test]
    fn empty_point_list_has_no_region() {
        assert_eq!(BoundingRegion::enclosing(&[]), None);
    }
}
