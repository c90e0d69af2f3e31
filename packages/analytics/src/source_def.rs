//! Config-driven analytics source definition.
//!
//! [`SourceDef`] captures everything unique about one per-anomaly
//! analytics endpoint in a serializable config struct, so the board
//! logic stays generic over all six sources.

use sentinel_anomaly_models::AnomalyType;
use serde::Deserialize;

/// One per-anomaly analytics endpoint, loaded from embedded TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDef {
    /// Unique identifier (e.g., `"phantom_village"`).
    pub id: String,
    /// Anomaly pattern this source charts (canonical wire tag).
    pub anomaly: AnomalyType,
    /// Human-readable panel label.
    pub label: String,
    /// Endpoint path relative to the API base URL.
    pub path: String,
    /// Shape hint for the rendering surface. Data-only here.
    pub chart: ChartKind,
}

/// Chart shape a source's rows are rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    StackedBar,
    Bar,
    Scatter,
    GroupedBar,
    Pie,
    Line,
}

/// Parses one embedded TOML source definition.
///
/// # Errors
///
/// Returns an error if the document does not match [`SourceDef`].
pub fn parse_source_toml(raw: &str) -> Result<SourceDef, toml::de::Error> {
    toml::from_str(raw)
}
