//! Source registry: loads all analytics source definitions from
//! embedded TOML configs.
//!
//! Each `.toml` file in `packages/analytics/sources/` is baked into the
//! binary at compile time via [`include_str!`], one per anomaly
//! pattern tracked by the dashboard.

use crate::source_def::{SourceDef, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    (
        "phantom_village",
        include_str!("../sources/phantom_village.toml"),
    ),
    ("update_mill", include_str!("../sources/update_mill.toml")),
    (
        "biometric_bypass",
        include_str!("../sources/biometric_bypass.toml"),
    ),
    (
        "scholarship_ghost",
        include_str!("../sources/scholarship_ghost.toml"),
    ),
    ("bot_operator", include_str!("../sources/bot_operator.toml")),
    ("sunday_shift", include_str!("../sources/sunday_shift.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 6;

/// Returns all configured source definitions, parsed from embedded
/// TOML, in dashboard display order.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time
/// guarantee since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDef> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}
