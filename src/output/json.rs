//! JSON serialization for roofline reports.
//!
//! Random variables serialize as their summaries (mean, standard deviation,
//! quantiles, draw count), not as raw draws.

use crate::result::RooflineReport;

/// Serialize a RooflineReport to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RooflineReport).
pub fn to_json(report: &RooflineReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a RooflineReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RooflineReport).
pub fn to_json_pretty(report: &RooflineReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
