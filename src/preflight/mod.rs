//! Quality checks run on the collected trials before fitting.
//!
//! None of these abort a run. They attach warnings to the report so a reader
//! can tell a trustworthy roofline from one measured on a noisy or
//! misconfigured host.
//!
//! # Checks Performed
//!
//! - **Variation**: coefficient of variation of each trial series
//! - **Resolution**: timed regions long enough for the clock, working set
//!   large enough to leave the cache hierarchy
//! - **System**: platform-specific checks (CPU governor, turbo, VM, load)

mod resolution;
mod system;
mod variation;

pub use resolution::{clock_check, resolution_check, working_set_check, ResolutionWarning};
pub use system::{system_check, SystemWarning};
pub use variation::{variation_check, VariationWarning};

use serde::{Deserialize, Serialize};

use crate::measurement::TrialSeries;

/// Result of running all preflight checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightResult {
    /// All warnings collected from preflight checks.
    pub warnings: PreflightWarnings,

    /// Whether any critical warnings were found.
    pub has_critical: bool,
}

impl Default for PreflightResult {
    fn default() -> Self {
        Self::new()
    }
}

impl PreflightResult {
    /// Create a new empty preflight result.
    pub fn new() -> Self {
        Self {
            warnings: PreflightWarnings::default(),
            has_critical: false,
        }
    }

    /// Add a variation warning.
    pub fn add_variation_warning(&mut self, warning: VariationWarning) {
        self.has_critical |= warning.is_critical();
        self.warnings.variation.push(warning);
    }

    /// Add a resolution warning.
    pub fn add_resolution_warning(&mut self, warning: ResolutionWarning) {
        self.has_critical |= warning.is_critical();
        self.warnings.resolution.push(warning);
    }

    /// Add a system warning.
    pub fn add_system_warning(&mut self, warning: SystemWarning) {
        self.warnings.system.push(warning);
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Human-readable descriptions of every warning, in check order.
    pub fn descriptions(&self) -> Vec<String> {
        let w = &self.warnings;
        w.variation
            .iter()
            .map(VariationWarning::description)
            .chain(w.resolution.iter().map(ResolutionWarning::description))
            .chain(w.system.iter().map(SystemWarning::description))
            .collect()
    }
}

/// Collection of all warnings from preflight checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightWarnings {
    /// Warnings from the variation check.
    pub variation: Vec<VariationWarning>,

    /// Warnings from the region-length and working-set checks.
    pub resolution: Vec<ResolutionWarning>,

    /// Warnings from system checks.
    pub system: Vec<SystemWarning>,
}

impl PreflightWarnings {
    /// Get total number of warnings.
    pub fn count(&self) -> usize {
        self.variation.len() + self.resolution.len() + self.system.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Run all preflight checks and collect warnings.
///
/// # Arguments
///
/// * `bandwidth` - Completed bandwidth trial series
/// * `compute` - Completed compute trial series
/// * `clock_resolution_secs` - Measured resolution of the interval timer, if
///   the clock advanced while it was measured
/// * `bandwidth_bytes` - Working-set size the bandwidth probe used
/// * `max_cv` - Coefficient of variation above which a series is flagged
///
/// # Returns
///
/// A `PreflightResult` containing all warnings.
pub fn run_all_checks(
    bandwidth: &TrialSeries,
    compute: &TrialSeries,
    clock_resolution_secs: Option<f64>,
    bandwidth_bytes: usize,
    max_cv: f64,
) -> PreflightResult {
    let mut result = PreflightResult::new();

    for series in [bandwidth, compute] {
        if let Some(warning) = variation_check(series, max_cv) {
            result.add_variation_warning(warning);
        }
    }

    match clock_check(clock_resolution_secs) {
        Some(warning) => result.add_resolution_warning(warning),
        None => {
            let res = clock_resolution_secs.unwrap_or(f64::NAN);
            for series in [bandwidth, compute] {
                if let Some(warning) = resolution_check(series, res) {
                    result.add_resolution_warning(warning);
                }
            }
        }
    }
    if let Some(warning) = working_set_check(bandwidth_bytes) {
        result.add_resolution_warning(warning);
    }

    for warning in system_check() {
        result.add_system_warning(warning);
    }

    result
}
