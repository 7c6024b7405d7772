//! Configuration for a roofline run.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INTENSITY_RANGE, MIN_BANDWIDTH_BYTES};
use crate::error::ProfilerError;
use crate::measurement::flops_per_trial;
use crate::statistics::FitMethod;

/// Configuration options for `RooflineEstimator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Measured trials per probe (default: 10).
    pub trials: usize,

    /// Discarded invocations of each probe before the first trial (default: 1).
    pub warmup: usize,

    /// Bandwidth working-set size in bytes (default: 128 MiB).
    pub bandwidth_bytes: usize,

    /// Iterations of the FMA chain per compute trial (default: 1,000,000).
    pub compute_iterations: u64,

    /// Arithmetic intensity interval in FLOP/byte (default: [0.1, 5.0]).
    ///
    /// Some setups start this at 0.0; both bounds are plain configuration.
    pub intensity_range: (f64, f64),

    /// Monte-Carlo draws carried by every random variable (default: 10,000).
    pub draws: usize,

    /// How trial series are turned into distributions (default: bootstrap).
    pub fit: FitMethod,

    /// Optional deterministic seed for distribution sampling.
    pub seed: Option<u64>,

    /// Skip the 128 MiB floor on `bandwidth_bytes`.
    ///
    /// Only meant for tests; a cache-resident working set measures cache
    /// bandwidth, not memory bandwidth, and the report flags it.
    pub allow_small_working_set: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials: 10,
            warmup: 1,
            bandwidth_bytes: MIN_BANDWIDTH_BYTES,
            compute_iterations: 1_000_000,
            intensity_range: DEFAULT_INTENSITY_RANGE,
            draws: 10_000,
            fit: FitMethod::Bootstrap,
            seed: None,
            allow_small_working_set: false,
        }
    }
}

impl Config {
    /// Check the configuration before any probe runs.
    ///
    /// # Errors
    ///
    /// Returns `ProfilerError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if self.trials == 0 {
            return Err(invalid("trial count must be at least 1"));
        }
        if self.bandwidth_bytes < std::mem::size_of::<i32>() {
            return Err(invalid("bandwidth working set must hold at least one element"));
        }
        if !self.allow_small_working_set && self.bandwidth_bytes < MIN_BANDWIDTH_BYTES {
            return Err(invalid(format!(
                "bandwidth working set of {} bytes is below the {} byte minimum",
                self.bandwidth_bytes, MIN_BANDWIDTH_BYTES
            )));
        }
        if self.compute_iterations == 0 {
            return Err(invalid("compute iteration count must be at least 1"));
        }
        if flops_per_trial(self.compute_iterations).is_none() {
            return Err(invalid(format!(
                "{} compute iterations overflow the per-trial flop count",
                self.compute_iterations
            )));
        }
        let (lo, hi) = self.intensity_range;
        if !lo.is_finite() || !hi.is_finite() {
            return Err(invalid("arithmetic intensity bounds must be finite"));
        }
        if lo < 0.0 {
            return Err(invalid(format!(
                "arithmetic intensity lower bound {} is negative",
                lo
            )));
        }
        if lo > hi {
            return Err(invalid(format!(
                "arithmetic intensity interval [{}, {}] is inverted",
                lo, hi
            )));
        }
        if self.draws == 0 {
            return Err(invalid("random variables need at least one draw"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ProfilerError {
    ProfilerError::InvalidConfig {
        reason: reason.into(),
    }
}
