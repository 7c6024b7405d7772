//! Report types produced by a finished run.

use serde::Serialize;

use crate::measurement::TrialSeries;
use crate::preflight::PreflightResult;
use crate::roofline::RegimeSplit;
use crate::statistics::{FitMethod, RandomVariable};

/// Complete result of a roofline run.
///
/// Built once, when the estimator reaches its terminal state, and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RooflineReport {
    /// Per-trial bandwidth samples in recording order.
    pub bandwidth_trials: TrialSeries,

    /// Per-trial compute samples in recording order.
    pub compute_trials: TrialSeries,

    /// Fitted random variables and the roofline result.
    pub estimate: RooflineEstimate,

    /// Non-fatal quality warnings.
    pub preflight: PreflightResult,

    /// Metadata for debugging and reproduction.
    pub metadata: Metadata,
}

/// The distributions a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct RooflineEstimate {
    /// Memory bandwidth in GB/s.
    pub b: RandomVariable,

    /// Peak compute in GFLOP/s.
    pub p: RandomVariable,

    /// Arithmetic intensity in FLOP/byte.
    pub arithmetic_intensity: RandomVariable,

    /// Attainable performance `max(b × ai, p)` in GFLOP/s.
    pub r: RandomVariable,

    /// Intensity where the two terms meet, `p / b`, in FLOP/byte.
    pub ridge_point: RandomVariable,

    /// Fraction of draws each term of the formula wins.
    pub regime: RegimeSplit,
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Measured trials per probe.
    pub trials: usize,
    /// Discarded warm-up invocations per probe.
    pub warmup: usize,
    /// Bandwidth working-set size in bytes.
    pub bandwidth_bytes: usize,
    /// FMA chain iterations per compute trial.
    pub compute_iterations: u64,
    /// `f64` lanes in the compute kernel.
    pub compute_lanes: usize,
    /// Floating-point operations per compute trial.
    pub flops_per_trial: u64,
    /// Configured arithmetic intensity interval.
    pub intensity_range: (f64, f64),
    /// Distribution fitting method.
    pub fit: FitMethod,
    /// Monte-Carlo draws per random variable.
    pub draws: usize,
    /// Seed the distribution sampling used (configured or generated).
    pub seed: u64,
    /// Measured resolution of the interval timer, if the clock advanced.
    pub clock_resolution_secs: Option<f64>,
    /// Total runtime in seconds.
    pub runtime_secs: f64,
}

impl RooflineReport {
    /// Whether any critical preflight warning was raised.
    pub fn has_critical_warnings(&self) -> bool {
        self.preflight.has_critical
    }
}
