//! # roofline-oracle
//!
//! Estimate the single-core roofline of the host as probability distributions.
//!
//! Two micro-benchmarks run on one core:
//! - a **bandwidth probe** writing a ≥128 MiB `i32` working set sequentially
//!   (GB/s);
//! - a **compute probe** running fixed-shape chains of fused multiply-adds
//!   over 8 `f64` lanes (GFLOP/s).
//!
//! Each runs for a configured number of trials. A distribution is fitted to
//! each trial series, arithmetic intensity is modeled as uniform over an
//! interval, and attainable performance is evaluated as
//!
//! ```text
//! r = max(b × ai, p)
//! ```
//!
//! draw by draw, so `r` is a distribution too. Nothing is collapsed to a
//! scalar before the formula.
//!
//! ## Quick Start
//!
//! ```no_run
//! use roofline_oracle::RooflineEstimator;
//!
//! let report = RooflineEstimator::new().seed(7).run()?;
//!
//! println!("b = {} GB/s", report.estimate.b);
//! println!("p = {} GFLOP/s", report.estimate.p);
//! println!("r = {} GFLOP/s", report.estimate.r);
//! # Ok::<(), roofline_oracle::ProfilerError>(())
//! ```
//!
//! ## Working with distributions directly
//!
//! ```
//! use roofline_oracle::{roofline, RandomVariable};
//!
//! let b = RandomVariable::point(10.0);
//! let p = RandomVariable::point(100.0);
//! let ai = RandomVariable::point(2.0);
//! assert_eq!(roofline(&b, &p, &ai).as_point(), Some(100.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod error;
mod estimator;
mod result;
mod roofline;

// Functional modules
pub mod measurement;
pub mod output;
pub mod preflight;
pub mod statistics;

// Re-exports for public API
pub use config::Config;
pub use constants::{
    COMPUTE_LANES, DEFAULT_INTENSITY_RANGE, FLOPS_PER_CHAIN, FMAS_PER_CHAIN, GIGA,
    MAX_COEFFICIENT_OF_VARIATION, MIN_BANDWIDTH_BYTES,
};
pub use error::{ProbeError, ProfilerError, TimerError, TrialIndex};
pub use estimator::{Phase, RooflineEstimator};
pub use measurement::{
    BandwidthProbe, ComputeProbe, Probe, ProbeKind, Sample, StrideProbe, Timer, TrialSeries,
};
pub use result::{Metadata, RooflineEstimate, RooflineReport};
pub use roofline::{ridge_point, roofline, RegimeSplit};
pub use statistics::{DistributionSummary, FitMethod, RandomVariable};

/// Run the default configuration and return the report.
///
/// Equivalent to `RooflineEstimator::new().run()`.
///
/// # Errors
///
/// The first probe failure, with its probe and trial index.
pub fn estimate() -> Result<RooflineReport, ProfilerError> {
    RooflineEstimator::new().run()
}
