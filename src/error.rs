//! Error types.
//!
//! Every error here is fatal to a run: a roofline estimate built from an
//! incomplete set of trials has no sound interpretation, so nothing is retried.

use thiserror::Error;

use crate::measurement::ProbeKind;
use crate::statistics::DistributionError;

/// Failure of a single timed interval.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimerError {
    /// `elapsed()` was called before `stop()`.
    #[error("timer read before it was stopped")]
    NotStopped,

    /// The interval was zero, negative, or not finite.
    #[error("non-positive elapsed time ({elapsed_secs:e} s): clock source is broken or too coarse")]
    NonPositive {
        /// The offending interval in seconds.
        elapsed_secs: f64,
    },
}

/// Failure of one probe invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// The working set could not be allocated.
    #[error("could not allocate a {bytes}-byte working set")]
    Allocation {
        /// Requested size in bytes.
        bytes: usize,
    },

    /// The timed region produced an unusable interval.
    #[error(transparent)]
    Clock(#[from] TimerError),
}

/// Errors returned by [`RooflineEstimator`](crate::RooflineEstimator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfilerError {
    /// A probe's working set could not be allocated.
    #[error("{probe} probe, trial {trial}: could not allocate a {bytes}-byte working set")]
    Allocation {
        /// Probe that failed.
        probe: ProbeKind,
        /// Zero-based trial index, or the warm-up invocation that failed.
        trial: TrialIndex,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// A probe's timer reported an unusable interval.
    #[error("{probe} probe, trial {trial}: {source}")]
    Clock {
        /// Probe that failed.
        probe: ProbeKind,
        /// Zero-based trial index.
        trial: TrialIndex,
        /// Underlying timer failure.
        source: TimerError,
    },

    /// Fitting was attempted with fewer samples than the configured trial count.
    ///
    /// The collection loop never lets this happen; seeing it is a logic bug.
    #[error("{probe} series holds {actual} of {expected} samples at fit time")]
    IncompleteSeries {
        /// Series that was short.
        probe: ProbeKind,
        /// Configured trial count.
        expected: usize,
        /// Samples actually present.
        actual: usize,
    },

    /// A trial series could not be turned into a distribution.
    #[error("fitting the {probe} series failed: {source}")]
    Fit {
        /// Series being fitted.
        probe: ProbeKind,
        /// Underlying fitting failure.
        source: DistributionError,
    },

    /// A stride-sweep pass failed.
    #[error("stride sweep at {stride_elements} elements: {source}")]
    Stride {
        /// Stride of the failed pass, in `i32` elements.
        stride_elements: usize,
        /// Underlying probe failure.
        source: ProbeError,
    },

    /// Configuration rejected before any trial ran.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

impl ProfilerError {
    /// Attach probe and trial context to a probe failure.
    pub fn from_probe(probe: ProbeKind, trial: TrialIndex, err: ProbeError) -> Self {
        match err {
            ProbeError::Allocation { bytes } => ProfilerError::Allocation { probe, trial, bytes },
            ProbeError::Clock(source) => ProfilerError::Clock { probe, trial, source },
        }
    }
}

/// Which invocation of a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialIndex {
    /// A discarded warm-up invocation.
    Warmup(usize),
    /// A measured trial.
    Trial(usize),
}

impl std::fmt::Display for TrialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialIndex::Warmup(i) => write!(f, "warm-up {}", i),
            TrialIndex::Trial(i) => write!(f, "{}", i),
        }
    }
}
