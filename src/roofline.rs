//! The roofline formula over distributions.
//!
//! `r = max(b × ai, p)` with `b` in GB/s, `ai` in FLOP/byte and `p` in
//! GFLOP/s, so `r` is in GFLOP/s. Every operand is a [`RandomVariable`]; the
//! product and the `max` are evaluated draw by draw.

use serde::{Deserialize, Serialize};

use crate::statistics::RandomVariable;

/// Evaluate `max(bandwidth × intensity, peak)`.
pub fn roofline(
    bandwidth: &RandomVariable,
    peak: &RandomVariable,
    intensity: &RandomVariable,
) -> RandomVariable {
    (bandwidth * intensity).max(peak)
}

/// Arithmetic intensity at which `bandwidth × intensity` meets `peak`.
///
/// Distribution-valued like everything else; infinite draws appear where a
/// bandwidth draw is zero.
pub fn ridge_point(bandwidth: &RandomVariable, peak: &RandomVariable) -> RandomVariable {
    peak / bandwidth
}

/// Which term of the formula dominates, by fraction of draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeSplit {
    /// Fraction of draws where `b × ai >= p` (the bandwidth term wins).
    pub memory_term: f64,
    /// Fraction of draws where `p > b × ai` (the compute ceiling wins).
    pub compute_term: f64,
}

impl RegimeSplit {
    /// Split draws of the two terms of the formula.
    pub fn of(
        bandwidth: &RandomVariable,
        peak: &RandomVariable,
        intensity: &RandomVariable,
    ) -> Self {
        let memory_term = (bandwidth * intensity).probability_at_least(peak);
        Self {
            memory_term,
            compute_term: 1.0 - memory_term,
        }
    }
}
