//! Peak floating-point throughput probe.
//!
//! Runs a fixed dependency chain of nine fused multiply-adds per lane over a
//! 64-byte lane array that stays in L1, so the loop is bound by the FMA units
//! rather than by memory.
//!
//! # Chain shape
//!
//! With lane operands `a`, `b` and accumulator `acc`:
//!
//! ```text
//! fma0 = a    + b    * a
//! fma1 = a    - b    * acc
//! fma2 = acc  + a    * acc
//! fma3 = fma0 + fma1 * fma2
//! fma4 = fma1 + fma2 * fma0
//! fma5 = fma2 + fma1 * fma0
//! fma6 = fma3 + fma4 * fma5
//! fma7 = fma4 + fma3 * fma5
//! acc  = acc  + fma6 * fma7        (fma8)
//! ```
//!
//! Each step reads the results of the two before it, so no reassociation can
//! shorten the chain: 9 FMAs, 18 flops per lane per iteration.

use tracing::debug;

use super::collector::{Probe, ProbeKind, Sample};
use super::timer::{black_box, Timer};
use crate::constants::{COMPUTE_LANES, FLOPS_PER_CHAIN, GIGA};
use crate::error::ProbeError;

/// Lane array aligned to a cache line so it occupies exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(64))]
struct Lanes([f64; COMPUTE_LANES]);

impl Lanes {
    fn splat(value: f64) -> Self {
        Lanes([value; COMPUTE_LANES])
    }
}

/// `a + b * c`, fused where the target has hardware FMA.
///
/// Without hardware FMA this is a separate multiply and add; the flop count
/// is the same two operations either way.
#[inline(always)]
fn fma(a: f64, b: f64, c: f64) -> f64 {
    #[cfg(any(target_feature = "fma", target_arch = "aarch64"))]
    {
        b.mul_add(c, a)
    }

    #[cfg(not(any(target_feature = "fma", target_arch = "aarch64")))]
    {
        a + b * c
    }
}

/// One chain for one lane; returns the new accumulator.
#[inline(always)]
fn chain(a: f64, b: f64, acc: f64) -> f64 {
    let fma0 = fma(a, b, a);
    let fma1 = fma(a, -b, acc);
    let fma2 = fma(acc, a, acc);
    let fma3 = fma(fma0, fma1, fma2);
    let fma4 = fma(fma1, fma2, fma0);
    let fma5 = fma(fma2, fma1, fma0);
    let fma6 = fma(fma3, fma4, fma5);
    let fma7 = fma(fma4, fma3, fma5);
    fma(acc, fma6, fma7)
}

/// The timed loop.
///
/// Operands are reloaded through `black_box` every iteration so nothing can
/// be constant-folded or hoisted out of the loop; the accumulator carries a
/// dependency from each iteration into the next.
#[inline(never)]
fn run_chains(iterations: u64, a_src: &Lanes, b_src: &Lanes, acc: &mut Lanes) {
    for _ in 0..iterations {
        let a = black_box(*a_src);
        let b = black_box(*b_src);
        for j in 0..COMPUTE_LANES {
            acc.0[j] = chain(a.0[j], b.0[j], acc.0[j]);
        }
    }
}

/// Measures achieved FMA throughput in FLOP/second.
#[derive(Debug, Clone)]
pub struct ComputeProbe {
    iterations: u64,
    /// Lane operand seed; zero keeps every chain at zero (no denormals, no overflow).
    operand: f64,
}

impl ComputeProbe {
    /// Probe running `iterations` chain iterations per trial.
    pub fn new(iterations: u64) -> Self {
        Self {
            iterations,
            operand: 0.0,
        }
    }

    /// Chain iterations per trial.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Lane width of the accumulator array.
    pub fn lanes(&self) -> usize {
        COMPUTE_LANES
    }

    /// Exact floating-point operation count of one trial: N × W × 18.
    ///
    /// Saturates at `u64::MAX` for iteration counts whose count does not fit;
    /// `Config::validate` rejects those.
    pub fn flops(&self) -> u64 {
        flops_per_trial(self.iterations).unwrap_or(u64::MAX)
    }

    /// Throughput in FLOP/s for a given elapsed time.
    pub fn throughput(&self, elapsed_secs: f64) -> f64 {
        self.flops() as f64 / elapsed_secs
    }
}

/// Flop count of one trial of `iterations` chain iterations, if it fits in a `u64`.
pub(crate) fn flops_per_trial(iterations: u64) -> Option<u64> {
    iterations.checked_mul(COMPUTE_LANES as u64 * FLOPS_PER_CHAIN)
}

impl Default for ComputeProbe {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

impl Probe for ComputeProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Compute
    }

    fn run(&mut self) -> Result<Sample, ProbeError> {
        let seed = black_box(self.operand);
        let a = Lanes::splat(seed);
        let b = Lanes::splat(seed);
        let mut acc = Lanes::splat(0.0);

        let mut timer = Timer::start();
        run_chains(self.iterations, &a, &b, &mut acc);
        timer.stop();

        let acc = black_box(acc);
        if acc.0.iter().any(|x| !x.is_finite()) {
            debug!(?acc, "compute accumulators left the finite range");
        }

        let elapsed = timer.elapsed()?;
        debug!(
            flops = self.flops(),
            elapsed_secs = elapsed,
            gflop_per_s = self.throughput(elapsed) / GIGA,
            "compute pass"
        );
        Ok(Sample::new(elapsed, self.flops() as f64))
    }
}
