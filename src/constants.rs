//! Fixed constants of the probes and the roofline model.

/// Smallest bandwidth working set accepted by [`Config::validate`](crate::Config::validate).
///
/// 128 MiB is well above the L2/L3 capacity of commodity cores, so the write
/// loop has to reach main memory.
pub const MIN_BANDWIDTH_BYTES: usize = 128 * 1024 * 1024;

/// Number of `f64` accumulator lanes in the compute probe.
///
/// Eight doubles cover one AVX-512 register or two AVX2 registers, so the
/// per-lane loop body vectorizes on common x86_64 and aarch64 targets.
pub const COMPUTE_LANES: usize = 8;

/// Fused multiply-adds in one dependency chain.
pub const FMAS_PER_CHAIN: u64 = 9;

/// Floating-point operations in one dependency chain (two per FMA).
pub const FLOPS_PER_CHAIN: u64 = FMAS_PER_CHAIN * 2;

/// Scale from base units to the reported giga-units (decimal, as in GB/s).
pub const GIGA: f64 = 1e9;

/// Default arithmetic intensity interval in FLOP/byte.
pub const DEFAULT_INTENSITY_RANGE: (f64, f64) = (0.1, 5.0);

/// Coefficient of variation above which a trial series is flagged as noisy.
pub const MAX_COEFFICIENT_OF_VARIATION: f64 = 0.5;

/// Quantiles used for the `[low, high]` band when a distribution is displayed.
pub const SUMMARY_QUANTILES: (f64, f64) = (0.05, 0.95);
