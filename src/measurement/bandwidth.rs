//! Sequential write bandwidth probe.
//!
//! Writes one scalar to every element of a working set far larger than the
//! last-level cache, exactly once and in increasing address order, and times
//! the pass. Allocation and zeroing happen before the timer starts, so the
//! page faults of first touch stay out of the measurement.

use tracing::debug;

use super::collector::{Probe, ProbeKind, Sample};
use super::timer::{black_box, Timer};
use crate::constants::{GIGA, MIN_BANDWIDTH_BYTES};
use crate::error::ProbeError;

/// Elements written between two reads of the fill value (one 64-byte line).
const ELEMENTS_PER_LINE: usize = 64 / std::mem::size_of::<i32>();

/// Measures achieved write bandwidth in bytes/second.
#[derive(Debug, Clone)]
pub struct BandwidthProbe {
    elements: usize,
    value: i32,
}

impl BandwidthProbe {
    /// Probe over a working set of `bytes`, rounded down to whole `i32`s.
    ///
    /// No minimum is enforced here; [`Config::validate`](crate::Config::validate)
    /// rejects sizes under 128 MiB for real runs.
    pub fn new(bytes: usize) -> Self {
        Self {
            elements: bytes / std::mem::size_of::<i32>(),
            value: 1,
        }
    }

    /// Number of `i32` elements in the working set.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Working-set size in bytes.
    pub fn bytes(&self) -> usize {
        self.elements * std::mem::size_of::<i32>()
    }

    /// Whether the working set meets the main-memory size floor.
    pub fn exceeds_cache(&self) -> bool {
        self.bytes() >= MIN_BANDWIDTH_BYTES
    }

    /// Bandwidth in bytes/second for a given elapsed time.
    pub fn bandwidth(&self, elapsed_secs: f64) -> f64 {
        self.bytes() as f64 / elapsed_secs
    }

    fn allocate(&self) -> Result<Vec<i32>, ProbeError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(self.elements)
            .map_err(|_| ProbeError::Allocation { bytes: self.bytes() })?;
        buffer.resize(self.elements, 0);
        Ok(buffer)
    }
}

impl Default for BandwidthProbe {
    fn default() -> Self {
        Self::new(MIN_BANDWIDTH_BYTES)
    }
}

/// Write `value` to every element of `buffer` in address order.
///
/// The value is re-read through `black_box` once per cache line, so the
/// optimizer cannot treat it as a loop invariant, while each line is still
/// filled with wide stores.
#[inline(never)]
pub(crate) fn fill_sequential(buffer: &mut [i32], value: &i32) {
    let mut lines = buffer.chunks_exact_mut(ELEMENTS_PER_LINE);
    for line in &mut lines {
        let v = black_box(*value);
        for x in line.iter_mut() {
            *x = v;
        }
    }
    let v = black_box(*value);
    for x in lines.into_remainder() {
        *x = v;
    }
}

impl Probe for BandwidthProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Bandwidth
    }

    fn run(&mut self) -> Result<Sample, ProbeError> {
        let mut buffer = self.allocate()?;

        let mut timer = Timer::start();
        fill_sequential(&mut buffer, &self.value);
        timer.stop();

        // Keep the stores observable.
        black_box(buffer.as_slice());

        let elapsed = timer.elapsed()?;
        debug!(
            bytes = self.bytes(),
            elapsed_secs = elapsed,
            gb_per_s = self.bandwidth(elapsed) / GIGA,
            "bandwidth pass"
        );
        Ok(Sample::new(elapsed, self.bytes() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_rounding() {
        let probe = BandwidthProbe::new(1027);
        assert_eq!(probe.elements(), 256);
        assert_eq!(probe.bytes(), 1024);
        assert!(!probe.exceeds_cache());
        assert!(BandwidthProbe::default().exceeds_cache());
    }

    #[test]
    fn test_fill_writes_every_element() {
        // Length not a multiple of a cache line, to cover the remainder
        let mut buffer = vec![0i32; 1000 * ELEMENTS_PER_LINE + 7];
        fill_sequential(&mut buffer, &7);
        assert!(buffer.iter().all(|&x| x == 7));
    }

    #[test]
    fn test_run_produces_positive_sample() {
        let mut probe = BandwidthProbe::new(4 * 1024 * 1024);
        let sample = probe.run().unwrap();
        assert!(sample.elapsed_secs > 0.0);
        assert_eq!(sample.work, (4 * 1024 * 1024) as f64);
        assert!(sample.rate() > 0.0 && sample.rate().is_finite());
    }

    #[test]
    fn test_bandwidth_formula() {
        let probe = BandwidthProbe::new(1 << 30);
        assert_eq!(probe.bandwidth(0.5), (1u64 << 31) as f64);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let mut probe = BandwidthProbe::new(usize::MAX);
        match probe.run() {
            Err(ProbeError::Allocation { bytes }) => assert_eq!(bytes, probe.bytes()),
            other => panic!("expected allocation failure, got {:?}", other),
        }
    }
}
