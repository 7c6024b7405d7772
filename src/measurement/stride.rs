//! Strided write sweep.
//!
//! A diagnostic variant of the bandwidth probe: for each stride, write to every
//! `stride`-th element of a fresh working set and time the pass. Once the
//! stride passes the cache-line size every store touches a new line, and past
//! the page size every store touches a new page, so the time per access shows
//! the cache and TLB steps directly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::timer::{black_box, Timer};
use crate::constants::{GIGA, MIN_BANDWIDTH_BYTES};
use crate::error::{ProbeError, ProfilerError};

/// Result of one stride pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StridePoint {
    /// Distance between consecutive stores, in `i32` elements.
    pub stride_elements: usize,
    /// Distance between consecutive stores, in bytes.
    pub stride_bytes: usize,
    /// Stores performed in the pass.
    pub accesses: usize,
    /// Seconds spent in the timed pass.
    pub elapsed_secs: f64,
}

impl StridePoint {
    /// Bytes actually written, over elapsed time, in GB/s.
    pub fn effective_gb_per_s(&self) -> f64 {
        (self.accesses * std::mem::size_of::<i32>()) as f64 / self.elapsed_secs / GIGA
    }

    /// Average time per store in nanoseconds.
    pub fn ns_per_access(&self) -> f64 {
        self.elapsed_secs * 1e9 / self.accesses as f64
    }
}

/// Sweeps write stride over a large working set.
#[derive(Debug, Clone)]
pub struct StrideProbe {
    elements: usize,
    strides: Vec<usize>,
}

impl StrideProbe {
    /// Sweep `strides` (in elements) over a working set of `bytes`.
    ///
    /// Zero strides are dropped.
    pub fn new(bytes: usize, strides: Vec<usize>) -> Self {
        Self {
            elements: bytes / std::mem::size_of::<i32>(),
            strides: strides.into_iter().filter(|&s| s > 0).collect(),
        }
    }

    /// Powers of two from 1 to 4096 elements (4 bytes to 16 KiB).
    pub fn default_strides() -> Vec<usize> {
        (0..=12).map(|exp| 1usize << exp).collect()
    }

    /// Strides this probe will run, in order.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Run one pass per stride, strictly in sequence.
    ///
    /// # Errors
    ///
    /// Stops at the first allocation or clock failure, naming the stride.
    pub fn sweep(&self) -> Result<Vec<StridePoint>, ProfilerError> {
        self.strides
            .iter()
            .map(|&stride| {
                self.pass(stride).map_err(|source| ProfilerError::Stride {
                    stride_elements: stride,
                    source,
                })
            })
            .collect()
    }

    fn pass(&self, stride: usize) -> Result<StridePoint, ProbeError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(self.elements)
            .map_err(|_| ProbeError::Allocation {
                bytes: self.elements * std::mem::size_of::<i32>(),
            })?;
        buffer.resize(self.elements, 0i32);

        let value = 1i32;
        let mut timer = Timer::start();
        let accesses = fill_strided(&mut buffer, stride, &value);
        timer.stop();
        black_box(buffer.as_slice());

        let point = StridePoint {
            stride_elements: stride,
            stride_bytes: stride * std::mem::size_of::<i32>(),
            accesses,
            elapsed_secs: timer.elapsed()?,
        };
        debug!(
            stride_bytes = point.stride_bytes,
            ns_per_access = point.ns_per_access(),
            "stride pass"
        );
        Ok(point)
    }
}

impl Default for StrideProbe {
    fn default() -> Self {
        Self::new(MIN_BANDWIDTH_BYTES, Self::default_strides())
    }
}

/// Write `value` to every `stride`-th element; returns the number of stores.
#[inline(never)]
fn fill_strided(buffer: &mut [i32], stride: usize, value: &i32) -> usize {
    let mut accesses = 0;
    for x in buffer.iter_mut().step_by(stride) {
        *x = black_box(*value);
        accesses += 1;
    }
    accesses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strides() {
        let strides = StrideProbe::default_strides();
        assert_eq!(strides.first(), Some(&1));
        assert_eq!(strides.last(), Some(&4096));
        assert_eq!(strides.len(), 13);
    }

    #[test]
    fn test_zero_stride_dropped() {
        let probe = StrideProbe::new(1024, vec![0, 1, 2]);
        assert_eq!(probe.strides(), &[1, 2]);
    }

    #[test]
    fn test_fill_strided_counts_and_writes() {
        let mut buffer = vec![0i32; 100];
        let accesses = fill_strided(&mut buffer, 16, &3);
        assert_eq!(accesses, 7); // 0, 16, ..., 96
        for (i, &x) in buffer.iter().enumerate() {
            assert_eq!(x, if i % 16 == 0 { 3 } else { 0 }, "index {}", i);
        }
    }

    #[test]
    fn test_sweep_small_buffer() {
        let probe = StrideProbe::new(1 << 20, vec![1, 16, 64]);
        let points = probe.sweep().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].accesses, (1 << 20) / 4);
        assert_eq!(points[1].stride_bytes, 64);
        for point in &points {
            assert!(point.elapsed_secs > 0.0);
            assert!(point.ns_per_access() > 0.0);
            assert!(point.effective_gb_per_s() > 0.0);
        }
    }

    #[test]
    fn test_sweep_allocation_failure() {
        let probe = StrideProbe::new(usize::MAX, vec![1]);
        assert!(matches!(
            probe.sweep(),
            Err(ProfilerError::Stride {
                stride_elements: 1,
                source: ProbeError::Allocation { .. },
            })
        ));
    }
}
