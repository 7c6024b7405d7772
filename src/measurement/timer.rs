//! Monotonic interval timing around a measured region.
//!
//! Uses `std::time::Instant`, which is monotonic and unaffected by wall-clock
//! adjustments. Compiler fences on both sides of each clock read keep the
//! optimizer from moving measured work across the timer calls.

use std::hint::black_box as std_black_box;
use std::sync::atomic::{compiler_fence, Ordering};
use std::time::Instant;

use crate::error::TimerError;

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
///
/// Every input read and output produced inside a timed region goes through
/// this, so the optimizer can neither constant-fold the inputs nor prove the
/// outputs dead.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

#[inline]
fn fenced_now() -> Instant {
    compiler_fence(Ordering::SeqCst);
    let now = Instant::now();
    compiler_fence(Ordering::SeqCst);
    now
}

/// Start/stop interval timer.
///
/// ```
/// use roofline_oracle::Timer;
///
/// let mut timer = Timer::start();
/// let sum: u64 = (0..10_000u64).map(roofline_oracle::measurement::black_box).sum();
/// timer.stop();
/// roofline_oracle::measurement::black_box(sum);
/// assert!(timer.elapsed().unwrap() > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    stop: Option<Instant>,
}

impl Timer {
    /// Capture the start instant.
    #[inline]
    pub fn start() -> Self {
        Self {
            start: fenced_now(),
            stop: None,
        }
    }

    /// Capture the stop instant. Calling it again moves the stop instant.
    #[inline]
    pub fn stop(&mut self) {
        self.stop = Some(fenced_now());
    }

    /// Seconds between `start()` and `stop()`.
    ///
    /// # Errors
    ///
    /// `TimerError::NotStopped` before `stop()`, and
    /// `TimerError::NonPositive` when the interval is zero (an empty region
    /// or a clock too coarse for it).
    pub fn elapsed(&self) -> Result<f64, TimerError> {
        let stop = self.stop.ok_or(TimerError::NotStopped)?;
        let secs = stop.saturating_duration_since(self.start).as_secs_f64();
        check_elapsed(secs)
    }

    /// Time `f` and return its output with the elapsed seconds.
    #[inline]
    pub fn measure<F, T>(f: F) -> Result<(T, f64), TimerError>
    where
        F: FnOnce() -> T,
    {
        let mut timer = Self::start();
        let out = black_box(f());
        timer.stop();
        Ok((out, timer.elapsed()?))
    }
}

/// Reject intervals that cannot come from a working monotonic clock.
pub(crate) fn check_elapsed(elapsed_secs: f64) -> Result<f64, TimerError> {
    if elapsed_secs > 0.0 && elapsed_secs.is_finite() {
        Ok(elapsed_secs)
    } else {
        Err(TimerError::NonPositive { elapsed_secs })
    }
}

/// Consecutive clock reads taken when measuring the resolution.
const RESOLUTION_READS: usize = 10_000;

/// Empirically measure the clock's resolution in seconds.
///
/// Returns the smallest non-zero difference between consecutive reads, or
/// `None` if the clock never advanced over a fixed number of reads.
pub fn clock_resolution_secs() -> Option<f64> {
    min_tick(RESOLUTION_READS, Instant::now)
}

fn min_tick(reads: usize, mut now: impl FnMut() -> Instant) -> Option<f64> {
    let mut min_diff = f64::INFINITY;
    let mut prev = now();

    for _ in 1..reads {
        let next = now();
        let diff = next.saturating_duration_since(prev).as_secs_f64();
        if diff > 0.0 && diff < min_diff {
            min_diff = diff;
        }
        prev = next;
    }

    min_diff.is_finite().then_some(min_diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_elapsed_positive() {
        let mut timer = Timer::start();
        std::thread::sleep(std::time::Duration::from_millis(2));
        timer.stop();
        let secs = timer.elapsed().unwrap();
        assert!(secs >= 0.002, "elapsed = {}", secs);
        assert!(secs < 1.0, "elapsed = {}", secs);
    }

    #[test]
    fn test_elapsed_before_stop() {
        let timer = Timer::start();
        assert_eq!(timer.elapsed(), Err(TimerError::NotStopped));
    }

    #[test]
    fn test_check_elapsed_rejects_degenerate() {
        assert!(check_elapsed(0.0).is_err());
        assert!(check_elapsed(-1.0).is_err());
        assert!(check_elapsed(f64::NAN).is_err());
        assert!(check_elapsed(f64::INFINITY).is_err());
        assert_eq!(check_elapsed(0.5), Ok(0.5));
    }

    #[test]
    fn test_measure_returns_output() {
        let (sum, secs) = Timer::measure(|| {
            let mut sum = 0u64;
            for i in 0..100_000u64 {
                sum = sum.wrapping_add(black_box(i));
            }
            sum
        })
        .unwrap();
        assert_eq!(sum, (0..100_000u64).sum::<u64>());
        assert!(secs > 0.0);
    }

    #[test]
    fn test_clock_resolution_reasonable() {
        let res = clock_resolution_secs().expect("clock advanced");
        // Between 1ns-ish and 1ms on anything we support
        assert!(res > 0.0 && res < 1e-3, "resolution = {}", res);
    }

    #[test]
    fn test_frozen_clock_has_no_resolution() {
        let frozen = Instant::now();
        let mut calls = 0;
        let res = min_tick(100, || {
            calls += 1;
            frozen
        });
        assert_eq!(res, None);
        assert_eq!(calls, 100);
    }

    #[test]
    fn test_min_tick_finds_smallest_step() {
        let base = Instant::now();
        let steps = [0u64, 0, 50, 50, 80, 80, 80, 200];
        let mut reads = steps.iter().map(|&ns| base + Duration::from_nanos(ns));
        let res = min_tick(steps.len(), || reads.next().unwrap_or(base)).unwrap();
        assert!((res - 30e-9).abs() < 1e-12, "resolution = {}", res);
    }
}
