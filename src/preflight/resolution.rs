//! Timed-region length and working-set checks.
//!
//! A timed region only a few clock ticks long is dominated by quantization,
//! and a bandwidth working set that fits in cache measures cache bandwidth.
//! Both produce numbers that look fine and mean little.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_BANDWIDTH_BYTES;
use crate::measurement::{ProbeKind, TrialSeries};

/// Minimum ratio of the shortest timed region to the clock resolution.
const MIN_TICKS_PER_REGION: f64 = 1000.0;

/// Warning from the resolution checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionWarning {
    /// The shortest timed region spans fewer than 1000 clock ticks.
    RegionTooShort {
        /// Series with the short region.
        probe: ProbeKind,
        /// Shortest elapsed time in the series.
        min_elapsed_secs: f64,
        /// Measured clock resolution.
        clock_resolution_secs: f64,
    },

    /// The clock never advanced while its resolution was measured.
    ///
    /// Region lengths cannot be checked against the clock.
    ClockResolutionUnknown,

    /// The bandwidth working set is below the main-memory floor.
    ///
    /// This is a critical warning: `b` describes a cache level, not DRAM.
    WorkingSetCacheResident {
        /// Working-set size actually used.
        bytes: usize,
    },
}

impl ResolutionWarning {
    /// Check if this warning indicates a critical issue.
    pub fn is_critical(&self) -> bool {
        matches!(self, ResolutionWarning::WorkingSetCacheResident { .. })
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            ResolutionWarning::RegionTooShort {
                probe,
                min_elapsed_secs,
                clock_resolution_secs,
            } => format!(
                "{} trials as short as {:.3e} s are within {:.0}x of the clock \
                 resolution ({:.1e} s). Increase the work per trial.",
                probe,
                min_elapsed_secs,
                min_elapsed_secs / clock_resolution_secs,
                clock_resolution_secs
            ),
            ResolutionWarning::ClockResolutionUnknown => "Clock resolution could not be \
                 determined: the clock did not advance between consecutive reads. \
                 Timed regions were not checked against it."
                .to_string(),
            ResolutionWarning::WorkingSetCacheResident { bytes } => format!(
                "CRITICAL: bandwidth working set of {} bytes is below {} bytes \
                 and likely cache resident. b reflects cache, not memory, bandwidth.",
                bytes, MIN_BANDWIDTH_BYTES
            ),
        }
    }
}

/// Flag a clock whose resolution could not be measured.
pub fn clock_check(clock_resolution_secs: Option<f64>) -> Option<ResolutionWarning> {
    match clock_resolution_secs {
        Some(res) if res.is_finite() && res > 0.0 => None,
        _ => Some(ResolutionWarning::ClockResolutionUnknown),
    }
}

/// Flag a series whose shortest region is under 1000 clock ticks.
///
/// A resolution that is not a positive number is skipped here;
/// [`clock_check`] reports it.
pub fn resolution_check(
    series: &TrialSeries,
    clock_resolution_secs: f64,
) -> Option<ResolutionWarning> {
    if series.is_empty() || clock_resolution_secs.is_nan() || clock_resolution_secs <= 0.0 {
        return None;
    }
    let min_elapsed_secs = series
        .samples()
        .iter()
        .map(|s| s.elapsed_secs)
        .fold(f64::INFINITY, f64::min);

    if min_elapsed_secs < MIN_TICKS_PER_REGION * clock_resolution_secs {
        Some(ResolutionWarning::RegionTooShort {
            probe: series.kind(),
            min_elapsed_secs,
            clock_resolution_secs,
        })
    } else {
        None
    }
}

/// Flag a bandwidth working set below [`MIN_BANDWIDTH_BYTES`].
pub fn working_set_check(bandwidth_bytes: usize) -> Option<ResolutionWarning> {
    (bandwidth_bytes < MIN_BANDWIDTH_BYTES).then_some(ResolutionWarning::WorkingSetCacheResident {
        bytes: bandwidth_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Sample;

    fn series(elapsed: &[f64]) -> TrialSeries {
        let mut s = TrialSeries::new(ProbeKind::Compute, elapsed.len());
        for &e in elapsed {
            s.push(Sample::new(e, 1.0));
        }
        s
    }

    #[test]
    fn test_long_regions_pass() {
        let s = series(&[1e-3, 2e-3]);
        assert!(resolution_check(&s, 1e-9).is_none());
    }

    #[test]
    fn test_short_region_flagged() {
        let s = series(&[1e-3, 5e-7]);
        match resolution_check(&s, 1e-9) {
            Some(ResolutionWarning::RegionTooShort {
                min_elapsed_secs, ..
            }) => assert_eq!(min_elapsed_secs, 5e-7),
            other => panic!("expected RegionTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_resolution_skipped() {
        let s = series(&[1e-9]);
        assert!(resolution_check(&s, 0.0).is_none());
        assert!(resolution_check(&s, f64::NAN).is_none());
    }

    #[test]
    fn test_unknown_clock_flagged() {
        assert!(clock_check(Some(1e-9)).is_none());
        for res in [None, Some(0.0), Some(f64::NAN)] {
            let w = clock_check(res).expect("unknown resolution flagged");
            assert_eq!(w, ResolutionWarning::ClockResolutionUnknown);
            assert!(!w.is_critical());
            assert!(w.description().contains("could not be determined"));
        }
    }

    #[test]
    fn test_working_set() {
        assert!(working_set_check(MIN_BANDWIDTH_BYTES).is_none());
        let w = working_set_check(1 << 20).unwrap();
        assert!(w.is_critical());
        assert!(w.description().contains("1048576"));
    }
}
