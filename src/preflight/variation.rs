//! Trial-to-trial variation check.
//!
//! A fitted distribution is only as good as the trials behind it. A series
//! whose coefficient of variation exceeds the threshold usually means the
//! core was shared, throttled, or migrated mid-run.

use serde::{Deserialize, Serialize};

use crate::measurement::{ProbeKind, TrialSeries};
use crate::statistics::coefficient_of_variation;

/// Warning from the variation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariationWarning {
    /// Rates within one series spread more than the threshold allows.
    HighVariation {
        /// Series that was noisy.
        probe: ProbeKind,
        /// Observed coefficient of variation of the rates.
        cv: f64,
        /// Threshold that was exceeded.
        threshold: f64,
    },
}

impl VariationWarning {
    /// Variation warnings never invalidate a run.
    pub fn is_critical(&self) -> bool {
        false
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            VariationWarning::HighVariation {
                probe,
                cv,
                threshold,
            } => format!(
                "{} trials vary by {:.0}% (CV {:.2} > {:.2}). \
                 Pin the process to one core and close background work.",
                probe,
                cv * 100.0,
                cv,
                threshold
            ),
        }
    }
}

/// Flag a series whose rate CV exceeds `threshold`.
///
/// Series with fewer than two samples have no spread and are never flagged.
pub fn variation_check(series: &TrialSeries, threshold: f64) -> Option<VariationWarning> {
    if series.len() < 2 {
        return None;
    }
    let cv = coefficient_of_variation(&series.giga_rates());
    if cv.is_finite() && cv > threshold {
        Some(VariationWarning::HighVariation {
            probe: series.kind(),
            cv,
            threshold,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Sample;

    fn series(kind: ProbeKind, elapsed: &[f64]) -> TrialSeries {
        let mut s = TrialSeries::new(kind, elapsed.len());
        for &e in elapsed {
            s.push(Sample::new(e, 1e9));
        }
        s
    }

    #[test]
    fn test_stable_series_passes() {
        let s = series(ProbeKind::Compute, &[1.0, 1.01, 0.99, 1.0]);
        assert!(variation_check(&s, 0.5).is_none());
    }

    #[test]
    fn test_noisy_series_flagged() {
        // Rates 1, 0.1, 1, 0.1 GFLOP/s
        let s = series(ProbeKind::Compute, &[1.0, 10.0, 1.0, 10.0]);
        match variation_check(&s, 0.5) {
            Some(VariationWarning::HighVariation { probe, cv, .. }) => {
                assert_eq!(probe, ProbeKind::Compute);
                assert!(cv > 0.5);
            }
            other => panic!("expected HighVariation, got {:?}", other),
        }
    }

    #[test]
    fn test_single_sample_never_flagged() {
        let s = series(ProbeKind::Bandwidth, &[1.0]);
        assert!(variation_check(&s, 0.0).is_none());
    }

    #[test]
    fn test_description_names_probe() {
        let w = VariationWarning::HighVariation {
            probe: ProbeKind::Bandwidth,
            cv: 0.75,
            threshold: 0.5,
        };
        assert!(w.description().contains("bandwidth"));
        assert!(w.description().contains("75%"));
        assert!(!w.is_critical());
    }
}
