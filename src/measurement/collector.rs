//! Samples, trial series, and the probe interface.

use serde::{Deserialize, Serialize};

use crate::constants::GIGA;
use crate::error::ProbeError;

/// Which hardware limit a probe measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Sequential write bandwidth (bytes/s).
    Bandwidth,
    /// FMA throughput (FLOP/s).
    Compute,
}

impl ProbeKind {
    /// Unit of the work counted by this probe.
    pub fn work_unit(self) -> &'static str {
        match self {
            ProbeKind::Bandwidth => "bytes",
            ProbeKind::Compute => "flops",
        }
    }

    /// Display unit of the rate, after scaling by 1e9.
    pub fn rate_unit(self) -> &'static str {
        match self {
            ProbeKind::Bandwidth => "GB/s",
            ProbeKind::Compute => "GFLOP/s",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::Bandwidth => write!(f, "bandwidth"),
            ProbeKind::Compute => write!(f, "compute"),
        }
    }
}

/// One trial's measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds spent in the timed region.
    pub elapsed_secs: f64,
    /// Bytes written or flops executed inside the timed region.
    pub work: f64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(elapsed_secs: f64, work: f64) -> Self {
        Self { elapsed_secs, work }
    }

    /// Work per second.
    pub fn rate(&self) -> f64 {
        self.work / self.elapsed_secs
    }

    /// Work per second scaled to the giga-units used in reports.
    pub fn giga_rate(&self) -> f64 {
        self.rate() / GIGA
    }
}

/// A hardware micro-benchmark that yields one sample per invocation.
///
/// Implementations must keep each invocation independent: a fresh working
/// set, nothing carried over that could warm a cache for the next call.
pub trait Probe {
    /// Which limit this probe measures.
    fn kind(&self) -> ProbeKind;

    /// Run the timed region once.
    ///
    /// # Errors
    ///
    /// `ProbeError::Allocation` if the working set cannot be obtained and
    /// `ProbeError::Clock` if the interval is unusable.
    fn run(&mut self) -> Result<Sample, ProbeError>;
}

impl<P: Probe + ?Sized> Probe for &mut P {
    fn kind(&self) -> ProbeKind {
        (**self).kind()
    }

    fn run(&mut self) -> Result<Sample, ProbeError> {
        (**self).run()
    }
}

/// Fixed-capacity, ordered series of samples from a single probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSeries {
    kind: ProbeKind,
    capacity: usize,
    samples: Vec<Sample>,
}

impl TrialSeries {
    /// Empty series that will hold `trials` samples.
    pub fn new(kind: ProbeKind, trials: usize) -> Self {
        Self {
            kind,
            capacity: trials,
            samples: Vec::with_capacity(trials),
        }
    }

    /// Probe kind of every sample in the series.
    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    /// Configured trial count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample.
    ///
    /// # Panics
    ///
    /// Panics when the series is already full; the collection loop never
    /// runs more trials than configured.
    pub fn push(&mut self, sample: Sample) {
        assert!(
            !self.is_complete(),
            "{} series already holds {} samples",
            self.kind,
            self.capacity
        );
        self.samples.push(sample);
    }

    /// Number of samples recorded so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether every configured trial has a sample.
    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Samples in recording order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Elapsed seconds of each sample in recording order.
    pub fn elapsed_secs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.elapsed_secs).collect()
    }

    /// Rates in giga-units (GB/s or GFLOP/s), in recording order.
    pub fn giga_rates(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::giga_rate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate() {
        let sample = Sample::new(0.5, 2e9);
        assert_eq!(sample.rate(), 4e9);
        assert_eq!(sample.giga_rate(), 4.0);
    }

    #[test]
    fn test_series_fills_to_capacity() {
        let mut series = TrialSeries::new(ProbeKind::Compute, 3);
        assert!(series.is_empty());
        for secs in [1.0, 2.0, 4.0] {
            assert!(!series.is_complete());
            series.push(Sample::new(secs, 1e9));
        }
        assert!(series.is_complete());
        assert_eq!(series.len(), 3);
        assert_eq!(series.elapsed_secs(), vec![1.0, 2.0, 4.0]);
        assert_eq!(series.giga_rates(), vec![1.0, 0.5, 0.25]);
    }

    #[test]
    #[should_panic(expected = "already holds")]
    fn test_series_overflow_panics() {
        let mut series = TrialSeries::new(ProbeKind::Bandwidth, 1);
        series.push(Sample::new(1.0, 1.0));
        series.push(Sample::new(1.0, 1.0));
    }

    #[test]
    fn test_probe_kind_units() {
        assert_eq!(ProbeKind::Bandwidth.rate_unit(), "GB/s");
        assert_eq!(ProbeKind::Compute.rate_unit(), "GFLOP/s");
        assert_eq!(ProbeKind::Compute.to_string(), "compute");
    }
}
