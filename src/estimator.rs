//! Main `RooflineEstimator` entry point and builder.

use std::fmt;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::{COMPUTE_LANES, MAX_COEFFICIENT_OF_VARIATION};
use crate::error::{ProfilerError, TrialIndex};
use crate::measurement::{
    check_elapsed, clock_resolution_secs, BandwidthProbe, ComputeProbe, Probe, ProbeKind, Sample,
    TrialSeries,
};
use crate::preflight::run_all_checks;
use crate::result::{Metadata, RooflineEstimate, RooflineReport};
use crate::roofline::{ridge_point, roofline, RegimeSplit};
use crate::statistics::{counter_rng_seed, FitMethod, RandomVariable};

/// Stream indices handed to `counter_rng_seed`, one per random variable.
const BANDWIDTH_STREAM: u64 = 0;
const COMPUTE_STREAM: u64 = 1;
const INTENSITY_STREAM: u64 = 2;

/// Main entry point for roofline estimation.
///
/// Use the builder pattern to configure and run the probes.
///
/// # Example
///
/// ```no_run
/// use roofline_oracle::RooflineEstimator;
///
/// let report = RooflineEstimator::new()
///     .trials(10)
///     .intensity_range(0.1, 5.0)
///     .seed(42)
///     .run()?;
///
/// println!("r = {}", report.estimate.r);
/// # Ok::<(), roofline_oracle::ProfilerError>(())
/// ```
///
/// # Lifecycle
///
/// A run moves through three phases and never back:
///
/// 1. **Collecting**: warm-up invocations, then `trials` rounds of the
///    bandwidth probe followed by the compute probe, strictly in sequence.
/// 2. **Fitting**: distributions are fitted to the GB/s and GFLOP/s series,
///    the intensity is drawn uniformly, and `max(b × ai, p)` is evaluated.
/// 3. **Done**: the [`RooflineReport`] is returned and owns everything.
///
/// Any probe failure aborts the run; nothing is retried.
#[derive(Debug, Clone)]
pub struct RooflineEstimator {
    config: Config,
}

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Probes are producing samples.
    Collecting,
    /// Trial series are being turned into distributions.
    Fitting,
    /// The report is final.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Collecting => write!(f, "collecting"),
            Phase::Fitting => write!(f, "fitting"),
            Phase::Done => write!(f, "done"),
        }
    }
}

impl Default for RooflineEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RooflineEstimator {
    /// Create with default configuration.
    ///
    /// Settings:
    /// - 10 trials per probe, 1 warm-up invocation
    /// - 128 MiB bandwidth working set
    /// - 1,000,000 chain iterations per compute trial
    /// - intensity uniform over [0.1, 5.0] FLOP/byte
    /// - 10,000 draws per random variable
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create with a fast configuration for tests and smoke runs.
    ///
    /// The bandwidth working set is small enough to be cache resident, so the
    /// resulting `b` is a cache bandwidth and the report carries a critical
    /// preflight warning saying so.
    ///
    /// Settings:
    /// - 3 trials per probe (vs 10 default)
    /// - 8 MiB bandwidth working set (vs 128 MiB default)
    /// - 100,000 chain iterations (vs 1,000,000 default)
    /// - 2,000 draws (vs 10,000 default)
    pub fn quick() -> Self {
        Self {
            config: Config {
                trials: 3,
                bandwidth_bytes: 8 * 1024 * 1024,
                compute_iterations: 100_000,
                draws: 2_000,
                allow_small_working_set: true,
                ..Config::default()
            },
        }
    }

    /// Create with a slow configuration for stable published numbers.
    ///
    /// Settings:
    /// - 30 trials per probe, 3 warm-up invocations
    /// - 512 MiB bandwidth working set
    /// - 10,000,000 chain iterations
    /// - 50,000 draws
    pub fn thorough() -> Self {
        Self {
            config: Config {
                trials: 30,
                warmup: 3,
                bandwidth_bytes: 512 * 1024 * 1024,
                compute_iterations: 10_000_000,
                draws: 50_000,
                ..Config::default()
            },
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the number of measured trials per probe.
    pub fn trials(mut self, n: usize) -> Self {
        self.config.trials = n;
        self
    }

    /// Set the number of discarded warm-up invocations per probe.
    pub fn warmup(mut self, n: usize) -> Self {
        self.config.warmup = n;
        self
    }

    /// Set the bandwidth working-set size in bytes.
    pub fn bandwidth_bytes(mut self, bytes: usize) -> Self {
        self.config.bandwidth_bytes = bytes;
        self
    }

    /// Set the number of FMA chain iterations per compute trial.
    pub fn compute_iterations(mut self, n: u64) -> Self {
        self.config.compute_iterations = n;
        self
    }

    /// Set the arithmetic intensity interval in FLOP/byte.
    pub fn intensity_range(mut self, low: f64, high: f64) -> Self {
        self.config.intensity_range = (low, high);
        self
    }

    /// Set the number of Monte-Carlo draws per random variable.
    pub fn draws(mut self, n: usize) -> Self {
        self.config.draws = n;
        self
    }

    /// Set the distribution fitting method.
    pub fn fit(mut self, method: FitMethod) -> Self {
        self.config.fit = method;
        self
    }

    /// Set deterministic sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Accept bandwidth working sets below 128 MiB.
    pub fn allow_small_working_set(mut self, allow: bool) -> Self {
        self.config.allow_small_working_set = allow;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run both probes and estimate the roofline.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` before any trial runs, or the first probe failure
    /// with its probe and trial index.
    pub fn run(self) -> Result<RooflineReport, ProfilerError> {
        self.run_with_observer(|_, _, _| {})
    }

    /// Like [`run`](Self::run), calling `observer(probe, trial, sample)` as
    /// each measured trial completes.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_with_observer<F>(self, observer: F) -> Result<RooflineReport, ProfilerError>
    where
        F: FnMut(ProbeKind, usize, &Sample),
    {
        let mut bandwidth = BandwidthProbe::new(self.config.bandwidth_bytes);
        let mut compute = ComputeProbe::new(self.config.compute_iterations);
        self.run_with_probes(&mut bandwidth, &mut compute, observer)
    }

    /// Run the state machine against caller-supplied probes.
    ///
    /// # Arguments
    ///
    /// * `bandwidth` - Probe whose samples count bytes
    /// * `compute` - Probe whose samples count flops
    /// * `observer` - Called with each measured trial as it completes
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is rejected or a probe reports the
    /// wrong kind, otherwise the first probe failure.
    pub fn run_with_probes<B, C, F>(
        self,
        mut bandwidth: B,
        mut compute: C,
        mut observer: F,
    ) -> Result<RooflineReport, ProfilerError>
    where
        B: Probe,
        C: Probe,
        F: FnMut(ProbeKind, usize, &Sample),
    {
        let start_time = Instant::now();
        let config = self.config;
        config.validate()?;
        expect_kind(&bandwidth, ProbeKind::Bandwidth)?;
        expect_kind(&compute, ProbeKind::Compute)?;

        let clock_resolution = clock_resolution_secs();

        // Collecting
        let mut phase = Phase::Collecting;
        info!(
            %phase,
            trials = config.trials,
            warmup = config.warmup,
            bandwidth_bytes = config.bandwidth_bytes,
            compute_iterations = config.compute_iterations,
            "starting roofline run"
        );

        for i in 0..config.warmup {
            invoke(&mut bandwidth, TrialIndex::Warmup(i))?;
            invoke(&mut compute, TrialIndex::Warmup(i))?;
        }

        let mut bandwidth_trials = TrialSeries::new(ProbeKind::Bandwidth, config.trials);
        let mut compute_trials = TrialSeries::new(ProbeKind::Compute, config.trials);
        for trial in 0..config.trials {
            for (probe, series) in [
                (&mut bandwidth as &mut dyn Probe, &mut bandwidth_trials),
                (&mut compute as &mut dyn Probe, &mut compute_trials),
            ] {
                let sample = invoke(probe, TrialIndex::Trial(trial))?;
                debug!(
                    probe = %series.kind(),
                    trial,
                    elapsed_secs = sample.elapsed_secs,
                    rate = sample.giga_rate(),
                    unit = series.kind().rate_unit(),
                    "trial complete"
                );
                observer(series.kind(), trial, &sample);
                series.push(sample);
            }
        }

        let preflight = run_all_checks(
            &bandwidth_trials,
            &compute_trials,
            clock_resolution,
            config.bandwidth_bytes,
            MAX_COEFFICIENT_OF_VARIATION,
        );
        for description in preflight.descriptions() {
            warn!("{}", description);
        }

        // Fitting
        phase = advance(phase, Phase::Fitting);
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        info!(%phase, seed, draws = config.draws, fit = ?config.fit, "fitting distributions");
        let estimate = fit(&config, seed, &bandwidth_trials, &compute_trials)?;

        // Done
        phase = advance(phase, Phase::Done);
        info!(
            %phase,
            b = %estimate.b,
            p = %estimate.p,
            r = %estimate.r,
            memory_bound_fraction = estimate.regime.memory_term,
            "roofline estimate"
        );

        Ok(RooflineReport {
            bandwidth_trials,
            compute_trials,
            estimate,
            preflight,
            metadata: Metadata {
                trials: config.trials,
                warmup: config.warmup,
                bandwidth_bytes: config.bandwidth_bytes,
                compute_iterations: config.compute_iterations,
                compute_lanes: COMPUTE_LANES,
                flops_per_trial: ComputeProbe::new(config.compute_iterations).flops(),
                intensity_range: config.intensity_range,
                fit: config.fit,
                draws: config.draws,
                seed,
                clock_resolution_secs: clock_resolution,
                runtime_secs: start_time.elapsed().as_secs_f64(),
            },
        })
    }
}

fn advance(from: Phase, to: Phase) -> Phase {
    debug_assert!(from < to, "phase went from {} back to {}", from, to);
    to
}

fn expect_kind<P: Probe>(probe: &P, kind: ProbeKind) -> Result<(), ProfilerError> {
    if probe.kind() == kind {
        Ok(())
    } else {
        Err(ProfilerError::InvalidConfig {
            reason: format!("a {} probe was supplied in the {} slot", probe.kind(), kind),
        })
    }
}

/// Invoke a probe once and reject samples no working clock could produce.
fn invoke(probe: &mut dyn Probe, trial: TrialIndex) -> Result<Sample, ProfilerError> {
    let kind = probe.kind();
    let sample = probe
        .run()
        .map_err(|err| ProfilerError::from_probe(kind, trial, err))?;
    check_elapsed(sample.elapsed_secs).map_err(|source| ProfilerError::Clock {
        probe: kind,
        trial,
        source,
    })?;
    Ok(sample)
}

/// Fit `b` and `p`, draw `ai`, and evaluate the roofline.
fn fit(
    config: &Config,
    seed: u64,
    bandwidth: &TrialSeries,
    compute: &TrialSeries,
) -> Result<RooflineEstimate, ProfilerError> {
    for series in [bandwidth, compute] {
        if !series.is_complete() {
            return Err(ProfilerError::IncompleteSeries {
                probe: series.kind(),
                expected: series.capacity(),
                actual: series.len(),
            });
        }
    }

    let stream = |index| Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, index));

    let fit_series = |series: &TrialSeries, index| {
        RandomVariable::from_samples(&series.giga_rates(), config.fit, config.draws, &mut stream(index))
            .map_err(|source| ProfilerError::Fit {
                probe: series.kind(),
                source,
            })
    };
    let b = fit_series(bandwidth, BANDWIDTH_STREAM)?;
    let p = fit_series(compute, COMPUTE_STREAM)?;

    let (low, high) = config.intensity_range;
    let arithmetic_intensity =
        RandomVariable::uniform(low, high, config.draws, &mut stream(INTENSITY_STREAM)).map_err(
            |err| ProfilerError::InvalidConfig {
                reason: err.to_string(),
            },
        )?;

    let r = roofline(&b, &p, &arithmetic_intensity);
    let ridge_point = ridge_point(&b, &p);
    let regime = RegimeSplit::of(&b, &p, &arithmetic_intensity);

    Ok(RooflineEstimate {
        b,
        p,
        arithmetic_intensity,
        r,
        ridge_point,
        regime,
    })
}
