//! Distribution-valued quantities propagated by Monte-Carlo draws.
//!
//! A [`RandomVariable`] is either an exact point value or a vector of draws
//! from its distribution. Arithmetic and `max` act draw by draw, so:
//!
//! - two variables fitted or drawn from independent random streams combine as
//!   independent variables;
//! - a variable combined with itself (or with something computed from it)
//!   keeps that dependence, because draw `i` of both operands comes from the
//!   same underlying draw;
//! - `max` is a distribution-level operation: `E[max(X, Y)]` is generally
//!   larger than `max(E[X], E[Y])` when the operands overlap, and nothing is
//!   collapsed to a scalar before the formula is evaluated.
//!
//! Point values broadcast against draw vectors, so a constant behaves exactly
//! like a degenerate distribution.

use std::fmt;
use std::ops::{Add, Div, Mul};
use std::sync::Arc;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bootstrap::{resample_into, silverman_bandwidth, smoothed_resample_into};
use super::moments;
use super::quantile::{compute_quantile_sorted, compute_quantiles};
use crate::constants::SUMMARY_QUANTILES;

/// How a distribution is fitted to a finite sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Resample the observed values with replacement.
    #[default]
    Bootstrap,
    /// Resample, then smooth with a Gaussian kernel (Silverman bandwidth).
    Kernel,
}

/// Failure to build a distribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    /// No samples to fit.
    #[error("cannot fit a distribution to an empty sample set")]
    EmptySamples,

    /// A sample was NaN or infinite.
    #[error("sample {index} is not finite ({value})")]
    NonFiniteSample {
        /// Position of the bad sample.
        index: usize,
        /// The value itself.
        value: f64,
    },

    /// Interval bounds were inverted or not finite.
    #[error("invalid interval [{low}, {high}]")]
    InvalidInterval {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },

    /// Zero draws requested.
    #[error("a random variable needs at least one draw")]
    NoDraws,
}

#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Point(f64),
    Draws(Arc<[f64]>),
}

/// A distribution-valued quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "DistributionSummary")]
pub struct RandomVariable {
    repr: Repr,
}

impl RandomVariable {
    /// Exact value, a degenerate distribution.
    pub fn point(value: f64) -> Self {
        Self {
            repr: Repr::Point(value),
        }
    }

    /// Fit a distribution to `samples` and carry it as `draws` draws.
    ///
    /// A single sample, or a set of identical samples, fits to a point.
    ///
    /// # Errors
    ///
    /// `EmptySamples`, `NonFiniteSample` or `NoDraws`.
    pub fn from_samples<R: Rng>(
        samples: &[f64],
        method: FitMethod,
        draws: usize,
        rng: &mut R,
    ) -> Result<Self, DistributionError> {
        if samples.is_empty() {
            return Err(DistributionError::EmptySamples);
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DistributionError::NonFiniteSample { index, value });
        }
        if draws == 0 {
            return Err(DistributionError::NoDraws);
        }

        let first = samples[0];
        if samples.iter().all(|&v| v == first) {
            return Ok(Self::point(first));
        }

        let mut out = vec![0.0; draws];
        match method {
            FitMethod::Bootstrap => resample_into(samples, rng, &mut out),
            FitMethod::Kernel => {
                let h = silverman_bandwidth(samples);
                smoothed_resample_into(samples, h, rng, &mut out);
            }
        }
        Ok(Self::from_draws(out))
    }

    /// Uniform distribution over the closed interval `[low, high]`.
    ///
    /// `low == high` gives a point.
    ///
    /// # Errors
    ///
    /// `InvalidInterval` for inverted or non-finite bounds, `NoDraws` for zero draws.
    pub fn uniform<R: Rng>(
        low: f64,
        high: f64,
        draws: usize,
        rng: &mut R,
    ) -> Result<Self, DistributionError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(DistributionError::InvalidInterval { low, high });
        }
        if draws == 0 {
            return Err(DistributionError::NoDraws);
        }
        if low == high {
            return Ok(Self::point(low));
        }
        let dist = Uniform::new_inclusive(low, high)
            .map_err(|_| DistributionError::InvalidInterval { low, high })?;
        let out: Vec<f64> = (0..draws).map(|_| dist.sample(rng)).collect();
        Ok(Self::from_draws(out))
    }

    fn from_draws(draws: Vec<f64>) -> Self {
        Self {
            repr: Repr::Draws(draws.into()),
        }
    }

    /// Whether this is an exact value.
    pub fn is_point(&self) -> bool {
        matches!(self.repr, Repr::Point(_))
    }

    /// The exact value, if this is a point.
    pub fn as_point(&self) -> Option<f64> {
        match self.repr {
            Repr::Point(v) => Some(v),
            Repr::Draws(_) => None,
        }
    }

    /// Number of Monte-Carlo draws (1 for a point).
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Point(_) => 1,
            Repr::Draws(d) => d.len(),
        }
    }

    /// Always false; kept alongside `len` for API symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The draws (a single element for a point).
    pub fn draws(&self) -> &[f64] {
        match &self.repr {
            Repr::Point(v) => std::slice::from_ref(v),
            Repr::Draws(d) => d,
        }
    }

    /// Apply `op` draw by draw, broadcasting points.
    ///
    /// Every public binary operation goes through here, so they all share its
    /// panic on mismatched draw counts.
    fn zip_with(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Point(a), Repr::Point(b)) => Self::point(op(*a, *b)),
            (Repr::Point(a), Repr::Draws(b)) => Self::from_draws(b.iter().map(|&y| op(*a, y)).collect()),
            (Repr::Draws(a), Repr::Point(b)) => Self::from_draws(a.iter().map(|&x| op(x, *b)).collect()),
            (Repr::Draws(a), Repr::Draws(b)) => {
                assert_eq!(
                    a.len(),
                    b.len(),
                    "random variables must carry the same number of draws"
                );
                Self::from_draws(a.iter().zip(b.iter()).map(|(&x, &y)| op(x, y)).collect())
            }
        }
    }

    /// Multiply every draw by a constant.
    pub fn scale(&self, k: f64) -> Self {
        self.zip_with(&Self::point(k), |x, k| x * k)
    }

    /// Draw-wise maximum.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    pub fn max(&self, other: &Self) -> Self {
        self.zip_with(other, f64::max)
    }

    /// Draw-wise minimum.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    pub fn min(&self, other: &Self) -> Self {
        self.zip_with(other, f64::min)
    }

    /// Fraction of draws where `self >= other`.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    pub fn probability_at_least(&self, other: &Self) -> f64 {
        let indicator = self.zip_with(other, |x, y| if x >= y { 1.0 } else { 0.0 });
        indicator.mean()
    }

    /// Mean of the draws.
    pub fn mean(&self) -> f64 {
        moments::mean(self.draws())
    }

    /// Standard deviation of the draws (zero for a point).
    pub fn std_dev(&self) -> f64 {
        moments::std_dev(self.draws())
    }

    /// Quantile `p` of the draws.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside [0, 1].
    pub fn quantile(&self, p: f64) -> f64 {
        match &self.repr {
            Repr::Point(v) => {
                assert!((0.0..=1.0).contains(&p), "Quantile probability must be in [0, 1]");
                *v
            }
            Repr::Draws(d) => {
                let mut sorted = d.to_vec();
                sorted.sort_unstable_by(|a, b| a.total_cmp(b));
                compute_quantile_sorted(&sorted, p)
            }
        }
    }

    /// Moments and quantiles for reporting.
    pub fn summary(&self) -> DistributionSummary {
        let d = self.draws();
        let q = compute_quantiles(d, &[0.0, SUMMARY_QUANTILES.0, 0.5, SUMMARY_QUANTILES.1, 1.0]);
        DistributionSummary {
            mean: self.mean(),
            std_dev: self.std_dev(),
            min: q[0],
            p05: q[1],
            median: q[2],
            p95: q[3],
            max: q[4],
            draws: self.len(),
        }
    }
}

impl From<f64> for RandomVariable {
    fn from(value: f64) -> Self {
        Self::point(value)
    }
}

impl Add for &RandomVariable {
    type Output = RandomVariable;

    /// Draw-wise sum.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    fn add(self, rhs: &RandomVariable) -> RandomVariable {
        self.zip_with(rhs, |x, y| x + y)
    }
}

impl Add for RandomVariable {
    type Output = RandomVariable;

    /// Draw-wise sum.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    fn add(self, rhs: RandomVariable) -> RandomVariable {
        &self + &rhs
    }
}

impl Mul for &RandomVariable {
    type Output = RandomVariable;

    /// Draw-wise product.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    fn mul(self, rhs: &RandomVariable) -> RandomVariable {
        self.zip_with(rhs, |x, y| x * y)
    }
}

impl Mul for RandomVariable {
    type Output = RandomVariable;

    /// Draw-wise product.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    fn mul(self, rhs: RandomVariable) -> RandomVariable {
        &self * &rhs
    }
}

impl Div for &RandomVariable {
    type Output = RandomVariable;

    /// Draw-wise quotient.
    ///
    /// # Panics
    ///
    /// Panics if both operands carry draws and their draw counts differ.
    fn div(self, rhs: &RandomVariable) -> RandomVariable {
        self.zip_with(rhs, |x, y| x / y)
    }
}

impl Mul<f64> for &RandomVariable {
    type Output = RandomVariable;

    fn mul(self, k: f64) -> RandomVariable {
        self.scale(k)
    }
}

impl Mul<f64> for RandomVariable {
    type Output = RandomVariable;

    fn mul(self, k: f64) -> RandomVariable {
        self.scale(k)
    }
}

impl fmt::Display for RandomVariable {
    /// `mean ± std [p05, p95]`, or the bare value for a point.
    ///
    /// Precision defaults to 3 decimals and follows `{:.N}` when given.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        match self.repr {
            Repr::Point(v) => write!(f, "{:.*}", prec, v),
            Repr::Draws(_) => {
                let s = self.summary();
                write!(
                    f,
                    "{:.*} ± {:.*} [{:.*}, {:.*}]",
                    prec, s.mean, prec, s.std_dev, prec, s.p05, prec, s.p95
                )
            }
        }
    }
}

/// Reportable summary of a random variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Mean of the draws.
    pub mean: f64,
    /// Standard deviation of the draws.
    pub std_dev: f64,
    /// Smallest draw.
    pub min: f64,
    /// 5th percentile.
    pub p05: f64,
    /// Median.
    pub median: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Largest draw.
    pub max: f64,
    /// Number of draws (1 for an exact value).
    pub draws: usize,
}

impl From<RandomVariable> for DistributionSummary {
    fn from(rv: RandomVariable) -> Self {
        rv.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn test_point_arithmetic() {
        let b = RandomVariable::point(10.0);
        let p = RandomVariable::point(100.0);
        let ai = RandomVariable::point(2.0);
        let r = (&b * &ai).max(&p);
        assert_eq!(r.as_point(), Some(100.0));
        assert_eq!((&b + &p).as_point(), Some(110.0));
        assert_eq!((b * 0.5).as_point(), Some(5.0));
    }

    #[test]
    fn test_from_samples_errors() {
        let mut r = rng(1);
        assert_eq!(
            RandomVariable::from_samples(&[], FitMethod::Bootstrap, 10, &mut r),
            Err(DistributionError::EmptySamples)
        );
        assert!(matches!(
            RandomVariable::from_samples(&[1.0, f64::NAN], FitMethod::Bootstrap, 10, &mut r),
            Err(DistributionError::NonFiniteSample { index: 1, .. })
        ));
        assert_eq!(
            RandomVariable::from_samples(&[1.0, 2.0], FitMethod::Bootstrap, 0, &mut r),
            Err(DistributionError::NoDraws)
        );
    }

    #[test]
    fn test_identical_samples_fit_a_point() {
        let rv = RandomVariable::from_samples(&[4.0; 10], FitMethod::Kernel, 100, &mut rng(2))
            .unwrap();
        assert_eq!(rv.as_point(), Some(4.0));
    }

    #[test]
    fn test_kernel_fit_smooths_around_samples() {
        let samples = [9.0, 10.0, 11.0, 10.5, 9.5];
        let rv = RandomVariable::from_samples(&samples, FitMethod::Kernel, 5000, &mut rng(15))
            .unwrap();
        assert!(!rv.is_point());
        assert_eq!(rv.len(), 5000);
        assert!(rv.draws().iter().all(|&v| v >= 0.0));
        // Smoothing moves draws off the sample values
        assert!(rv.draws().iter().any(|v| !samples.contains(v)));
        assert!((rv.mean() - 10.0).abs() < 0.1, "mean = {}", rv.mean());
        // Spread is the sample spread widened by the kernel, not collapsed
        assert!((0.7..1.2).contains(&rv.std_dev()), "sd = {}", rv.std_dev());
    }

    #[test]
    fn test_kernel_fit_is_seeded() {
        let samples = [9.0, 10.0, 11.0, 10.5, 9.5];
        let a = RandomVariable::from_samples(&samples, FitMethod::Kernel, 100, &mut rng(16));
        let b = RandomVariable::from_samples(&samples, FitMethod::Kernel, 100, &mut rng(16));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bootstrap_fit_preserves_support() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        let rv = RandomVariable::from_samples(&samples, FitMethod::Bootstrap, 4000, &mut rng(3))
            .unwrap();
        assert_eq!(rv.len(), 4000);
        assert!(rv.draws().iter().all(|v| samples.contains(v)));
        assert!((rv.mean() - 2.5).abs() < 0.1, "mean = {}", rv.mean());
    }

    #[test]
    fn test_uniform_moments() {
        let rv = RandomVariable::uniform(0.1, 5.0, 20_000, &mut rng(4)).unwrap();
        assert!(rv.draws().iter().all(|&v| (0.1..=5.0).contains(&v)));
        assert!((rv.mean() - 2.55).abs() < 0.05, "mean = {}", rv.mean());
        // Var = (b - a)^2 / 12
        let expected_sd = 4.9 / 12f64.sqrt();
        assert!((rv.std_dev() - expected_sd).abs() < 0.05, "sd = {}", rv.std_dev());
    }

    #[test]
    fn test_uniform_degenerate_and_invalid() {
        assert_eq!(
            RandomVariable::uniform(2.0, 2.0, 10, &mut rng(5)).unwrap().as_point(),
            Some(2.0)
        );
        assert!(RandomVariable::uniform(5.0, 1.0, 10, &mut rng(5)).is_err());
        assert!(RandomVariable::uniform(f64::NEG_INFINITY, 1.0, 10, &mut rng(5)).is_err());
    }

    #[test]
    fn test_self_combination_keeps_dependence() {
        let x = RandomVariable::uniform(0.0, 1.0, 5000, &mut rng(6)).unwrap();
        // x - x would be exactly zero; x * -1 + x checks the same thing
        let zero = &(&x * -1.0) + &x;
        assert!(zero.draws().iter().all(|&v| v == 0.0));
        // max(x, x) is x itself
        assert_eq!(x.max(&x), x);
    }

    #[test]
    fn test_distribution_max_exceeds_max_of_means() {
        // Two independent variables with equal means: max of means is 1.0,
        // the mean of the draw-wise max is clearly larger.
        let x = RandomVariable::uniform(0.0, 2.0, 20_000, &mut rng(7)).unwrap();
        let y = RandomVariable::uniform(0.0, 2.0, 20_000, &mut rng(8)).unwrap();
        let m = x.max(&y);
        let collapsed = x.mean().max(y.mean());
        // E[max(U1, U2)] on [0, 2] is 4/3
        assert!((m.mean() - 4.0 / 3.0).abs() < 0.03, "mean = {}", m.mean());
        assert!(m.mean() > collapsed + 0.2);
    }

    #[test]
    fn test_min_and_quantile() {
        let x = RandomVariable::uniform(0.0, 2.0, 10_000, &mut rng(17)).unwrap();
        let one = RandomVariable::point(1.0);
        let capped = x.min(&one);
        assert!(capped.draws().iter().all(|&v| v <= 1.0));
        // About half the mass sits at the cap
        assert_eq!(capped.quantile(0.75), 1.0);
        assert!(capped.quantile(0.25) < 0.6, "q25 = {}", capped.quantile(0.25));
        assert!((x.quantile(0.5) - 1.0).abs() < 0.05, "median = {}", x.quantile(0.5));
        assert_eq!(x.quantile(0.0), x.summary().min);
        assert_eq!(x.quantile(1.0), x.summary().max);

        assert_eq!(one.min(&RandomVariable::point(3.0)).as_point(), Some(1.0));
        assert_eq!(RandomVariable::point(4.0).quantile(0.9), 4.0);
    }

    #[test]
    #[should_panic(expected = "Quantile probability must be in [0, 1]")]
    fn test_point_quantile_out_of_range_panics() {
        RandomVariable::point(4.0).quantile(1.5);
    }

    #[test]
    #[should_panic(expected = "same number of draws")]
    fn test_mismatched_draws_panic_in_max() {
        let x = RandomVariable::uniform(0.0, 1.0, 10, &mut rng(18)).unwrap();
        let y = RandomVariable::uniform(0.0, 1.0, 20, &mut rng(19)).unwrap();
        let _ = x.max(&y);
    }

    #[test]
    fn test_point_broadcasts() {
        let x = RandomVariable::uniform(0.0, 1.0, 100, &mut rng(9)).unwrap();
        let shifted = &x + &RandomVariable::point(10.0);
        assert_eq!(shifted.len(), 100);
        assert!(shifted.draws().iter().all(|&v| (10.0..=11.0).contains(&v)));
    }

    #[test]
    #[should_panic(expected = "same number of draws")]
    fn test_mismatched_draws_panic() {
        let x = RandomVariable::uniform(0.0, 1.0, 10, &mut rng(10)).unwrap();
        let y = RandomVariable::uniform(0.0, 1.0, 20, &mut rng(11)).unwrap();
        let _ = &x + &y;
    }

    #[test]
    fn test_probability_at_least() {
        let x = RandomVariable::uniform(0.0, 1.0, 10_000, &mut rng(12)).unwrap();
        let half = RandomVariable::point(0.5);
        let p = x.probability_at_least(&half);
        assert!((p - 0.5).abs() < 0.03, "p = {}", p);
    }

    #[test]
    fn test_display() {
        assert_eq!(RandomVariable::point(2.0).to_string(), "2.000");
        assert_eq!(format!("{:.1}", RandomVariable::point(2.0)), "2.0");
        let x = RandomVariable::uniform(0.0, 1.0, 1000, &mut rng(13)).unwrap();
        let text = x.to_string();
        assert!(text.contains('±'), "{}", text);
        assert!(text.contains('['), "{}", text);
    }

    #[test]
    fn test_summary_serializes() {
        let x = RandomVariable::uniform(1.0, 3.0, 1000, &mut rng(14)).unwrap();
        let json = serde_json::to_string(&x).unwrap();
        assert!(json.contains("\"mean\""));
        assert!(json.contains("\"p95\""));
        assert!(json.contains("\"draws\":1000"));
    }
}
