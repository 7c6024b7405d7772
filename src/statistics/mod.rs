//! Statistical methods for the roofline estimate.
//!
//! This module provides:
//! - [`RandomVariable`]: a distribution-valued quantity with draw-wise
//!   arithmetic and `max`
//! - Distribution fitting by (optionally kernel-smoothed) bootstrap
//! - R-7 quantiles over the draws
//! - Sample moments for quality checks

mod bootstrap;
mod moments;
mod quantile;
mod random_variable;

pub use bootstrap::{counter_rng_seed, resample_into, silverman_bandwidth, smoothed_resample_into};
pub use moments::{coefficient_of_variation, mean, std_dev};
pub use quantile::{compute_quantile_sorted, compute_quantiles};
pub use random_variable::{DistributionError, DistributionSummary, FitMethod, RandomVariable};
