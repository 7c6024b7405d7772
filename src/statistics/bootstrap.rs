//! Resampling used to fit a distribution to a short trial series.
//!
//! Trials are independent (each allocates a fresh working set and runs to
//! completion before the next), so plain i.i.d. resampling is appropriate; no
//! block structure needs preserving.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Counter-based RNG seed generation using SplitMix64.
///
/// Derives well-separated seeds for independent random streams from one base
/// seed, so every random variable of a run gets its own stream.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64, see https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Fill `out` with values drawn uniformly, with replacement, from `data`.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn resample_into<R: Rng>(data: &[f64], rng: &mut R, out: &mut [f64]) {
    assert!(!data.is_empty(), "Cannot resample from empty data");
    for slot in out.iter_mut() {
        *slot = data[rng.random_range(0..data.len())];
    }
}

/// Smoothed bootstrap: resample, then add Gaussian kernel noise.
///
/// Draws are reflected at zero, so a series of strictly positive rates never
/// yields a negative draw.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn smoothed_resample_into<R: Rng>(data: &[f64], bandwidth: f64, rng: &mut R, out: &mut [f64]) {
    resample_into(data, rng, out);
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return;
    }
    for slot in out.iter_mut() {
        let z: f64 = StandardNormal.sample(rng);
        *slot = (*slot + bandwidth * z).abs();
    }
}

/// Silverman's rule-of-thumb kernel bandwidth: 1.06 · σ · n^(-1/5).
///
/// Zero for fewer than two samples or constant data.
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let sigma = super::moments::std_dev(data);
    1.06 * sigma * (data.len() as f64).powf(-0.2)
}
