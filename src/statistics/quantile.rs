//! Quantile computation.
//!
//! R-7 definition (linear interpolation between order statistics) on data
//! sorted once up front.

/// Compute a quantile from data already sorted in ascending order.
///
/// # Panics
///
/// Panics if `sorted` is empty or if `p` is outside [0, 1].
pub fn compute_quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );

    let n = sorted.len();
    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        sorted[n - 1]
    } else if h_frac == 0.0 {
        sorted[h_floor]
    } else {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    }
}

/// Compute several quantiles with one sort.
pub fn compute_quantiles(data: &[f64], ps: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    ps.iter()
        .map(|&p| compute_quantile_sorted(&sorted, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_and_extremes() {
        let q = compute_quantiles(&[5.0, 1.0, 4.0, 2.0, 3.0], &[0.0, 0.5, 1.0]);
        assert_eq!(q, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_interpolation() {
        // h = 3 * 0.25 = 0.75 -> 1 + 0.75 * (2 - 1)
        let q = compute_quantile_sorted(&[1.0, 2.0, 3.0, 4.0], 0.25);
        assert!((q - 1.75).abs() < 1e-10);
    }

    #[test]
    fn test_single_element() {
        assert_eq!(compute_quantile_sorted(&[7.5], 0.3), 7.5);
    }

    #[test]
    #[should_panic(expected = "Cannot compute quantile of empty slice")]
    fn test_empty_slice_panics() {
        compute_quantile_sorted(&[], 0.5);
    }

    #[test]
    #[should_panic(expected = "Quantile probability must be in [0, 1]")]
    fn test_out_of_range_probability_panics() {
        compute_quantile_sorted(&[1.0], 1.5);
    }
}
