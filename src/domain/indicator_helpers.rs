//! Shared rolling-window primitives for indicator calculations.
//!
//! Every helper returns a column of the same length as its input. A cell is `None`
//! while the trailing window is still warming up, when any value inside the window
//! is itself `None`, or when the arithmetic would divide by zero.

/// Division that yields `None` instead of ±inf or NaN.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Lift a fully-defined slice into a column.
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| finite(v)).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// True when `spread` over `n` values centred on `center` is rounding noise.
pub fn negligible(spread: f64, center: f64, n: usize) -> bool {
    spread.abs() <= f64::EPSILON * center.abs().max(1.0) * n as f64
}

/// Sample standard deviation (N-1 denominator); `None` below two values.
/// Rounding noise around a constant input is reported as exactly 0.0.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    let std = finite(variance.sqrt())?;
    if negligible(std, m, values.len()) {
        return Some(0.0);
    }
    Some(std)
}

/// Sample covariance of two equal-length slices.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let ma = mean(a)?;
    let mb = mean(b)?;
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    finite(sum / (a.len() - 1) as f64)
}

/// The fully-defined trailing window ending at `i`, or `None` during warmup or
/// when the window contains a gap.
fn window_at(values: &[Option<f64>], i: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || i + 1 < window {
        return None;
    }
    values[i + 1 - window..=i].iter().copied().collect()
}

fn rolling(
    values: &[Option<f64>],
    window: usize,
    f: impl Fn(&[f64]) -> Option<f64>,
) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_at(values, i, window).and_then(|w| f(&w)))
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| finite(w.iter().sum()))
}

pub fn rolling_sample_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::max))
}

/// Exponentially weighted mean without adjustment, seeded with the first defined
/// value: `ema[i] = ema[i-1] + alpha * (x[i] - ema[i-1])`, `alpha = 2 / (span + 1)`.
///
/// Leading `None`s stay `None`; a `None` after the seed carries the previous
/// average forward without emitting a value for that bar.
pub fn ewm(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current: Option<f64> = None;
    values
        .iter()
        .map(|v| match (*v, current) {
            (Some(x), None) => {
                current = Some(x);
                current
            }
            (Some(x), Some(prev)) => {
                current = Some(prev + alpha * (x - prev));
                current
            }
            (None, _) => None,
        })
        .collect()
}

/// Elementwise combination of two aligned columns.
pub fn zip_with(
    a: &[Option<f64>],
    b: &[Option<f64>],
    f: impl Fn(f64, f64) -> Option<f64>,
) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(3.0, 2.0), Some(1.5));
    }

    #[test]
    fn sample_std_known_values() {
        // population std of this set is 2.0; sample std is sqrt(32/7)
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((sample_std(&v).unwrap() - expected).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn sample_std_of_constant_with_rounding_noise_is_zero() {
        let returns: Vec<f64> = (1..60)
            .map(|i| 100.0 * 1.01_f64.powi(i) / (100.0 * 1.01_f64.powi(i - 1)) - 1.0)
            .collect();
        assert_eq!(sample_std(&returns), Some(0.0));
        assert!(negligible(1e-15, 0.01, 59));
        assert!(!negligible(1e-3, 0.01, 59));
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let col = defined(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let out = rolling_mean(&col, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(20.0));
        assert_eq!(out[3], Some(30.0));
        assert_eq!(out[4], Some(40.0));
    }

    #[test]
    fn rolling_skips_windows_with_gaps() {
        let col = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let out = rolling_mean(&col, 2);
        assert_eq!(out, vec![None, None, Some(1.5), Some(2.5)]);
    }

    #[test]
    fn rolling_zero_window_is_all_none() {
        let col = defined(&[1.0, 2.0]);
        assert_eq!(rolling_mean(&col, 0), vec![None, None]);
    }

    #[test]
    fn rolling_min_max() {
        let col = defined(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(rolling_min(&col, 3), vec![None, None, Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(rolling_max(&col, 3), vec![None, None, Some(4.0), Some(4.0), Some(5.0)]);
    }

    #[test]
    fn ewm_seeds_with_first_value() {
        let col = defined(&[10.0, 20.0, 30.0]);
        let out = ewm(&col, 3);
        let alpha = 0.5;
        assert_eq!(out[0], Some(10.0));
        assert_eq!(out[1], Some(10.0 + alpha * 10.0));
        assert_eq!(out[2], Some(15.0 + alpha * 15.0));
    }

    #[test]
    fn ewm_leading_none_delays_seed() {
        let col = vec![None, Some(4.0), Some(8.0)];
        let out = ewm(&col, 1);
        assert_eq!(out, vec![None, Some(4.0), Some(8.0)]);
    }

    #[test]
    fn covariance_of_identical_series_is_variance() {
        let v = [0.01, -0.02, 0.03, 0.0];
        let var = sample_std(&v).unwrap().powi(2);
        assert!((sample_covariance(&v, &v).unwrap() - var).abs() < 1e-15);
        assert_eq!(sample_covariance(&v, &v[..3]), None);
    }
}
