//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars have no value.

use crate::domain::indicator_helpers::{defined, rolling_mean};

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&defined(closes), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let values = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert_eq!(values[2], Some(20.0));
        assert_eq!(values[4], Some(40.0));
    }

    #[test]
    fn sma_200_defined_for_trailing_bars() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i % 13) as f64).collect();
        let values = calculate_sma(&closes, 200);
        assert_eq!(values.iter().filter(|v| v.is_some()).count(), 250 - 199);
        assert!(values[198].is_none());
        assert!(values[199].is_some());
    }

    #[test]
    fn sma_period_longer_than_series() {
        let values = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(values, vec![None, None]);
    }

    #[test]
    fn sma_period_0() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }
}
