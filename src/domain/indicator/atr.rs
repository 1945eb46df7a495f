//! ATR (Average True Range) indicator.
//!
//! True Range = max(H - L, |H - prev_C|, |L - prev_C|)
//! The first bar has no previous close, so TR[0] = H[0] - L[0].
//! ATR(n)[i] = simple mean of TR over the trailing n bars.
//!
//! Warmup: first (n-1) bars have no value.

use crate::domain::indicator_helpers::{finite, rolling_mean};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn true_ranges(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let tr = if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            };
            finite(tr)
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_ranges(bars), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_first_true_range_is_high_minus_low() {
        let bars = vec![make_bar(1, 12.0, 9.0, 10.0)];
        assert_eq!(true_ranges(&bars), vec![Some(3.0)]);
    }

    #[test]
    fn atr_gap_uses_previous_close() {
        // gap up: prev close 10, today 15..14 → TR = |15 - 10| = 5
        let bars = vec![make_bar(1, 11.0, 9.0, 10.0), make_bar(2, 15.0, 14.0, 14.5)];
        let tr = true_ranges(&bars);
        assert_eq!(tr[1], Some(5.0));
    }

    #[test]
    fn atr_defined_from_period_minus_one() {
        let bars: Vec<Bar> = (1..=5)
            .map(|d| make_bar(d, 10.0 + d as f64, 8.0 + d as f64, 9.0 + d as f64))
            .collect();
        let atr = calculate_atr(&bars, 3);

        assert!(atr[0].is_none());
        assert!(atr[1].is_none());
        assert!(atr[2].is_some());
    }

    #[test]
    fn atr_known_values() {
        let bars = vec![
            make_bar(1, 12.0, 10.0, 11.0), // TR 2
            make_bar(2, 13.0, 11.0, 12.0), // TR max(2, 2, 0) = 2
            make_bar(3, 16.0, 12.0, 15.0), // TR max(4, 4, 0) = 4
        ];
        let atr = calculate_atr(&bars, 3);
        assert!((atr[2].unwrap() - 8.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn atr_empty() {
        assert!(calculate_atr(&[], 14).is_empty());
    }
}
