//! Stochastic Oscillator.
//!
//! %K(k)[i] = 100 × (C[i] - LL) / (HH - LL), where LL/HH are the lowest low and
//! highest high over the trailing k bars. No value when HH == LL.
//! %D(d) = simple mean of %K over the trailing d bars.

use crate::domain::indicator_helpers::{defined, ratio, rolling_max, rolling_mean, rolling_min};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticColumns {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn calculate_stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticColumns {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lowest = rolling_min(&defined(&lows), k_period);
    let highest = rolling_max(&defined(&highs), k_period);

    let k: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (lowest[i], highest[i]) {
            (Some(ll), Some(hh)) => ratio(bar.close - ll, hh - ll).map(|r| r * 100.0),
            _ => None,
        })
        .collect();
    let d = rolling_mean(&k, d_period);

    StochasticColumns { k, d }
}
