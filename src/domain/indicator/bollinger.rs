//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//! Width = Upper - Lower; %B = (Close - Lower) / Width, no value when Width is 0.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars have no value.

use crate::domain::indicator_helpers::{defined, finite, ratio, rolling_mean, rolling_sample_std};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub middle: Vec<Option<f64>>,
    pub std: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub width: Vec<Option<f64>>,
    pub percent: Vec<Option<f64>>,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerColumns {
    let column = defined(closes);
    let middle = rolling_mean(&column, period);
    let std = rolling_sample_std(&column, period);

    let n = closes.len();
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut width = Vec::with_capacity(n);
    let mut percent = Vec::with_capacity(n);

    for i in 0..n {
        match (middle[i], std[i]) {
            (Some(m), Some(s)) => {
                let up = m + multiplier * s;
                let low = m - multiplier * s;
                upper.push(finite(up));
                lower.push(finite(low));
                width.push(finite(up - low));
                percent.push(ratio(closes[i] - low, up - low));
            }
            _ => {
                upper.push(None);
                lower.push(None);
                width.push(None);
                percent.push(None);
            }
        }
    }

    BollingerColumns {
        middle,
        std,
        upper,
        lower,
        width,
        percent,
    }
}
