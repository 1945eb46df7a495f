//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! All three EMAs are seeded with their first input, so there is no warmup.

use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator_helpers::{ewm, finite, zip_with};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdColumns {
    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);
    macd_from_emas(&ema_fast, &ema_slow, signal_span)
}

/// Builds the MACD columns from precomputed fast/slow EMAs, so the enrichment pass
/// can reuse the `ema_12`/`ema_26` columns it already holds.
pub fn macd_from_emas(
    ema_fast: &[Option<f64>],
    ema_slow: &[Option<f64>],
    signal_span: usize,
) -> MacdColumns {
    let line = zip_with(ema_fast, ema_slow, |f, s| finite(f - s));
    let signal = ewm(&line, signal_span);
    let histogram = zip_with(&line, &signal, |l, s| finite(l - s));
    MacdColumns {
        line,
        signal,
        histogram,
    }
}

pub fn calculate_macd_default(closes: &[f64]) -> MacdColumns {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
