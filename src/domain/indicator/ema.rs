//! Exponential Moving Average.
//!
//! k = 2/(span+1), seeded with the first close, then EMA[i] = EMA[i-1] + k*(C[i]-EMA[i-1]).
//! No adjustment factor and no warmup: every bar has a value.

use crate::domain::indicator_helpers::{defined, ewm};

pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<Option<f64>> {
    ewm(&defined(closes), span)
}
