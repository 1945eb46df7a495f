//! Rolling annualized volatility.
//!
//! VOL(n)[i] = sample std of daily_return over the trailing n bars × sqrt(periods_per_year).
//! daily_return[0] has no value, so the first defined bar is index n.

use crate::domain::indicator_helpers::{finite, rolling_sample_std};

pub fn calculate_volatility(
    daily_returns: &[Option<f64>],
    window: usize,
    periods_per_year: f64,
) -> Vec<Option<f64>> {
    let factor = periods_per_year.sqrt();
    rolling_sample_std(daily_returns, window)
        .into_iter()
        .map(|std| std.and_then(|s| finite(s * factor)))
        .collect()
}
