//! Simple and cumulative returns.
//!
//! daily_return[i] = C[i]/C[i-1] - 1, no value at i=0 or when C[i-1] is zero.
//! cumulative_return[i] = prod(1 + daily_return[1..=i]) - 1, no value at i=0.

use crate::domain::indicator_helpers::ratio;

pub fn calculate_daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            values.push(None);
        } else {
            values.push(ratio(closes[i], closes[i - 1]).map(|r| r - 1.0));
        }
    }
    values
}

/// Compounds the daily returns. A bar whose own return is undefined gets no value
/// but does not reset the running product.
pub fn calculate_cumulative_returns(daily_returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut growth = 1.0;
    daily_returns
        .iter()
        .map(|r| {
            r.map(|r| {
                growth *= 1.0 + r;
                growth - 1.0
            })
        })
        .collect()
}
