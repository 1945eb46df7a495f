//! Risk and performance metrics over a return series.
//!
//! All inputs are simple per-period returns with the "no value" cells already
//! dropped. Every ratio follows the zero-variance policy: a zero (or undefined)
//! denominator yields 0.0, never NaN or ±inf. VaR and CVaR are the exception and
//! have no value for an empty input.

use crate::domain::enriched::EnrichedSeries;
use crate::domain::indicator::{IndicatorType, TRADING_DAYS_PER_YEAR};
use crate::domain::indicator_helpers::{
    finite, mean, ratio, rolling_mean, rolling_sample_std, rolling_sum, sample_std,
};

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
    /// VaR/CVaR confidence level, e.g. 0.95.
    pub confidence: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RiskMetrics {
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Non-positive; 0.0 means no drawdown.
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub value_at_risk: Option<f64>,
    pub conditional_value_at_risk: Option<f64>,
}

impl RiskMetrics {
    pub fn from_returns(returns: &[f64], config: &MetricsConfig) -> Self {
        let ppy = config.periods_per_year;
        Self {
            annualized_return: annualized_return(returns, ppy),
            annualized_volatility: annualized_volatility(returns, ppy),
            sharpe_ratio: sharpe_ratio(returns, config.risk_free_rate, ppy),
            sortino_ratio: sortino_ratio(returns, config.risk_free_rate, ppy),
            max_drawdown: max_drawdown(returns),
            calmar_ratio: calmar_ratio(returns, ppy),
            value_at_risk: value_at_risk(returns, config.confidence),
            conditional_value_at_risk: conditional_value_at_risk(returns, config.confidence),
        }
    }
}

/// Point-in-time snapshot of one enriched series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SummaryStatistics {
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    /// Fraction, not percent.
    pub change_percent: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub average_volume: f64,
    /// close[last] / close[0] - 1, as a fraction.
    pub total_return: Option<f64>,
    pub risk: RiskMetrics,
}

/// `None` for an empty series.
pub fn summary_statistics(
    enriched: &EnrichedSeries,
    config: &MetricsConfig,
) -> Option<SummaryStatistics> {
    let series = enriched.series();
    let bars = series.bars();
    let first = series.first()?;
    let last = series.last()?;
    let previous = bars.len().checked_sub(2).map(|i| &bars[i]);

    let high = series.highs().into_iter().fold(f64::NEG_INFINITY, f64::max);
    let low = series.lows().into_iter().fold(f64::INFINITY, f64::min);
    let volumes = series.volumes();

    Some(SummaryStatistics {
        current_price: last.close,
        previous_close: previous.map(|p| p.close),
        change: previous.map(|p| last.close - p.close),
        change_percent: previous.and_then(|p| ratio(last.close, p.close).map(|r| r - 1.0)),
        high,
        low,
        average_volume: mean(&volumes).unwrap_or(0.0),
        total_return: ratio(last.close, first.close).map(|r| r - 1.0),
        risk: RiskMetrics::from_returns(&enriched.returns(), config),
    })
}

pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    mean(returns).map(|m| m * periods_per_year).unwrap_or(0.0)
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns)
        .and_then(|s| finite(s * periods_per_year.sqrt()))
        .unwrap_or(0.0)
}

/// (annualized mean - rf) / annualized volatility; 0.0 when volatility is 0.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let excess = annualized_return(returns, periods_per_year) - risk_free_rate;
    ratio(excess, annualized_volatility(returns, periods_per_year)).unwrap_or(0.0)
}

/// Like Sharpe, but the denominator is the annualized deviation of negative returns only.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_deviation = annualized_volatility(&downside, periods_per_year);
    let excess = annualized_return(returns, periods_per_year) - risk_free_rate;
    ratio(excess, downside_deviation).unwrap_or(0.0)
}

/// Largest peak-to-trough decline of the compounded growth curve, as a
/// non-positive fraction.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut growth = 1.0;
    let mut peak: Option<f64> = None;
    let mut worst = 0.0_f64;

    for r in returns {
        growth *= 1.0 + r;
        let running_max = peak.map_or(growth, |p| p.max(growth));
        peak = Some(running_max);
        if let Some(dd) = ratio(growth - running_max, running_max) {
            worst = worst.min(dd);
        }
    }
    worst
}

pub fn calmar_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    ratio(annualized_return(returns, periods_per_year), max_drawdown(returns).abs())
        .unwrap_or(0.0)
}

/// The `(1 - confidence)` quantile, linearly interpolated between order statistics.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q = (1.0 - confidence).clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    finite(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Mean of the returns at or below the VaR threshold.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    let threshold = value_at_risk(returns, confidence)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    mean(&tail)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingMetrics {
    pub window: usize,
    /// Sum of returns over the window.
    pub rolling_return: Vec<Option<f64>>,
    pub rolling_volatility: Vec<Option<f64>>,
    /// No value where the window's volatility is 0.
    pub rolling_sharpe: Vec<Option<f64>>,
}

pub fn rolling_metrics(
    enriched: &EnrichedSeries,
    window: usize,
    periods_per_year: f64,
) -> RollingMetrics {
    let returns: Vec<Option<f64>> = enriched
        .column(IndicatorType::DailyReturn)
        .map(<[Option<f64>]>::to_vec)
        .unwrap_or_else(|| vec![None; enriched.len()]);

    let factor = periods_per_year.sqrt();
    let rolling_return = rolling_sum(&returns, window);
    let rolling_volatility: Vec<Option<f64>> = rolling_sample_std(&returns, window)
        .into_iter()
        .map(|s| s.and_then(|s| finite(s * factor)))
        .collect();
    let rolling_sharpe = rolling_mean(&returns, window)
        .into_iter()
        .zip(&rolling_volatility)
        .map(|(m, v)| match (m, v) {
            (Some(m), Some(v)) => ratio(m * periods_per_year, *v),
            _ => None,
        })
        .collect();

    RollingMetrics {
        window,
        rolling_return,
        rolling_volatility,
        rolling_sharpe,
    }
}
