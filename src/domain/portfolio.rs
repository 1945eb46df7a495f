//! Multi-asset aggregation: weighted portfolio returns, correlation and beta.
//!
//! Assets are passed as an ordered slice of `(name, EnrichedSeries)` so that
//! matrix rows and report columns follow the watchlist order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::enriched::EnrichedSeries;
use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::{mean, negligible, ratio, sample_covariance};
use crate::domain::metrics::{MetricsConfig, RiskMetrics};

pub const DEFAULT_MARKET: &str = "S&P 500";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    /// Name of the asset treated as the market when computing beta.
    pub market: String,
    pub metrics: MetricsConfig,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            market: DEFAULT_MARKET.to_string(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Daily returns of several assets restricted to the dates where all of them
/// have a value.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturns {
    pub dates: Vec<NaiveDate>,
    pub names: Vec<String>,
    /// One column per name, each `dates.len()` long.
    pub columns: Vec<Vec<f64>>,
}

impl AlignedReturns {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, symmetric. Off-diagonal cells have no value when either
    /// asset's returns have zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PortfolioMetrics {
    /// Normalized weights, summing to 1.
    pub weights: BTreeMap<String, f64>,
    pub dates: Vec<NaiveDate>,
    pub portfolio_returns: Vec<f64>,
    /// Compounded return over the aligned period, as a fraction.
    pub total_return: f64,
    pub risk: RiskMetrics,
    pub correlation: CorrelationMatrix,
    /// `None` when the market asset is absent or has zero variance.
    pub beta: Option<f64>,
}

/// Resolves the weight of every asset and scales them to sum to 1.
///
/// Without explicit weights every asset gets `1/N`. Assets missing from the
/// mapping get 0; keys that name no asset are ignored with a warning.
pub fn normalize_weights(
    names: &[String],
    weights: Option<&HashMap<String, f64>>,
) -> Result<BTreeMap<String, f64>, MarketlensError> {
    let Some(weights) = weights else {
        let n = names.len() as f64;
        return Ok(names.iter().map(|name| (name.clone(), 1.0 / n)).collect());
    };

    for (asset, &w) in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(MarketlensError::InvalidWeight {
                asset: asset.clone(),
                reason: format!("weight must be a non-negative number, got {}", w),
            });
        }
        if !names.contains(asset) {
            warn!(asset = %asset, "weight given for unknown asset, ignoring");
        }
    }

    let raw: Vec<(String, f64)> = names
        .iter()
        .map(|name| (name.clone(), weights.get(name).copied().unwrap_or(0.0)))
        .collect();
    let sum: f64 = raw.iter().map(|(_, w)| w).sum();
    if sum <= 0.0 {
        return Err(MarketlensError::InvalidWeight {
            asset: names.join(","),
            reason: "weights sum to zero".to_string(),
        });
    }
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        warn!(sum, "weights do not sum to 1, normalizing");
    }

    Ok(raw.into_iter().map(|(name, w)| (name, w / sum)).collect())
}

/// Parses `"Apple=2, S&P 500=1"` into a weight mapping. Values are checked
/// for sign and finiteness here; normalization happens later.
pub fn parse_weights(input: &str) -> Result<HashMap<String, f64>, MarketlensError> {
    let mut weights = HashMap::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (asset, value) = token
            .rsplit_once('=')
            .ok_or_else(|| MarketlensError::InvalidWeight {
                asset: token.to_string(),
                reason: "expected NAME=WEIGHT".to_string(),
            })?;
        let asset = asset.trim().to_string();
        let weight: f64 = value
            .trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| MarketlensError::InvalidWeight {
                asset: asset.clone(),
                reason: e.to_string(),
            })?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(MarketlensError::InvalidWeight {
                asset,
                reason: format!("weight must be a non-negative number, got {}", weight),
            });
        }
        if weights.insert(asset.clone(), weight).is_some() {
            return Err(MarketlensError::InvalidWeight {
                asset,
                reason: "weight given twice".to_string(),
            });
        }
    }
    Ok(weights)
}

/// Intersects the assets' defined daily returns on date.
pub fn align_returns(assets: &[(String, EnrichedSeries)]) -> AlignedReturns {
    let by_date: Vec<HashMap<NaiveDate, f64>> = assets
        .iter()
        .map(|(_, enriched)| {
            let returns = enriched.column(IndicatorType::DailyReturn).unwrap_or(&[]);
            enriched
                .dates()
                .into_iter()
                .zip(returns)
                .filter_map(|(d, r)| r.map(|r| (d, r)))
                .collect()
        })
        .collect();

    let mut common: BTreeSet<NaiveDate> = by_date
        .first()
        .map(|m| m.keys().copied().collect())
        .unwrap_or_default();
    for m in by_date.iter().skip(1) {
        common.retain(|d| m.contains_key(d));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let columns = by_date
        .iter()
        .map(|m| dates.iter().filter_map(|d| m.get(d).copied()).collect())
        .collect();

    AlignedReturns {
        dates,
        names: assets.iter().map(|(name, _)| name.clone()).collect(),
        columns,
    }
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let ma = mean(a)?;
    let mb = mean(b)?;

    let mut numer = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - ma;
        let dy = y - mb;
        numer += dx * dy;
        denom_a += dx * dx;
        denom_b += dy * dy;
    }

    ratio(numer, (denom_a * denom_b).sqrt()).map(|r| r.clamp(-1.0, 1.0))
}

pub fn correlation_matrix(aligned: &AlignedReturns) -> CorrelationMatrix {
    let n = aligned.names.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&aligned.columns[i], &aligned.columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        labels: aligned.names.clone(),
        values,
    }
}

/// cov(weighted non-market returns, market returns) / var(market returns).
pub fn portfolio_beta(
    aligned: &AlignedReturns,
    weights: &BTreeMap<String, f64>,
    market: &str,
) -> Option<f64> {
    let Some(market_returns) = aligned.column(market) else {
        warn!(market = %market, "market asset not in portfolio, beta undefined");
        return None;
    };

    let mut blended = vec![0.0; aligned.dates.len()];
    for (name, column) in aligned.names.iter().zip(&aligned.columns) {
        if name == market {
            continue;
        }
        let w = weights.get(name).copied().unwrap_or(0.0);
        for (acc, r) in blended.iter_mut().zip(column) {
            *acc += w * r;
        }
    }

    let covariance = sample_covariance(&blended, market_returns)?;
    let variance = sample_covariance(market_returns, market_returns)?;
    if negligible(variance.sqrt(), mean(market_returns)?, market_returns.len()) {
        return None;
    }
    ratio(covariance, variance)
}

/// Aggregates the assets into one weighted portfolio.
///
/// Returns `Ok(None)` when there are no assets or no date survives alignment;
/// invalid weights are an error.
pub fn calculate_portfolio_metrics(
    assets: &[(String, EnrichedSeries)],
    weights: Option<&HashMap<String, f64>>,
    config: &PortfolioConfig,
) -> Result<Option<PortfolioMetrics>, MarketlensError> {
    if assets.is_empty() {
        warn!("no assets given, portfolio metrics undefined");
        return Ok(None);
    }

    let names: Vec<String> = assets.iter().map(|(name, _)| name.clone()).collect();
    let weights = normalize_weights(&names, weights)?;

    let aligned = align_returns(assets);
    if aligned.is_empty() {
        warn!("no common dates with returns for every asset");
        return Ok(None);
    }

    let mut portfolio_returns = vec![0.0; aligned.dates.len()];
    for (name, column) in aligned.names.iter().zip(&aligned.columns) {
        let w = weights.get(name).copied().unwrap_or(0.0);
        for (acc, r) in portfolio_returns.iter_mut().zip(column) {
            *acc += w * r;
        }
    }

    let total_return = portfolio_returns.iter().fold(1.0, |g, r| g * (1.0 + r)) - 1.0;
    let risk = RiskMetrics::from_returns(&portfolio_returns, &config.metrics);
    let correlation = correlation_matrix(&aligned);
    let beta = portfolio_beta(&aligned, &weights, &config.market);

    Ok(Some(PortfolioMetrics {
        weights,
        dates: aligned.dates,
        portfolio_returns,
        total_return,
        risk,
        correlation,
        beta,
    }))
}
