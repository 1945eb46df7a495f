//! Side-by-side comparison of watchlist assets.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::enriched::EnrichedSeries;
use crate::domain::error::MarketlensError;
use crate::domain::metrics::{MetricsConfig, summary_statistics};
use crate::domain::portfolio::{CorrelationMatrix, align_returns, correlation_matrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    TotalReturn,
    Volatility,
    Sharpe,
    MaxDrawdown,
    Price,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::TotalReturn => write!(f, "total-return"),
            SortKey::Volatility => write!(f, "volatility"),
            SortKey::Sharpe => write!(f, "sharpe"),
            SortKey::MaxDrawdown => write!(f, "max-drawdown"),
            SortKey::Price => write!(f, "price"),
        }
    }
}

impl FromStr for SortKey {
    type Err = MarketlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "total-return" => Ok(SortKey::TotalReturn),
            "volatility" => Ok(SortKey::Volatility),
            "sharpe" | "sharpe-ratio" => Ok(SortKey::Sharpe),
            "max-drawdown" => Ok(SortKey::MaxDrawdown),
            "price" | "current-price" => Ok(SortKey::Price),
            other => Err(MarketlensError::config_invalid(
                "compare",
                "sort_by",
                format!("unknown sort key '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ComparisonRow {
    pub asset: String,
    pub total_return: Option<f64>,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub current_price: f64,
}

impl ComparisonRow {
    fn key(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::TotalReturn => self.total_return,
            SortKey::Volatility => Some(self.volatility),
            SortKey::Sharpe => Some(self.sharpe_ratio),
            SortKey::MaxDrawdown => Some(self.max_drawdown),
            SortKey::Price => Some(self.current_price),
        }
    }
}

/// One row per asset with bars, sorted descending by `sort_key`. Rows whose key
/// has no value sort last.
pub fn compare_assets(
    assets: &[(String, EnrichedSeries)],
    sort_key: SortKey,
    config: &MetricsConfig,
) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = assets
        .iter()
        .filter_map(|(name, enriched)| {
            let stats = summary_statistics(enriched, config)?;
            Some(ComparisonRow {
                asset: name.clone(),
                total_return: stats.total_return,
                volatility: stats.risk.annualized_volatility,
                sharpe_ratio: stats.risk.sharpe_ratio,
                max_drawdown: stats.risk.max_drawdown,
                current_price: stats.current_price,
            })
        })
        .collect();

    rows.sort_by(|a, b| match (a.key(sort_key), b.key(sort_key)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

/// Pairwise return correlation across the assets, unweighted.
pub fn correlation_summary(assets: &[(String, EnrichedSeries)]) -> CorrelationMatrix {
    correlation_matrix(&align_returns(assets))
}
