//! Alerts on the latest bar of an enriched series.
//!
//! Alerts are typed values; their `Display` output is the text shown to users.

use std::fmt;

use crate::domain::enriched::EnrichedSeries;
use crate::domain::indicator::IndicatorType;
use crate::domain::signals::{Crossover, detect_crossover};

pub const DEFAULT_PRICE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_VOLATILITY_THRESHOLD: f64 = 0.03;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    /// Absolute daily return that triggers a jump or drop alert.
    pub price: f64,
    /// Intrabar range `(high - low) / open` above which the bar is flagged.
    pub volatility: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            price: DEFAULT_PRICE_THRESHOLD,
            volatility: DEFAULT_VOLATILITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AlertKind {
    PriceJump { change: f64 },
    PriceDrop { change: f64 },
    MaCrossover(Crossover),
    HighVolatility { range: f64 },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Alert {
    pub asset: String,
    pub kind: AlertKind,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AlertKind::PriceJump { change } => {
                write!(f, "{} jumped {:.2}% today", self.asset, change * 100.0)
            }
            AlertKind::PriceDrop { change } => {
                write!(f, "{} dropped {:.2}% today", self.asset, change * 100.0)
            }
            AlertKind::MaCrossover(Crossover::Bullish) => write!(
                f,
                "bullish crossover detected on {}, potential upward trend",
                self.asset
            ),
            AlertKind::MaCrossover(Crossover::Bearish) => write!(
                f,
                "bearish crossover detected on {}, possible trend reversal",
                self.asset
            ),
            AlertKind::HighVolatility { range } => write!(
                f,
                "{} showed high volatility today ({:.2}%)",
                self.asset,
                range * 100.0
            ),
        }
    }
}

pub fn price_alert(enriched: &EnrichedSeries, asset: &str, threshold: f64) -> Option<Alert> {
    let change = enriched.latest(IndicatorType::DailyReturn)?;
    let kind = if change >= threshold {
        AlertKind::PriceJump { change }
    } else if change <= -threshold {
        AlertKind::PriceDrop { change }
    } else {
        return None;
    };
    Some(Alert {
        asset: asset.to_string(),
        kind,
    })
}

/// Crossover of the short MA over the medium MA on the latest bar.
pub fn crossover_alert(enriched: &EnrichedSeries, asset: &str) -> Option<Alert> {
    let params = enriched.params();
    let short = enriched.column(IndicatorType::Sma(params.ma_short))?;
    let long = enriched.column(IndicatorType::Sma(params.ma_medium))?;
    let last = enriched.len().checked_sub(1)?;

    detect_crossover(short, long, last).map(|c| Alert {
        asset: asset.to_string(),
        kind: AlertKind::MaCrossover(c),
    })
}

pub fn volatility_alert(enriched: &EnrichedSeries, asset: &str, threshold: f64) -> Option<Alert> {
    let range = enriched.series().last()?.range_ratio()?;
    (range > threshold).then(|| Alert {
        asset: asset.to_string(),
        kind: AlertKind::HighVolatility { range },
    })
}

pub fn generate_alerts(
    enriched: &EnrichedSeries,
    asset: &str,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    [
        price_alert(enriched, asset, thresholds.price),
        crossover_alert(enriched, asset),
        volatility_alert(enriched, asset, thresholds.volatility),
    ]
    .into_iter()
    .flatten()
    .collect()
}
