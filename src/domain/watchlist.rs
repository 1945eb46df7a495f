//! Watchlist of named instruments.
//!
//! Parses `Name=SYMBOL` lists from configuration, loads each asset through a
//! `DataPort` (skipping the ones that fail), and enriches them in parallel.

use crate::domain::enriched::{EnrichedSeries, enrich};
use crate::domain::indicator::IndicatorParams;
use crate::domain::ohlcv::Series;
use crate::domain::resample::Interval;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    /// Display name, also the asset key in portfolio and comparison output.
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in watchlist")]
    EmptyToken,

    #[error("missing symbol for watchlist entry '{0}'")]
    MissingSymbol(String),

    #[error("duplicate watchlist name: {0}")]
    DuplicateName(String),
}

/// Parses `"Apple=AAPL, S&P 500=^GSPC"`. A bare token is both name and symbol.
pub fn parse_watchlist(input: &str) -> Result<Vec<WatchlistEntry>, WatchlistError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }

        let (name, symbol) = match trimmed.split_once('=') {
            Some((name, symbol)) => (name.trim(), symbol.trim()),
            None => (trimmed, trimmed),
        };
        if name.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        if symbol.is_empty() {
            return Err(WatchlistError::MissingSymbol(name.to_string()));
        }
        if !seen.insert(name.to_string()) {
            return Err(WatchlistError::DuplicateName(name.to_string()));
        }

        entries.push(WatchlistEntry {
            name: name.to_string(),
            symbol: symbol.to_uppercase(),
        });
    }

    Ok(entries)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAsset {
    pub entry: WatchlistEntry,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct LoadedWatchlist {
    /// Successfully loaded assets, in watchlist order.
    pub assets: Vec<(String, Series)>,
    pub skipped: Vec<SkippedAsset>,
}

pub fn load_watchlist(
    data_port: &dyn DataPort,
    entries: &[WatchlistEntry],
    start_date: NaiveDate,
    end_date: NaiveDate,
    interval: Interval,
) -> LoadedWatchlist {
    let mut assets = Vec::new();
    let mut skipped = Vec::new();

    for entry in entries {
        let series = match data_port.fetch_series(&entry.symbol, start_date, end_date, interval) {
            Ok(series) => series,
            Err(e) => {
                warn!(name = %entry.name, symbol = %entry.symbol, error = %e, "skipping asset");
                skipped.push(SkippedAsset {
                    entry: entry.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        if series.is_empty() {
            warn!(name = %entry.name, symbol = %entry.symbol, "skipping asset with no data");
            skipped.push(SkippedAsset {
                entry: entry.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        info!(name = %entry.name, bars = series.len(), "loaded");
        assets.push((entry.name.clone(), series));
    }

    LoadedWatchlist { assets, skipped }
}

/// Enriches every asset in parallel, preserving order.
pub fn enrich_all(
    assets: &[(String, Series)],
    params: &IndicatorParams,
) -> Vec<(String, EnrichedSeries)> {
    assets
        .par_iter()
        .map(|(name, series)| (name.clone(), enrich(series, params)))
        .collect()
}
