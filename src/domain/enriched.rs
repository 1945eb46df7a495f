//! Series enriched with derived indicator columns.
//!
//! `enrich` is the indicator engine's single entry point: it runs every indicator
//! over one validated `Series` and stores the results keyed by `IndicatorType`.
//! The source series is cloned into the result, never modified.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::macd::macd_from_emas;
use crate::domain::indicator::returns::{calculate_cumulative_returns, calculate_daily_returns};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stochastic::calculate_stochastic;
use crate::domain::indicator::volatility::calculate_volatility;
use crate::domain::indicator::{IndicatorParams, IndicatorType};
use crate::domain::ohlcv::Series;
use crate::domain::signals::{self, BarSignals, SignalColumn};

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    series: Series,
    params: IndicatorParams,
    columns: HashMap<IndicatorType, Vec<Option<f64>>>,
    signals: Option<Vec<BarSignals>>,
}

impl EnrichedSeries {
    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.series.dates()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.series.closes()
    }

    /// The full column, or `None` if this enrichment pass did not produce it.
    pub fn column(&self, indicator: IndicatorType) -> Option<&[Option<f64>]> {
        self.columns.get(&indicator).map(Vec::as_slice)
    }

    pub fn has(&self, indicator: IndicatorType) -> bool {
        self.columns.contains_key(&indicator)
    }

    /// A single cell; `None` when the column is absent, the index is out of range,
    /// or the cell has no value.
    pub fn value(&self, indicator: IndicatorType, index: usize) -> Option<f64> {
        self.columns
            .get(&indicator)
            .and_then(|col| col.get(index).copied().flatten())
    }

    pub fn latest(&self, indicator: IndicatorType) -> Option<f64> {
        self.len()
            .checked_sub(1)
            .and_then(|last| self.value(indicator, last))
    }

    /// Defined daily returns in bar order.
    pub fn returns(&self) -> Vec<f64> {
        self.column(IndicatorType::DailyReturn)
            .map(|col| col.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Every produced column, ordered by indicator type.
    pub fn column_names(&self) -> Vec<IndicatorType> {
        let mut names: Vec<IndicatorType> = self.columns.keys().copied().collect();
        names.sort();
        names
    }

    /// Attaches the per-bar signal flags.
    pub fn with_signals(mut self) -> Self {
        self.signals = Some(signals::classify(&self));
        self
    }

    pub fn signals(&self) -> Option<&[BarSignals]> {
        self.signals.as_deref()
    }

    /// Signal columns present on this series; empty until `with_signals`.
    pub fn signal_column_names(&self) -> &'static [SignalColumn] {
        if self.signals.is_some() {
            SignalColumn::ALL
        } else {
            &[]
        }
    }

    /// One signal cell by column; `None` without signals or out of range.
    pub fn signal(&self, column: SignalColumn, index: usize) -> Option<&'static str> {
        self.signals
            .as_ref()
            .and_then(|s| s.get(index))
            .map(|bar| bar.label(column))
    }
}

pub fn enrich(series: &Series, params: &IndicatorParams) -> EnrichedSeries {
    let closes = series.closes();
    let bars = series.bars();
    let mut columns = HashMap::new();

    let daily = calculate_daily_returns(&closes);
    columns.insert(
        IndicatorType::CumulativeReturn,
        calculate_cumulative_returns(&daily),
    );

    for window in params.ma_windows() {
        columns.insert(IndicatorType::Sma(window), calculate_sma(&closes, window));
    }

    let ema_fast = calculate_ema(&closes, params.ema_fast);
    let ema_slow = calculate_ema(&closes, params.ema_slow);
    let macd = macd_from_emas(&ema_fast, &ema_slow, params.macd_signal);
    columns.insert(IndicatorType::Ema(params.ema_fast), ema_fast);
    columns.insert(IndicatorType::Ema(params.ema_slow), ema_slow);
    columns.insert(IndicatorType::Macd, macd.line);
    columns.insert(IndicatorType::MacdSignal, macd.signal);
    columns.insert(IndicatorType::MacdHistogram, macd.histogram);

    let bands = calculate_bollinger(
        &closes,
        params.bollinger_period,
        params.bollinger_multiplier,
    );
    columns.insert(IndicatorType::BbMiddle, bands.middle);
    columns.insert(IndicatorType::BbStd, bands.std);
    columns.insert(IndicatorType::BbUpper, bands.upper);
    columns.insert(IndicatorType::BbLower, bands.lower);
    columns.insert(IndicatorType::BbWidth, bands.width);
    columns.insert(IndicatorType::BbPercent, bands.percent);

    columns.insert(IndicatorType::Rsi, calculate_rsi(&closes, params.rsi_period));
    columns.insert(IndicatorType::Atr, calculate_atr(bars, params.atr_period));

    for window in params.volatility_windows() {
        columns.insert(
            IndicatorType::Volatility(window),
            calculate_volatility(&daily, window, params.periods_per_year),
        );
    }

    let stoch = calculate_stochastic(bars, params.stochastic_k, params.stochastic_d);
    columns.insert(IndicatorType::StochasticK, stoch.k);
    columns.insert(IndicatorType::StochasticD, stoch.d);

    columns.insert(IndicatorType::DailyReturn, daily);

    EnrichedSeries {
        series: series.clone(),
        params: params.clone(),
        columns,
        signals: None,
    }
}
