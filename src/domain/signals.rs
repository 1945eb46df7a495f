//! Discrete directional signals derived from indicator columns.
//!
//! Each flag is independent and computed from the current bar only; a comparison
//! involving a missing value is neutral. Crossovers compare the ordering of two
//! columns at `i-1` and `i`.

use std::fmt;
use std::str::FromStr;

use crate::domain::enriched::EnrichedSeries;
use crate::domain::indicator::{IndicatorType, UnknownIndicator};
use crate::domain::indicator::rsi::{OVERBOUGHT, OVERSOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Level {
    Oversold,
    Overbought,
    Neutral,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
        }
    }
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Oversold => "oversold",
            Level::Overbought => "overbought",
            Level::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed name of a per-bar signal column on an enriched series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalColumn {
    Ma,
    Rsi,
    Macd,
    Bollinger,
}

impl SignalColumn {
    pub const ALL: &'static [SignalColumn] = &[
        SignalColumn::Ma,
        SignalColumn::Rsi,
        SignalColumn::Macd,
        SignalColumn::Bollinger,
    ];
}

impl fmt::Display for SignalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalColumn::Ma => write!(f, "ma_signal"),
            SignalColumn::Rsi => write!(f, "rsi_signal"),
            SignalColumn::Macd => write!(f, "macd_signal_flag"),
            SignalColumn::Bollinger => write!(f, "bb_signal"),
        }
    }
}

impl FromStr for SignalColumn {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_signal" => Ok(SignalColumn::Ma),
            "rsi_signal" => Ok(SignalColumn::Rsi),
            "macd_signal_flag" => Ok(SignalColumn::Macd),
            "bb_signal" => Ok(SignalColumn::Bollinger),
            _ => Err(UnknownIndicator(s.to_string())),
        }
    }
}

/// Signal flags for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BarSignals {
    /// Short MA vs medium MA.
    pub ma: Trend,
    pub rsi: Level,
    /// MACD line vs its signal line.
    pub macd: Trend,
    /// Close below the lower band is oversold, above the upper band overbought.
    pub bollinger: Level,
}

impl BarSignals {
    /// The flag stored under `column`.
    pub fn label(&self, column: SignalColumn) -> &'static str {
        match column {
            SignalColumn::Ma => self.ma.as_str(),
            SignalColumn::Rsi => self.rsi.as_str(),
            SignalColumn::Macd => self.macd.as_str(),
            SignalColumn::Bollinger => self.bollinger.as_str(),
        }
    }
}

/// A change of ordering between two columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Crossover {
    /// Short moved from below to above long.
    Bullish,
    /// Short moved from above to below long.
    Bearish,
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crossover::Bullish => write!(f, "bullish crossover"),
            Crossover::Bearish => write!(f, "bearish crossover"),
        }
    }
}

fn compare(a: Option<f64>, b: Option<f64>) -> Trend {
    match (a, b) {
        (Some(a), Some(b)) if a > b => Trend::Bullish,
        (Some(a), Some(b)) if a < b => Trend::Bearish,
        _ => Trend::Neutral,
    }
}

pub fn rsi_level(rsi: Option<f64>) -> Level {
    match rsi {
        Some(v) if v < OVERSOLD => Level::Oversold,
        Some(v) if v > OVERBOUGHT => Level::Overbought,
        _ => Level::Neutral,
    }
}

pub fn band_level(close: f64, lower: Option<f64>, upper: Option<f64>) -> Level {
    match (lower, upper) {
        (Some(l), _) if close < l => Level::Oversold,
        (_, Some(u)) if close > u => Level::Overbought,
        _ => Level::Neutral,
    }
}

/// Classifies every bar of an enriched series.
pub fn classify(enriched: &EnrichedSeries) -> Vec<BarSignals> {
    let params = enriched.params();
    let short = IndicatorType::Sma(params.ma_short);
    let medium = IndicatorType::Sma(params.ma_medium);

    enriched
        .closes()
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let v = |t: IndicatorType| enriched.value(t, i);
            BarSignals {
                ma: compare(v(short), v(medium)),
                rsi: rsi_level(v(IndicatorType::Rsi)),
                macd: compare(v(IndicatorType::Macd), v(IndicatorType::MacdSignal)),
                bollinger: band_level(
                    close,
                    v(IndicatorType::BbLower),
                    v(IndicatorType::BbUpper),
                ),
            }
        })
        .collect()
}

/// Crossover between bar `i-1` and bar `i`. Needs both columns defined at both
/// bars; anything less yields no event.
pub fn detect_crossover(
    short: &[Option<f64>],
    long: &[Option<f64>],
    i: usize,
) -> Option<Crossover> {
    if i == 0 {
        return None;
    }
    let prev_short = (*short.get(i - 1)?)?;
    let prev_long = (*long.get(i - 1)?)?;
    let cur_short = (*short.get(i)?)?;
    let cur_long = (*long.get(i)?)?;

    if prev_short < prev_long && cur_short > cur_long {
        Some(Crossover::Bullish)
    } else if prev_short > prev_long && cur_short < cur_long {
        Some(Crossover::Bearish)
    } else {
        None
    }
}

/// Every crossover event as `(bar index, direction)`.
pub fn crossovers(short: &[Option<f64>], long: &[Option<f64>]) -> Vec<(usize, Crossover)> {
    let n = short.len().min(long.len());
    (1..n)
        .filter_map(|i| detect_crossover(short, long, i).map(|c| (i, c)))
        .collect()
}
