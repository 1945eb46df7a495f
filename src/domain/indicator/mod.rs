//! Technical indicator implementations.
//!
//! Each submodule computes one family of derived columns from plain slices and
//! returns `Vec<Option<f64>>` aligned index-for-index with its input; `None` is the
//! "no value" marker for warmup bars and degenerate arithmetic.
//!
//! - `IndicatorType`: identity of a derived column, used as the lookup key and
//!   rendered to the fixed column name a presentation layer looks up
//! - `IndicatorParams`: the window/period parameters for one enrichment pass

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volatility;

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    DailyReturn,
    CumulativeReturn,
    Sma(usize),
    Ema(usize),
    Macd,
    MacdSignal,
    MacdHistogram,
    BbMiddle,
    BbStd,
    BbUpper,
    BbLower,
    BbWidth,
    BbPercent,
    Rsi,
    Atr,
    Volatility(usize),
    StochasticK,
    StochasticD,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::DailyReturn => write!(f, "daily_return"),
            IndicatorType::CumulativeReturn => write!(f, "cumulative_return"),
            IndicatorType::Sma(window) => write!(f, "ma_{}", window),
            IndicatorType::Ema(span) => write!(f, "ema_{}", span),
            IndicatorType::Macd => write!(f, "macd"),
            IndicatorType::MacdSignal => write!(f, "macd_signal"),
            IndicatorType::MacdHistogram => write!(f, "macd_histogram"),
            IndicatorType::BbMiddle => write!(f, "bb_middle"),
            IndicatorType::BbStd => write!(f, "bb_std"),
            IndicatorType::BbUpper => write!(f, "bb_upper"),
            IndicatorType::BbLower => write!(f, "bb_lower"),
            IndicatorType::BbWidth => write!(f, "bb_width"),
            IndicatorType::BbPercent => write!(f, "bb_percent"),
            IndicatorType::Rsi => write!(f, "rsi"),
            IndicatorType::Atr => write!(f, "atr"),
            IndicatorType::Volatility(window) => write!(f, "volatility_{}", window),
            IndicatorType::StochasticK => write!(f, "stochastic_k"),
            IndicatorType::StochasticD => write!(f, "stochastic_d"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator column: {0}")]
pub struct UnknownIndicator(pub String);

impl FromStr for IndicatorType {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let fixed = match name.as_str() {
            "daily_return" => Some(IndicatorType::DailyReturn),
            "cumulative_return" => Some(IndicatorType::CumulativeReturn),
            "macd" => Some(IndicatorType::Macd),
            "macd_signal" => Some(IndicatorType::MacdSignal),
            "macd_histogram" => Some(IndicatorType::MacdHistogram),
            "bb_middle" => Some(IndicatorType::BbMiddle),
            "bb_std" => Some(IndicatorType::BbStd),
            "bb_upper" => Some(IndicatorType::BbUpper),
            "bb_lower" => Some(IndicatorType::BbLower),
            "bb_width" => Some(IndicatorType::BbWidth),
            "bb_percent" => Some(IndicatorType::BbPercent),
            "rsi" => Some(IndicatorType::Rsi),
            "atr" => Some(IndicatorType::Atr),
            "stochastic_k" => Some(IndicatorType::StochasticK),
            "stochastic_d" => Some(IndicatorType::StochasticD),
            _ => None,
        };
        if let Some(t) = fixed {
            return Ok(t);
        }

        let windowed = |prefix: &str| -> Option<usize> {
            name.strip_prefix(prefix)
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n > 0)
        };
        if let Some(n) = windowed("ma_") {
            Ok(IndicatorType::Sma(n))
        } else if let Some(n) = windowed("ema_") {
            Ok(IndicatorType::Ema(n))
        } else if let Some(n) = windowed("volatility_") {
            Ok(IndicatorType::Volatility(n))
        } else {
            Err(UnknownIndicator(s.to_string()))
        }
    }
}

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Window and period parameters for one enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_medium: usize,
    pub ma_long: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub volatility_short: usize,
    pub volatility_long: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub periods_per_year: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 20,
            ma_medium: 50,
            ma_long: 200,
            ema_fast: macd::DEFAULT_FAST,
            ema_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_multiplier: bollinger::DEFAULT_MULTIPLIER,
            rsi_period: rsi::DEFAULT_PERIOD,
            atr_period: atr::DEFAULT_PERIOD,
            volatility_short: 20,
            volatility_long: 50,
            stochastic_k: stochastic::DEFAULT_K_PERIOD,
            stochastic_d: stochastic::DEFAULT_D_PERIOD,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl IndicatorParams {
    pub fn ma_windows(&self) -> [usize; 3] {
        [self.ma_short, self.ma_medium, self.ma_long]
    }

    pub fn volatility_windows(&self) -> [usize; 2] {
        [self.volatility_short, self.volatility_long]
    }
}
