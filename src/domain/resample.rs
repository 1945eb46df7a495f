//! Resampling daily bars to coarser intervals.
//!
//! A bucket's bar takes the first open, the highest high, the lowest low, the
//! last close and the summed volume, and is dated at its last daily bar.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;

use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::{Bar, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Weekly => write!(f, "weekly"),
            Interval::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Interval {
    type Err = MarketlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "1d" => Ok(Interval::Daily),
            "weekly" | "1wk" => Ok(Interval::Weekly),
            "monthly" | "1mo" => Ok(Interval::Monthly),
            other => Err(MarketlensError::config_invalid(
                "data",
                "interval",
                format!("expected daily, weekly or monthly, got '{}'", other),
            )),
        }
    }
}

impl Interval {
    /// Bucket identity of a date: ISO (year, week) or (year, month).
    fn bucket(self, bar: &Bar) -> (i32, u32) {
        match self {
            Interval::Daily => (bar.date.year(), bar.date.ordinal()),
            Interval::Weekly => {
                let week = bar.date.iso_week();
                (week.year(), week.week())
            }
            Interval::Monthly => (bar.date.year(), bar.date.month()),
        }
    }
}

pub fn resample(series: &Series, interval: Interval) -> Result<Series, MarketlensError> {
    if interval == Interval::Daily {
        return Ok(series.clone());
    }

    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<((i32, u32), Bar)> = None;

    for bar in series.bars() {
        let key = interval.bucket(bar);
        current = match current.take() {
            Some((k, mut agg)) if k == key => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
                agg.date = bar.date;
                Some((k, agg))
            }
            Some((_, done)) => {
                out.push(done);
                Some((key, bar.clone()))
            }
            None => Some((key, bar.clone())),
        };
    }
    if let Some((_, last)) = current {
        out.push(last);
    }

    Series::new(out)
}
