//! Market data access port trait.

use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::Series;
use crate::domain::resample::{Interval, resample};
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` with `start <= date <= end`.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Series, MarketlensError>;

    fn list_symbols(&self) -> Result<Vec<String>, MarketlensError>;

    /// First date, last date and bar count, or `None` when the symbol has no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError>;

    /// Bars at the requested interval, resampled from the daily source.
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<Series, MarketlensError> {
        let daily = self.fetch_bars(symbol, start_date, end_date)?;
        resample(&daily, interval)
    }
}
