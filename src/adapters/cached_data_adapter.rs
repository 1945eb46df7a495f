//! TTL cache in front of any `DataPort`.
//!
//! Entries are keyed by symbol, date range and interval, so a weekly request
//! never returns cached daily bars. A TTL of zero disables caching.

use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::Series;
use crate::domain::resample::Interval;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

type CacheKey = (String, NaiveDate, NaiveDate, Interval);

pub struct CachedDataAdapter<P: DataPort> {
    inner: P,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, (Instant, Series)>>,
}

impl<P: DataPort> CachedDataAdapter<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drops every cached entry; the next request goes to the wrapped port.
    pub fn clear(&self) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("data cache lock poisoned during clear, recovering");
                poisoned.into_inner()
            }
        };
        entries.clear();
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<Series> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("data cache lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        };
        entries
            .get(key)
            .filter(|(cached_at, _)| cached_at.elapsed() < self.ttl)
            .map(|(_, series)| series.clone())
    }

    fn store(&self, key: CacheKey, series: &Series) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("data cache lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        entries.retain(|_, (cached_at, _)| cached_at.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), series.clone()));
    }
}

impl<P: DataPort> DataPort for CachedDataAdapter<P> {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Series, MarketlensError> {
        self.fetch_series(symbol, start_date, end_date, Interval::Daily)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MarketlensError> {
        self.inner.list_symbols()
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError> {
        self.inner.get_data_range(symbol)
    }

    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<Series, MarketlensError> {
        let key = (symbol.to_string(), start_date, end_date, interval);
        if let Some(series) = self.lookup(&key) {
            debug!(symbol, %interval, "cache hit");
            return Ok(series);
        }

        debug!(symbol, %interval, "cache miss");
        let series = self
            .inner
            .fetch_series(symbol, start_date, end_date, interval)?;
        self.store(key, &series);
        Ok(series)
    }
}
