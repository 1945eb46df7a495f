//! CSV file data adapter.
//!
//! One `<SYMBOL>.csv` per instrument with a `date,open,high,low,close,volume`
//! header. Columns are located by header name, so extra columns (such as an
//! `adj_close`) and reordered files are accepted.

use crate::domain::enriched::EnrichedSeries;
use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::{Bar, Series};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Builds the adapter from `[data] dir`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MarketlensError> {
        let dir = config
            .get_string("data", "dir")
            .ok_or_else(|| MarketlensError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            })?;
        Ok(Self::new(PathBuf::from(dir.trim())))
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, MarketlensError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| MarketlensError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let source_name = path.display().to_string();
        parse_bars(&content, &source_name)
    }
}

/// Parses an OHLCV table. Rows are returned in file order.
pub fn parse_bars(content: &str, source_name: &str) -> Result<Vec<Bar>, MarketlensError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| MarketlensError::Data {
            reason: format!("CSV header error in {}: {}", source_name, e),
        })?
        .clone();

    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| MarketlensError::MissingColumn {
                source_name: source_name.to_string(),
                column: column.to_string(),
            })?;
    }

    let mut bars = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| MarketlensError::Data {
            reason: format!("CSV parse error in {}: {}", source_name, e),
        })?;
        let field = |i: usize| record.get(index[i]).unwrap_or("");

        let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d").map_err(|e| {
            MarketlensError::InvalidValue {
                column: "date".to_string(),
                row,
                reason: e.to_string(),
            }
        })?;
        let mut values = [0.0f64; 5];
        for (offset, value) in values.iter_mut().enumerate() {
            let col = offset + 1;
            *value = field(col)
                .parse()
                .map_err(|e: std::num::ParseFloatError| MarketlensError::InvalidValue {
                    column: COLUMNS[col].to_string(),
                    row,
                    reason: e.to_string(),
                })?;
        }
        let [open, high, low, close, volume] = values;
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Series, MarketlensError> {
        let mut bars: Vec<Bar> = self
            .read_all(symbol)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();
        bars.sort_by_key(|b| b.date);
        Series::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MarketlensError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MarketlensError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MarketlensError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MarketlensError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_all(symbol)?;
        let first = bars.iter().map(|b| b.date).min();
        let last = bars.iter().map(|b| b.date).max();
        Ok(first.zip(last).map(|(f, l)| (f, l, bars.len())))
    }
}

/// Writes the enriched table: OHLCV columns, every indicator column under its
/// fixed name, then the signal columns when signals are attached. "No value" is
/// written as an empty cell.
pub fn write_enriched(path: &Path, enriched: &EnrichedSeries) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| MarketlensError::Data {
        reason: format!("failed to create {}: {}", path.display(), e),
    })?;

    let indicators = enriched.column_names();
    let mut header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(indicators.iter().map(|t| t.to_string()));
    let signal_columns = enriched.signal_column_names();
    header.extend(signal_columns.iter().map(|c| c.to_string()));
    write_record(&mut wtr, &header)?;

    for (i, bar) in enriched.series().bars().iter().enumerate() {
        let mut row = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        row.extend(
            indicators
                .iter()
                .map(|&t| enriched.value(t, i).map(|v| v.to_string()).unwrap_or_default()),
        );
        row.extend(
            signal_columns
                .iter()
                .map(|&c| enriched.signal(c, i).unwrap_or_default().to_string()),
        );
        write_record(&mut wtr, &row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_record(
    wtr: &mut csv::Writer<fs::File>,
    record: &[String],
) -> Result<(), MarketlensError> {
    wtr.write_record(record).map_err(|e| MarketlensError::Data {
        reason: format!("CSV write error: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enriched::enrich;
    use crate::domain::indicator::IndicatorParams;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_bars_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_bars("AAPL", date(2024, 1, 15), date(2024, 1, 17))
            .unwrap();

        assert_eq!(series.len(), 3);
        let first = &series.bars()[0];
        assert_eq!(first.date, date(2024, 1, 15));
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, 50000.0);
        assert_eq!(series.last().unwrap().date, date(2024, 1, 17));
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_bars("AAPL", date(2024, 1, 16), date(2024, 1, 16))
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].date, date(2024, 1, 16));
    }

    #[test]
    fn fetch_bars_missing_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_bars("XYZ", date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(result, Err(MarketlensError::Data { .. })));
    }

    #[test]
    fn missing_column_is_reported() {
        let content = "date,open,high,low,close\n2024-01-01,1,1,1,1\n";
        let err = parse_bars(content, "X.csv").unwrap_err();
        assert!(matches!(err, MarketlensError::MissingColumn { column, .. } if column == "volume"));
    }

    #[test]
    fn non_numeric_value_is_reported() {
        let err = parse_bars(
            "date,open,high,low,close,volume\n2024-01-01,1,1,1,abc,10\n",
            "X.csv",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MarketlensError::InvalidValue { column, row: 0, .. } if column == "close"
        ));
    }

    #[test]
    fn columns_located_by_header() {
        let bars = parse_bars(
            "Date,Close,Open,High,Low,Adj_Close,Volume\n2024-01-01,2,1,3,0.5,2,100\n",
            "X.csv",
        )
        .unwrap();
        assert_eq!(bars[0].open, 1.0);
        assert_eq!(bars[0].close, 2.0);
        assert_eq!(bars[0].volume, 100.0);
    }

    #[test]
    fn duplicate_dates_are_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DUP.csv"),
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,1\n2024-01-02,1,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let result = adapter.fetch_bars("DUP", date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(
            result,
            Err(MarketlensError::NonIncreasingTimestamp { .. })
        ));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn data_range_reports_bounds_and_count() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(
            adapter.get_data_range("AAPL").unwrap(),
            Some((date(2024, 1, 15), date(2024, 1, 17), 3))
        );
        assert_eq!(adapter.get_data_range("MSFT").unwrap(), None);
        assert_eq!(adapter.get_data_range("NONE").unwrap(), None);
    }

    #[test]
    fn write_enriched_uses_empty_cells_for_missing_values() {
        let (dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let series = adapter
            .fetch_bars("AAPL", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        let enriched = enrich(&series, &IndicatorParams::default());

        let out = dir.path().join("out.csv");
        write_enriched(&out, &enriched).unwrap();

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let headers = rdr.headers().unwrap().clone();
        let ret_col = headers.iter().position(|h| h == "daily_return").unwrap();
        assert!(headers.iter().any(|h| h == "ma_200"));

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][ret_col], "");
        assert!(!rows[1][ret_col].is_empty());
        assert!(!headers.iter().any(|h| h == "ma_signal"));
    }

    #[test]
    fn write_enriched_appends_signal_columns() {
        let (dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let series = adapter
            .fetch_bars("AAPL", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        let enriched = enrich(&series, &IndicatorParams::default()).with_signals();

        let out = dir.path().join("signals.csv");
        write_enriched(&out, &enriched).unwrap();

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let headers = rdr.headers().unwrap().clone();
        let tail: Vec<&str> = headers.iter().skip(headers.len() - 4).collect();
        assert_eq!(tail, ["ma_signal", "rsi_signal", "macd_signal_flag", "bb_signal"]);

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        let last = headers.len() - 1;
        assert!(rows.iter().all(|r| &r[last] == "neutral"));
    }
}
