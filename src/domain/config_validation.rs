//! Configuration validation.
//!
//! Validates every section before any data is loaded, so a bad window or
//! threshold fails fast with the offending `[section] key`.

use crate::domain::comparison::SortKey;
use crate::domain::error::MarketlensError;
use crate::domain::portfolio::parse_weights;
use crate::domain::resample::Interval;
use crate::domain::watchlist::parse_watchlist;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    validate_data(config)?;
    validate_indicators(config)?;
    validate_metrics(config)?;
    validate_portfolio(config)?;
    validate_watchlist(config)?;
    validate_alerts(config)?;
    validate_compare(config)?;
    Ok(())
}

/// Data source selected by `[data] source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
}

pub fn data_source(config: &dyn ConfigPort) -> Result<DataSource, MarketlensError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => Ok(DataSource::Csv),
        "sqlite" => Ok(DataSource::Sqlite),
        other => Err(MarketlensError::config_invalid(
            "data",
            "source",
            format!("expected csv or sqlite, got '{}'", other),
        )),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    match data_source(config)? {
        DataSource::Csv => require(config, "data", "dir")?,
        DataSource::Sqlite => {
            require(config, "sqlite", "path")?;
            if config.get_int("sqlite", "pool_size", 4) < 1 {
                return Err(MarketlensError::config_invalid(
                    "sqlite",
                    "pool_size",
                    "pool_size must be at least 1",
                ));
            }
        }
    }

    let (start, end) = parse_date_range(config)?;
    if start >= end {
        return Err(MarketlensError::config_invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }

    if let Some(interval) = config.get_string("data", "interval") {
        interval.parse::<Interval>()?;
    }

    if config.get_int("data", "cache_ttl_secs", 0) < 0 {
        return Err(MarketlensError::config_invalid(
            "data",
            "cache_ttl_secs",
            "cache_ttl_secs must be non-negative",
        ));
    }
    Ok(())
}

/// `[data] start_date` and `end_date`, both required, formatted YYYY-MM-DD.
pub fn parse_date_range(
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), MarketlensError> {
    let start = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    Ok((start, end))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MarketlensError> {
    match value {
        None => Err(MarketlensError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MarketlensError::config_invalid(
                "data",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

const WINDOW_KEYS: [&str; 12] = [
    "ma_short",
    "ma_medium",
    "ma_long",
    "ema_fast",
    "ema_slow",
    "macd_signal",
    "bollinger_period",
    "rsi_period",
    "atr_period",
    "volatility_short",
    "volatility_long",
    "stochastic_k",
];

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    for key in WINDOW_KEYS.iter().chain(["stochastic_d"].iter()) {
        if config.get_int("indicators", key, 1) < 1 {
            return Err(MarketlensError::config_invalid(
                "indicators",
                key,
                format!("{} must be at least 1", key),
            ));
        }
    }

    let fast = config.get_int("indicators", "ema_fast", 12);
    let slow = config.get_int("indicators", "ema_slow", 26);
    if fast >= slow {
        return Err(MarketlensError::config_invalid(
            "indicators",
            "ema_fast",
            "ema_fast must be shorter than ema_slow",
        ));
    }

    if config.get_double("indicators", "bollinger_multiplier", 2.0) <= 0.0 {
        return Err(MarketlensError::config_invalid(
            "indicators",
            "bollinger_multiplier",
            "bollinger_multiplier must be positive",
        ));
    }
    if config.get_double("indicators", "periods_per_year", 252.0) <= 0.0 {
        return Err(MarketlensError::config_invalid(
            "indicators",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_metrics(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    let rate = config.get_double("metrics", "risk_free_rate", 0.02);
    if !(0.0..1.0).contains(&rate) {
        return Err(MarketlensError::config_invalid(
            "metrics",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    let confidence = config.get_double("metrics", "confidence", 0.95);
    if confidence <= 0.0 || confidence >= 1.0 {
        return Err(MarketlensError::config_invalid(
            "metrics",
            "confidence",
            "confidence must be strictly between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_portfolio(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    if let Some(market) = config.get_string("portfolio", "market")
        && market.trim().is_empty()
    {
        return Err(MarketlensError::config_invalid(
            "portfolio",
            "market",
            "market must not be empty",
        ));
    }
    if let Some(weights) = config.get_string("portfolio", "weights") {
        parse_weights(&weights)
            .map_err(|e| MarketlensError::config_invalid("portfolio", "weights", e.to_string()))?;
    }
    Ok(())
}

fn validate_watchlist(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    let assets = config
        .get_string("watchlist", "assets")
        .ok_or_else(|| MarketlensError::ConfigMissing {
            section: "watchlist".to_string(),
            key: "assets".to_string(),
        })?;
    parse_watchlist(&assets)
        .map_err(|e| MarketlensError::config_invalid("watchlist", "assets", e.to_string()))?;
    Ok(())
}

fn validate_alerts(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    for key in ["price_threshold", "volatility_threshold"] {
        if config.get_double("alerts", key, 0.0) < 0.0 {
            return Err(MarketlensError::config_invalid(
                "alerts",
                key,
                format!("{} must be non-negative", key),
            ));
        }
    }
    Ok(())
}

fn validate_compare(config: &dyn ConfigPort) -> Result<(), MarketlensError> {
    if let Some(key) = config.get_string("compare", "sort_by") {
        key.parse::<SortKey>()?;
    }
    Ok(())
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), MarketlensError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MarketlensError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = "[data]\ndir = ./data\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\
                        [watchlist]\nassets = Apple=AAPL, S&P 500=^GSPC\n";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{}{}", BASE, extra))
    }

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[data]
source = csv
dir = ./data
start_date = 2024-01-01
end_date = 2024-12-31
interval = weekly
cache_ttl_secs = 3600

[indicators]
ma_short = 20
ma_medium = 50
ma_long = 200
ema_fast = 12
ema_slow = 26
rsi_period = 14
bollinger_multiplier = 2.0

[metrics]
risk_free_rate = 0.02
confidence = 0.95

[portfolio]
market = S&P 500
weights = Apple=2, S&P 500=2

[watchlist]
assets = Apple=AAPL, S&P 500=^GSPC

[alerts]
price_threshold = 0.05
volatility_threshold = 0.03
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate_config(&with("")).is_ok());
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config(&BASE.replace("[data]\n", "[data]\nsource = yahoo\n"));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn csv_requires_dir() {
        let err = validate_config(&make_config(&BASE.replace("dir = ./data\n", ""))).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn sqlite_requires_path() {
        let config = make_config(&BASE.replace("[data]\n", "[data]\nsource = sqlite\n"));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            MarketlensError::ConfigMissing { section, key } if section == "sqlite" && key == "path"
        ));
    }

    #[test]
    fn missing_end_date_fails() {
        let err = validate_config(&make_config(&BASE.replace("end_date = 2024-12-31\n", "")))
            .unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let err = validate_config(&make_config(
            &BASE.replace("start_date = 2024-01-01", "start_date = 2025-01-01"),
        ))
        .unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn invalid_date_format_fails() {
        let err = validate_config(&make_config(
            &BASE.replace("start_date = 2024-01-01", "start_date = 2024/01/01"),
        ))
        .unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn unknown_interval_fails() {
        let config = make_config(&BASE.replace("[data]\n", "[data]\ninterval = hourly\n"));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "interval"));
    }

    #[test]
    fn zero_window_fails() {
        let err = validate_config(&with("[indicators]\nrsi_period = 0\n")).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn fast_ema_must_be_shorter() {
        let config = with("[indicators]\nema_fast = 26\nema_slow = 12\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "ema_fast"));
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let err = validate_config(&with("[metrics]\nrisk_free_rate = 1.5\n")).unwrap_err();
        assert!(matches!(
            err,
            MarketlensError::ConfigInvalid { key, .. } if key == "risk_free_rate"
        ));
    }

    #[test]
    fn confidence_out_of_range_fails() {
        let err = validate_config(&with("[metrics]\nconfidence = 1.0\n")).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "confidence"));
    }

    #[test]
    fn bad_weights_fail() {
        let err = validate_config(&with("[portfolio]\nweights = Apple=lots\n")).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "weights"));
    }

    #[test]
    fn missing_watchlist_fails() {
        let config = make_config(
            "[data]\ndir = ./data\nstart_date = 2024-01-01\nend_date = 2024-12-31\n",
        );
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigMissing { key, .. } if key == "assets"));
    }

    #[test]
    fn duplicate_watchlist_name_fails() {
        let config = make_config(&BASE.replace("S&P 500=^GSPC", "Apple=APC"));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "assets"));
    }

    #[test]
    fn unknown_sort_key_fails() {
        let err = validate_config(&with("[compare]\nsort_by = alpha\n")).unwrap_err();
        assert!(matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "sort_by"));
    }

    #[test]
    fn negative_alert_threshold_fails() {
        let err = validate_config(&with("[alerts]\nprice_threshold = -0.1\n")).unwrap_err();
        assert!(
            matches!(err, MarketlensError::ConfigInvalid { key, .. } if key == "price_threshold")
        );
    }
}
