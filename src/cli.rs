//! CLI definition and dispatch.
//!
//! Every command loads and validates the INI configuration first, then runs a
//! staged pipeline. Results go to stdout; progress and diagnostics go to stderr.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use crate::adapters::cached_data_adapter::{CachedDataAdapter, DEFAULT_TTL};
use crate::adapters::csv_adapter::{CsvAdapter, write_enriched};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::alerts::{AlertThresholds, generate_alerts};
use crate::domain::comparison::{ComparisonRow, SortKey, compare_assets, correlation_summary};
use crate::domain::config_validation::{DataSource, data_source, parse_date_range, validate_config};
use crate::domain::enriched::{EnrichedSeries, enrich};
use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::metrics::{
    MetricsConfig, RiskMetrics, SummaryStatistics, rolling_metrics, summary_statistics,
};
use crate::domain::portfolio::{
    CorrelationMatrix, DEFAULT_MARKET, PortfolioConfig, PortfolioMetrics,
    calculate_portfolio_metrics, parse_weights,
};
use crate::domain::resample::Interval;
use crate::domain::watchlist::{WatchlistEntry, enrich_all, load_watchlist, parse_watchlist};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "marketlens", about = "Technical indicators and risk metrics for a watchlist")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summary statistics, latest signals and alerts for one asset
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        /// Watchlist name or ticker symbol
        #[arg(short, long)]
        symbol: String,
    },
    /// Write the enriched indicator table for one asset as CSV
    Enrich {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare every watchlist asset side by side
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// total-return, volatility, sharpe, max-drawdown or price
        #[arg(long)]
        sort_by: Option<String>,
    },
    /// Weighted portfolio metrics over the watchlist
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [portfolio] weights, e.g. "Apple=2,S&P 500=2"
        #[arg(short, long)]
        weights: Option<String>,
    },
    /// Price, crossover and volatility alerts for every watchlist asset
    Alerts {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show available symbols and their data ranges
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Import an OHLCV CSV file into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        file: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Summary { config, symbol } => {
            with_validated_config(&config, |adapter| run_summary(adapter, &symbol))
        }
        Command::Enrich {
            config,
            symbol,
            output,
        } => with_validated_config(&config, |adapter| {
            run_enrich(adapter, &symbol, output.as_deref())
        }),
        Command::Compare { config, sort_by } => {
            with_validated_config(&config, |adapter| run_compare(adapter, sort_by.as_deref()))
        }
        Command::Portfolio { config, weights } => {
            with_validated_config(&config, |adapter| run_portfolio(adapter, weights.as_deref()))
        }
        Command::Alerts { config } => with_validated_config(&config, run_alerts),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => {
            with_validated_config(&config, |adapter| run_info(adapter, symbol.as_deref()))
        }
        Command::Import {
            config,
            symbol,
            file,
        } => with_validated_config(&config, |adapter| run_import(adapter, &symbol, &file)),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MarketlensError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn with_validated_config<F>(config_path: &Path, command: F) -> ExitCode
where
    F: FnOnce(&FileConfigAdapter) -> Result<(), MarketlensError>,
{
    // Stage 1: Load config
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate every section before touching data
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Run the command
    match command(&adapter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn build_indicator_params(adapter: &dyn ConfigPort) -> IndicatorParams {
    let d = IndicatorParams::default();
    let window = |key: &str, default: usize| {
        adapter.get_int("indicators", key, default as i64).max(1) as usize
    };

    IndicatorParams {
        ma_short: window("ma_short", d.ma_short),
        ma_medium: window("ma_medium", d.ma_medium),
        ma_long: window("ma_long", d.ma_long),
        ema_fast: window("ema_fast", d.ema_fast),
        ema_slow: window("ema_slow", d.ema_slow),
        macd_signal: window("macd_signal", d.macd_signal),
        bollinger_period: window("bollinger_period", d.bollinger_period),
        bollinger_multiplier: adapter.get_double(
            "indicators",
            "bollinger_multiplier",
            d.bollinger_multiplier,
        ),
        rsi_period: window("rsi_period", d.rsi_period),
        atr_period: window("atr_period", d.atr_period),
        volatility_short: window("volatility_short", d.volatility_short),
        volatility_long: window("volatility_long", d.volatility_long),
        stochastic_k: window("stochastic_k", d.stochastic_k),
        stochastic_d: window("stochastic_d", d.stochastic_d),
        periods_per_year: adapter.get_double("indicators", "periods_per_year", d.periods_per_year),
    }
}

pub fn build_metrics_config(adapter: &dyn ConfigPort) -> MetricsConfig {
    let d = MetricsConfig::default();
    MetricsConfig {
        risk_free_rate: adapter.get_double("metrics", "risk_free_rate", d.risk_free_rate),
        periods_per_year: adapter.get_double("indicators", "periods_per_year", d.periods_per_year),
        confidence: adapter.get_double("metrics", "confidence", d.confidence),
    }
}

pub fn build_portfolio_config(adapter: &dyn ConfigPort) -> PortfolioConfig {
    PortfolioConfig {
        market: adapter
            .get_string("portfolio", "market")
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        metrics: build_metrics_config(adapter),
    }
}

pub fn build_alert_thresholds(adapter: &dyn ConfigPort) -> AlertThresholds {
    let d = AlertThresholds::default();
    AlertThresholds {
        price: adapter.get_double("alerts", "price_threshold", d.price),
        volatility: adapter.get_double("alerts", "volatility_threshold", d.volatility),
    }
}

pub fn build_interval(adapter: &dyn ConfigPort) -> Result<Interval, MarketlensError> {
    match adapter.get_string("data", "interval") {
        Some(value) => value.parse(),
        None => Ok(Interval::default()),
    }
}

pub fn resolve_watchlist(adapter: &dyn ConfigPort) -> Result<Vec<WatchlistEntry>, MarketlensError> {
    let assets = adapter
        .get_string("watchlist", "assets")
        .ok_or_else(|| MarketlensError::ConfigMissing {
            section: "watchlist".into(),
            key: "assets".into(),
        })?;
    parse_watchlist(&assets)
        .map_err(|e| MarketlensError::config_invalid("watchlist", "assets", e.to_string()))
}

/// Looks `query` up by watchlist name, then by symbol. Unknown queries are
/// treated as a bare ticker.
pub fn resolve_entry(entries: &[WatchlistEntry], query: &str) -> WatchlistEntry {
    let query = query.trim();
    entries
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(query))
        .or_else(|| entries.iter().find(|e| e.symbol.eq_ignore_ascii_case(query)))
        .cloned()
        .unwrap_or_else(|| WatchlistEntry {
            name: query.to_string(),
            symbol: query.to_uppercase(),
        })
}

/// Builds the configured data source behind a TTL cache.
pub fn open_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, MarketlensError> {
    let ttl = Duration::from_secs(
        adapter
            .get_int("data", "cache_ttl_secs", DEFAULT_TTL.as_secs() as i64)
            .max(0) as u64,
    );

    match data_source(adapter)? {
        DataSource::Csv => {
            let csv = CsvAdapter::from_config(adapter)?;
            Ok(Box::new(CachedDataAdapter::new(csv, ttl)))
        }
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;

            let sqlite = SqliteAdapter::from_config(adapter)?;
            sqlite.initialize_schema()?;
            Ok(Box::new(CachedDataAdapter::new(sqlite, ttl)))
        }
        #[cfg(not(feature = "sqlite"))]
        DataSource::Sqlite => Err(MarketlensError::config_invalid(
            "data",
            "source",
            "sqlite support is not compiled in",
        )),
    }
}

fn load_one(
    adapter: &dyn ConfigPort,
    query: &str,
) -> Result<(WatchlistEntry, EnrichedSeries), MarketlensError> {
    let entry = resolve_entry(&resolve_watchlist(adapter)?, query);
    let (start, end) = parse_date_range(adapter)?;
    let interval = build_interval(adapter)?;
    let port = open_data_port(adapter)?;

    info!(name = %entry.name, symbol = %entry.symbol, %interval, "fetching");
    let series = port.fetch_series(&entry.symbol, start, end, interval)?;
    if series.is_empty() {
        return Err(MarketlensError::NoData {
            symbol: entry.symbol,
        });
    }

    let enriched = enrich(&series, &build_indicator_params(adapter)).with_signals();
    Ok((entry, enriched))
}

/// Loads and enriches the whole watchlist, skipping assets without data.
pub fn load_assets(
    adapter: &dyn ConfigPort,
) -> Result<Vec<(String, EnrichedSeries)>, MarketlensError> {
    let entries = resolve_watchlist(adapter)?;
    let (start, end) = parse_date_range(adapter)?;
    let interval = build_interval(adapter)?;
    let port = open_data_port(adapter)?;

    info!(assets = entries.len(), %interval, "loading watchlist");
    let loaded = load_watchlist(&*port, &entries, start, end, interval);
    if loaded.assets.is_empty() {
        return Err(MarketlensError::NoData {
            symbol: "watchlist".to_string(),
        });
    }
    if !loaded.skipped.is_empty() {
        info!(skipped = loaded.skipped.len(), "some assets were skipped");
    }

    let params = build_indicator_params(adapter);
    Ok(enrich_all(&loaded.assets, &params))
}

fn run_summary(adapter: &FileConfigAdapter, query: &str) -> Result<(), MarketlensError> {
    let (entry, enriched) = load_one(adapter, query)?;
    let metrics = build_metrics_config(adapter);
    let stats = summary_statistics(&enriched, &metrics).ok_or_else(|| MarketlensError::NoData {
        symbol: entry.symbol.clone(),
    })?;

    println!("{} ({})", entry.name, entry.symbol);
    print_summary(&stats, &metrics);

    let window = enriched.params().volatility_short;
    let rolling = rolling_metrics(&enriched, window, metrics.periods_per_year);
    println!("\nRolling {}-bar window (latest)", window);
    let latest = |col: &[Option<f64>]| col.last().copied().flatten();
    println!("  Return:           {}", opt_pct(latest(&rolling.rolling_return)));
    println!("  Volatility:       {}", opt_pct(latest(&rolling.rolling_volatility)));
    println!("  Sharpe:           {}", opt_num(latest(&rolling.rolling_sharpe)));

    if let Some(signals) = enriched.signals().and_then(|s| s.last()) {
        println!("\nSignals (latest bar)");
        println!("  MA trend:         {}", signals.ma);
        println!("  RSI:              {}", signals.rsi);
        println!("  MACD:             {}", signals.macd);
        println!("  Bollinger:        {}", signals.bollinger);
    }

    let alerts = generate_alerts(&enriched, &entry.name, &build_alert_thresholds(adapter));
    println!("\nAlerts");
    if alerts.is_empty() {
        println!("  none");
    }
    for alert in &alerts {
        println!("  - {}", alert);
    }
    Ok(())
}

fn print_summary(stats: &SummaryStatistics, metrics: &MetricsConfig) {
    println!("  Price:            {:.2}", stats.current_price);
    match (stats.change, stats.change_percent) {
        (Some(change), pct) => println!("  Change:           {:+.2} ({})", change, opt_pct(pct)),
        (None, _) => println!("  Change:           n/a"),
    }
    println!("  Period high:      {:.2}", stats.high);
    println!("  Period low:       {:.2}", stats.low);
    println!("  Average volume:   {:.0}", stats.average_volume);
    println!("  Total return:     {}", opt_pct(stats.total_return));
    print_risk(&stats.risk, metrics);
}

fn print_risk(risk: &RiskMetrics, metrics: &MetricsConfig) {
    let level = metrics.confidence * 100.0;
    println!("  Annual return:    {}", pct(risk.annualized_return));
    println!("  Annual vol:       {}", pct(risk.annualized_volatility));
    println!("  Sharpe ratio:     {:.2}", risk.sharpe_ratio);
    println!("  Sortino ratio:    {:.2}", risk.sortino_ratio);
    println!("  Max drawdown:     {}", pct(risk.max_drawdown));
    println!("  Calmar ratio:     {:.2}", risk.calmar_ratio);
    println!("  VaR ({:.0}%):        {}", level, opt_pct(risk.value_at_risk));
    println!("  CVaR ({:.0}%):       {}", level, opt_pct(risk.conditional_value_at_risk));
}

fn run_enrich(
    adapter: &FileConfigAdapter,
    query: &str,
    output: Option<&Path>,
) -> Result<(), MarketlensError> {
    let (entry, enriched) = load_one(adapter, query)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}_enriched.csv", entry.symbol)));

    write_enriched(&path, &enriched)?;
    info!(
        rows = enriched.len(),
        columns = enriched.column_names().len() + enriched.signal_column_names().len(),
        "enriched table written"
    );
    println!("{}", path.display());
    Ok(())
}

fn run_compare(adapter: &FileConfigAdapter, sort_by: Option<&str>) -> Result<(), MarketlensError> {
    let sort_key = match sort_by
        .map(str::to_string)
        .or_else(|| adapter.get_string("compare", "sort_by"))
    {
        Some(key) => key.parse()?,
        None => SortKey::default(),
    };

    let assets = load_assets(adapter)?;
    let rows = compare_assets(&assets, sort_key, &build_metrics_config(adapter));

    println!("Sorted by {}", sort_key);
    print_comparison(&rows);
    println!();
    print_correlation(&correlation_summary(&assets));
    Ok(())
}

fn print_comparison(rows: &[ComparisonRow]) {
    println!(
        "{:<16} {:>12} {:>12} {:>8} {:>12} {:>12}",
        "Asset", "Return", "Volatility", "Sharpe", "Max DD", "Price"
    );
    for row in rows {
        println!(
            "{:<16} {:>12} {:>12} {:>8.2} {:>12} {:>12.2}",
            row.asset,
            opt_pct(row.total_return),
            pct(row.volatility),
            row.sharpe_ratio,
            pct(row.max_drawdown),
            row.current_price
        );
    }
}

fn print_correlation(matrix: &CorrelationMatrix) {
    print!("{:<16}", "Correlation");
    for label in &matrix.labels {
        print!(" {:>10}", truncate(label, 10));
    }
    println!();
    for (label, row) in matrix.labels.iter().zip(&matrix.values) {
        print!("{:<16}", truncate(label, 16));
        for value in row {
            print!(" {:>10}", opt_num(*value));
        }
        println!();
    }
}

fn run_portfolio(
    adapter: &FileConfigAdapter,
    weights: Option<&str>,
) -> Result<(), MarketlensError> {
    let weights: Option<HashMap<String, f64>> = match weights
        .map(str::to_string)
        .or_else(|| adapter.get_string("portfolio", "weights"))
    {
        Some(input) => Some(parse_weights(&input)?),
        None => None,
    };

    let assets = load_assets(adapter)?;
    let config = build_portfolio_config(adapter);
    let metrics = calculate_portfolio_metrics(&assets, weights.as_ref(), &config)?
        .ok_or_else(|| MarketlensError::NoData {
            symbol: "portfolio".to_string(),
        })?;

    print_portfolio(&metrics, &config);
    Ok(())
}

fn print_portfolio(metrics: &PortfolioMetrics, config: &PortfolioConfig) {
    println!("Weights");
    for (asset, weight) in &metrics.weights {
        println!("  {:<16} {}", asset, pct(*weight));
    }

    let (first, last) = (metrics.dates.first(), metrics.dates.last());
    if let (Some(first), Some(last)) = (first, last) {
        println!("\nPeriod {} to {} ({} returns)", first, last, metrics.portfolio_returns.len());
    }
    println!("  Total return:     {}", pct(metrics.total_return));
    print_risk(&metrics.risk, &config.metrics);
    match metrics.beta {
        Some(beta) => println!("  Beta vs {}: {:.2}", config.market, beta),
        None => println!("  Beta vs {}: n/a", config.market),
    }
    println!();
    print_correlation(&metrics.correlation);
}

fn run_alerts(adapter: &FileConfigAdapter) -> Result<(), MarketlensError> {
    let thresholds = build_alert_thresholds(adapter);
    let assets = load_assets(adapter)?;

    let alerts: Vec<_> = assets
        .iter()
        .flat_map(|(name, enriched)| generate_alerts(enriched, name, &thresholds))
        .collect();

    if alerts.is_empty() {
        println!("No alerts");
    }
    for alert in &alerts {
        println!("{}", alert);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let entries = match resolve_watchlist(&adapter) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("Watchlist:");
    for entry in &entries {
        println!("  {} = {}", entry.name, entry.symbol);
    }
    println!("Configuration is valid");
    ExitCode::SUCCESS
}

fn run_info(adapter: &FileConfigAdapter, symbol: Option<&str>) -> Result<(), MarketlensError> {
    let port = open_data_port(adapter)?;
    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => port.list_symbols()?,
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    }
    for symbol in &symbols {
        match port.get_data_range(symbol)? {
            Some((first, last, count)) => {
                println!("{:<12} {} to {} ({} bars)", symbol, first, last, count)
            }
            None => println!("{:<12} no data", symbol),
        }
    }
    Ok(())
}

fn run_import(
    adapter: &FileConfigAdapter,
    symbol: &str,
    file: &Path,
) -> Result<(), MarketlensError> {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_adapter::parse_bars;
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::ohlcv::Series;

        let content = std::fs::read_to_string(file)?;
        let mut bars = parse_bars(&content, &file.display().to_string())?;
        bars.sort_by_key(|b| b.date);
        let series = Series::new(bars)?;

        let sqlite = SqliteAdapter::from_config(adapter)?;
        sqlite.initialize_schema()?;
        let symbol = symbol.trim().to_uppercase();
        sqlite.insert_bars(&symbol, series.bars())?;

        info!(symbol = %symbol, bars = series.len(), "imported");
        println!("{} bars imported for {}", series.len(), symbol);
        Ok(())
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (adapter, symbol, file);
        Err(MarketlensError::config_invalid(
            "data",
            "source",
            "sqlite support is not compiled in",
        ))
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "n/a".to_string())
}

fn opt_num(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn truncate(label: &str, width: usize) -> String {
    label.chars().take(width).collect()
}
