//! CLI integration tests.
//!
//! Tests cover:
//! - Config builders against INI files on disk
//! - Every command run against a CSV data directory in a temp dir
//! - Exit codes for config, data and malformed-input failures
//! - Importing into SQLite and reading back through the configured source

mod common;

use common::*;
use marketlens::cli::{self, Cli, Command};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}

// ExitCode has no PartialEq; compare through Debug.
fn code(c: ExitCode) -> String {
    format!("{:?}", c)
}

fn success() -> String {
    code(ExitCode::SUCCESS)
}

fn exit(n: u8) -> String {
    code(ExitCode::from(n))
}

struct Fixture {
    dir: TempDir,
    ini: PathBuf,
}

fn fixture(extra: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    write_csv(&data, "AAPL", &generate_bars("2024-01-01", 80, 100.0));
    let mut market: Vec<f64> = (0..80).map(|i| 4000.0 + (i % 7) as f64 * 10.0).collect();
    market[79] = 4300.0;
    write_csv(&data, "^GSPC", &bars_from_closes("2024-01-01", &market));

    let ini = dir.path().join("marketlens.ini");
    let content = format!(
        "[data]\nsource = csv\ndir = {}\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\n\
         [watchlist]\nassets = Apple=AAPL, S&P 500=^GSPC\n\n{}",
        data.display(),
        extra
    );
    fs::write(&ini, content).unwrap();
    Fixture { dir, ini }
}

mod config_builders {
    use super::*;
    use marketlens::domain::indicator::IndicatorParams;

    #[test]
    fn builders_read_ini_on_disk() {
        let file = write_temp_ini(
            "[indicators]\nma_short = 5\nma_medium = 10\n[metrics]\nconfidence = 0.99\n\
             [portfolio]\nmarket = Apple\n[alerts]\nvolatility_threshold = 0.1\n",
        );
        let adapter = cli::load_config(file.path()).unwrap();

        let params = cli::build_indicator_params(&adapter);
        assert_eq!(params.ma_short, 5);
        assert_eq!(params.ma_medium, 10);
        assert_eq!(params.ma_long, IndicatorParams::default().ma_long);

        assert_eq!(cli::build_metrics_config(&adapter).confidence, 0.99);
        assert_eq!(cli::build_portfolio_config(&adapter).market, "Apple");
        assert_eq!(cli::build_alert_thresholds(&adapter).volatility, 0.1);
    }

    #[test]
    fn load_config_missing_file_is_config_exit() {
        let result = cli::load_config(Path::new("/nonexistent/marketlens.ini"));
        assert_eq!(code(result.err().unwrap()), exit(2));
    }

    #[test]
    fn load_assets_enriches_watchlist_in_order() {
        let fx = fixture("");
        let adapter = cli::load_config(&fx.ini).unwrap();
        let assets = cli::load_assets(&adapter).unwrap();

        let names: Vec<&str> = assets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Apple", "S&P 500"]);
        assert_eq!(assets[0].1.len(), 80);
    }

    #[test]
    fn load_assets_with_nothing_loadable_is_no_data() {
        let fx = fixture("");
        let content = fs::read_to_string(&fx.ini)
            .unwrap()
            .replace("Apple=AAPL, S&P 500=^GSPC", "Ghost=GHOST");
        fs::write(&fx.ini, content).unwrap();

        let adapter = cli::load_config(&fx.ini).unwrap();
        let err = cli::load_assets(&adapter).unwrap_err();
        assert_eq!(code((&err).into()), exit(5));
    }
}

mod commands {
    use super::*;

    fn run(command: Command) -> String {
        code(cli::run(Cli { command }))
    }

    #[test]
    fn validate_succeeds() {
        let fx = fixture("");
        assert_eq!(run(Command::Validate { config: fx.ini.clone() }), success());
    }

    #[test]
    fn validate_rejects_bad_window() {
        let fx = fixture("[indicators]\nrsi_period = 0\n");
        assert_eq!(run(Command::Validate { config: fx.ini.clone() }), exit(2));
    }

    #[test]
    fn validate_missing_file() {
        let result = run(Command::Validate {
            config: PathBuf::from("/nonexistent/marketlens.ini"),
        });
        assert_eq!(result, exit(2));
    }

    #[test]
    fn summary_by_watchlist_name() {
        let fx = fixture("");
        let result = run(Command::Summary {
            config: fx.ini.clone(),
            symbol: "Apple".to_string(),
        });
        assert_eq!(result, success());
    }

    #[test]
    fn summary_unknown_symbol_is_data_error() {
        let fx = fixture("");
        let result = run(Command::Summary {
            config: fx.ini.clone(),
            symbol: "GHOST".to_string(),
        });
        assert_eq!(result, exit(3));
    }

    #[test]
    fn enrich_writes_table() {
        let fx = fixture("");
        let output = fx.dir.path().join("aapl_enriched.csv");
        let result = run(Command::Enrich {
            config: fx.ini.clone(),
            symbol: "AAPL".to_string(),
            output: Some(output.clone()),
        });
        assert_eq!(result, success());

        let content = fs::read_to_string(&output).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.starts_with("date,open,high,low,close,volume"));
        assert!(header.contains("daily_return"));
        assert!(header.contains("bb_upper"));
        assert!(header.contains("rsi"));
        assert!(header.ends_with("ma_signal,rsi_signal,macd_signal_flag,bb_signal"));
        assert_eq!(content.lines().count(), 81);
    }

    #[test]
    fn compare_with_each_sort_key() {
        let fx = fixture("");
        for key in ["total-return", "volatility", "sharpe", "max-drawdown", "price"] {
            let result = run(Command::Compare {
                config: fx.ini.clone(),
                sort_by: Some(key.to_string()),
            });
            assert_eq!(result, success(), "sort key {}", key);
        }
    }

    #[test]
    fn compare_unknown_sort_key_is_config_error() {
        let fx = fixture("");
        let result = run(Command::Compare {
            config: fx.ini.clone(),
            sort_by: Some("alpha".to_string()),
        });
        assert_eq!(result, exit(2));
    }

    #[test]
    fn portfolio_with_config_weights() {
        let fx = fixture("[portfolio]\nweights = Apple=2, S&P 500=2\n");
        let result = run(Command::Portfolio {
            config: fx.ini.clone(),
            weights: None,
        });
        assert_eq!(result, success());
    }

    #[test]
    fn portfolio_with_bad_override_weights() {
        let fx = fixture("");
        let result = run(Command::Portfolio {
            config: fx.ini.clone(),
            weights: Some("Apple=-1".to_string()),
        });
        assert_eq!(result, exit(4));
    }

    #[test]
    fn alerts_over_watchlist() {
        let fx = fixture("");
        assert_eq!(run(Command::Alerts { config: fx.ini.clone() }), success());
    }

    #[test]
    fn info_lists_symbols() {
        let fx = fixture("");
        let result = run(Command::Info {
            config: fx.ini.clone(),
            symbol: None,
        });
        assert_eq!(result, success());
    }

    #[test]
    fn malformed_csv_is_reported() {
        let fx = fixture("");
        fs::write(
            fx.dir.path().join("data").join("AAPL.csv"),
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,oops,1\n",
        )
        .unwrap();
        let result = run(Command::Summary {
            config: fx.ini.clone(),
            symbol: "AAPL".to_string(),
        });
        assert_eq!(result, exit(4));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn import_then_read_from_sqlite() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("bhp.csv");
        write_csv(dir.path(), "bhp", &generate_bars("2024-02-01", 30, 40.0));
        let db_path = dir.path().join("market.db");
        let ini = write_temp_ini(&format!(
            "[data]\nsource = sqlite\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\
             [sqlite]\npath = {}\n[watchlist]\nassets = BHP\n",
            db_path.display()
        ));
        let config = ini.path().to_path_buf();

        let imported = run(Command::Import {
            config: config.clone(),
            symbol: "bhp".to_string(),
            file: csv_path,
        });
        assert_eq!(imported, success());

        let summary = run(Command::Summary {
            config: config.clone(),
            symbol: "BHP".to_string(),
        });
        assert_eq!(summary, success());

        let adapter = cli::load_config(&config).unwrap();
        let assets = cli::load_assets(&adapter).unwrap();
        assert_eq!(assets[0].1.len(), 30);
    }
}
