//! Domain error types.

/// Top-level error type for marketlens.
#[derive(Debug, thiserror::Error)]
pub enum MarketlensError {
    #[error("missing column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("invalid {column} value at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("non-finite {field} at bar {index}")]
    NonFiniteValue { field: &'static str, index: usize },

    #[error("timestamp not increasing at bar {index}: {date} does not follow {previous}")]
    NonIncreasingTimestamp {
        index: usize,
        date: chrono::NaiveDate,
        previous: chrono::NaiveDate,
    },

    #[error("invalid weight for {asset}: {reason}")]
    InvalidWeight { asset: String, reason: String },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarketlensError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MarketlensError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&MarketlensError> for std::process::ExitCode {
    fn from(err: &MarketlensError) -> Self {
        let code: u8 = match err {
            MarketlensError::Io(_) => 1,
            MarketlensError::ConfigParse { .. }
            | MarketlensError::ConfigMissing { .. }
            | MarketlensError::ConfigInvalid { .. } => 2,
            MarketlensError::Data { .. } | MarketlensError::DataQuery { .. } => 3,
            MarketlensError::MissingColumn { .. }
            | MarketlensError::InvalidValue { .. }
            | MarketlensError::NonFiniteValue { .. }
            | MarketlensError::NonIncreasingTimestamp { .. }
            | MarketlensError::InvalidWeight { .. } => 4,
            MarketlensError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
