//! Core domain types and analytics.

pub mod alerts;
pub mod comparison;
pub mod config_validation;
pub mod enriched;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod resample;
pub mod signals;
pub mod watchlist;
