//! marketlens: technical indicators and risk metrics for OHLCV watchlists.
//!
//! Hexagonal architecture: pure computation in [`domain`], collaborator traits in
//! [`ports`], concrete data sources and configuration in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
