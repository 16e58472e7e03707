//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_set;
pub mod relative_strength;
pub mod rule;
pub mod profile;
pub mod scoring;
pub mod backtest;
pub mod snapshot;
pub mod scan;
pub mod universe;
pub mod config_validation;
pub mod error;
