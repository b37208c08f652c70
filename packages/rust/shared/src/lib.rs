//! Shared types, error model, and configuration for testsplit.
//!
//! This crate is the foundation depended on by all other testsplit crates.
//! It provides:
//! - [`TestSplitError`], the unified error type
//! - Domain types ([`Cost`], [`WeightedItem`], [`GroupingSummary`])
//! - Configuration ([`AppConfig`], [`GroupConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EstimationConfig, GroupConfig, PinningConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TestSplitError};
pub use types::{Cost, DEFAULT_COST, GroupBy, GroupSummary, GroupingSummary, WeightedItem};
