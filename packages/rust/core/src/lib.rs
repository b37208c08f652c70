//! Grouping pipeline for testsplit.
//!
//! This crate ties cost estimation and partitioning together into the
//! strategy entry points (`by_weight`, `by_steps`, `by_scenarios`, `uniform`)
//! and the config-driven [`pipeline::group_files`].

pub mod pipeline;

pub use pipeline::{
    GroupResult, ProgressReporter, SilentProgress, by_scenarios, by_steps, by_weight,
    group_files, pinning_options, uniform,
};
