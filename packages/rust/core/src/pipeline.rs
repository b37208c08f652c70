//! End-to-end grouping pipeline: files → cost estimation → partition.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{info, instrument};

use testsplit_estimator::{
    CostEstimator, ScenarioEstimator, StepEstimator, UniformEstimator, WeightEstimator,
    estimate_files, estimator_for,
};
use testsplit_grouper::{GroupOptions, Partition, check_group_count, partition};
use testsplit_shared::{GroupBy, GroupConfig, Result, TestSplitError};

/// Result of the `group_files` pipeline.
#[derive(Debug)]
pub struct GroupResult {
    /// The computed groups.
    pub partition: Partition,
    /// Strategy used to estimate costs.
    pub group_by: GroupBy,
    /// Number of artifacts that were grouped.
    pub item_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file has been priced.
    fn file_estimated(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &GroupResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_estimated(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &GroupResult) {}
}

/// Run the full grouping pipeline described by `config`.
///
/// 1. Validate group count and compile pinning patterns
/// 2. Estimate a cost for every file with the configured strategy
/// 3. Partition the priced artifacts
#[instrument(skip_all, fields(group_by = %config.group_by, files = config.files.len(), num_groups = config.num_groups))]
pub async fn group_files(
    config: &GroupConfig,
    progress: &dyn ProgressReporter,
) -> Result<GroupResult> {
    let start = Instant::now();

    check_group_count(config.num_groups, config.isolate)?;
    let options = pinning_options(&config.single_process, config.isolate)?;
    let estimator = estimator_for(config.group_by, config.ignore_tag_pattern.as_deref())?;

    progress.phase("Estimating costs");
    let items = estimate_files(&config.files, estimator.as_ref(), |path, current, total| {
        progress.file_estimated(&path.display().to_string(), current, total);
    })
    .await?;
    let item_count = items.len();

    progress.phase("Grouping");
    let partition = partition(items, config.num_groups, &options)?;

    let result = GroupResult {
        partition,
        group_by: config.group_by,
        item_count,
        elapsed: start.elapsed(),
    };

    info!(
        items = result.item_count,
        groups = result.partition.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "grouping pipeline complete"
    );
    progress.done(&result);

    Ok(result)
}

/// Compile `single_process` regexes into pinning options.
pub fn pinning_options(patterns: &[String], isolate: bool) -> Result<GroupOptions> {
    patterns
        .iter()
        .try_fold(GroupOptions::new().with_isolation(isolate), |options, pattern| {
            let re = Regex::new(pattern).map_err(|e| {
                TestSplitError::config(format!("invalid single_process pattern '{pattern}': {e}"))
            })?;
            Ok(options.pin(re))
        })
}

// ---------------------------------------------------------------------------
// Strategy wrappers
// ---------------------------------------------------------------------------

/// Group files, every file costing the default.
pub async fn uniform(
    files: &[PathBuf],
    num_groups: usize,
    options: &GroupOptions,
) -> Result<Partition> {
    run(files, &UniformEstimator, num_groups, options).await
}

/// Group files by the `weight <n>` annotation on their first line.
pub async fn by_weight(
    files: &[PathBuf],
    num_groups: usize,
    options: &GroupOptions,
) -> Result<Partition> {
    run(files, &WeightEstimator::new(), num_groups, options).await
}

/// Group feature files by step count.
pub async fn by_steps(
    files: &[PathBuf],
    num_groups: usize,
    options: &GroupOptions,
    ignore_tag_pattern: Option<&str>,
) -> Result<Partition> {
    let estimator = StepEstimator::new(ignore_tag_pattern)?;
    run(files, &estimator, num_groups, options).await
}

/// Group individual scenarios (`path:line`) instead of whole files.
pub async fn by_scenarios(
    files: &[PathBuf],
    num_groups: usize,
    options: &GroupOptions,
    ignore_tag_pattern: Option<&str>,
) -> Result<Partition> {
    let estimator = ScenarioEstimator::new(ignore_tag_pattern)?;
    run(files, &estimator, num_groups, options).await
}

async fn run(
    files: &[PathBuf],
    estimator: &dyn CostEstimator,
    num_groups: usize,
    options: &GroupOptions,
) -> Result<Partition> {
    check_group_count(num_groups, options.isolate)?;
    let items = estimate_files(files, estimator, |_, _, _| {}).await?;
    partition(items, num_groups, options)
}
