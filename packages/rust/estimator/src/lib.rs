//! Per-artifact cost estimation for testsplit.
//!
//! Each [`CostEstimator`] turns one file into zero or more
//! [`WeightedItem`]s. [`estimate_files`] reads a batch of files
//! concurrently and runs an estimator over them in input order.

mod feature;
mod scenarios;
mod steps;
mod weight;

use std::path::{Path, PathBuf};

use regex::Regex;
use testsplit_shared::{GroupBy, Result, TestSplitError, WeightedItem};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

pub use feature::{Child, ChildKind, Examples, Feature, parse_feature};
pub use scenarios::ScenarioEstimator;
pub use steps::StepEstimator;
pub use weight::WeightEstimator;

// ---------------------------------------------------------------------------
// Estimator trait
// ---------------------------------------------------------------------------

/// A strategy for pricing artifacts.
pub trait CostEstimator: Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &str;

    /// Whether [`Self::estimate`] looks at file content. When `false`, files
    /// are not read and `content` is empty.
    fn reads_content(&self) -> bool {
        true
    }

    /// Price one file. May return no items (file skipped) or several
    /// (file split into scenarios).
    fn estimate(&self, path: &Path, content: &str) -> Result<Vec<WeightedItem>>;
}

/// Every file costs the default.
#[derive(Debug, Clone, Default)]
pub struct UniformEstimator;

impl CostEstimator for UniformEstimator {
    fn name(&self) -> &str {
        "default"
    }

    fn reads_content(&self) -> bool {
        false
    }

    fn estimate(&self, path: &Path, _content: &str) -> Result<Vec<WeightedItem>> {
        Ok(vec![WeightedItem::with_default_cost(artifact_id(path))])
    }
}

/// Build the estimator for a grouping strategy.
pub fn estimator_for(
    group_by: GroupBy,
    ignore_tag_pattern: Option<&str>,
) -> Result<Box<dyn CostEstimator>> {
    Ok(match group_by {
        GroupBy::Default => Box::new(UniformEstimator),
        GroupBy::Weight => Box::new(WeightEstimator::new()),
        GroupBy::Steps => Box::new(StepEstimator::new(ignore_tag_pattern)?),
        GroupBy::Scenarios => Box::new(ScenarioEstimator::new(ignore_tag_pattern)?),
    })
}

// ---------------------------------------------------------------------------
// Batch estimation
// ---------------------------------------------------------------------------

/// Estimate every file in `paths`, preserving input order.
///
/// Files are read concurrently. `on_file` is called after each file is
/// priced with `(path, current, total)`. The first read or estimation
/// failure aborts the batch.
#[instrument(skip_all, fields(estimator = estimator.name(), files = paths.len()))]
pub async fn estimate_files(
    paths: &[PathBuf],
    estimator: &dyn CostEstimator,
    mut on_file: impl FnMut(&Path, usize, usize),
) -> Result<Vec<WeightedItem>> {
    let total = paths.len();
    let contents = if estimator.reads_content() {
        read_all(paths).await?
    } else {
        vec![String::new(); total]
    };

    let mut items = Vec::with_capacity(total);
    for (index, (path, content)) in paths.iter().zip(contents).enumerate() {
        let estimated = estimator.estimate(path, &content)?;
        debug!(path = %path.display(), items = estimated.len(), "estimated");
        items.extend(estimated);
        on_file(path, index + 1, total);
    }

    info!(items = items.len(), "cost estimation complete");
    Ok(items)
}

/// Read every file concurrently, returning contents in input order.
///
/// The first failure returns early; dropping the set aborts the reads
/// still in flight.
async fn read_all(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut reads = JoinSet::new();
    for (index, path) in paths.iter().enumerate() {
        let path = path.clone();
        reads.spawn(async move {
            let content = tokio::fs::read_to_string(&path).await;
            (index, content)
        });
    }

    let mut contents = vec![String::new(); paths.len()];
    while let Some(joined) = reads.join_next().await {
        // A join error has no path attached; it only happens if the task panicked.
        let (index, content) = joined.map_err(|e| {
            TestSplitError::estimation("<read task>", format!("read task failed: {e}"))
        })?;
        contents[index] = content.map_err(|e| TestSplitError::io(&paths[index], e))?;
    }
    Ok(contents)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Identifier used for a file in groupings.
pub(crate) fn artifact_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub(crate) fn compile_ignore_pattern(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| {
                TestSplitError::config(format!("invalid ignore_tag_pattern '{p}': {e}"))
            })
        })
        .transpose()
}

pub(crate) fn has_matching_tag(tags: &[String], pattern: Option<&Regex>) -> bool {
    pattern.is_some_and(|re| tags.iter().any(|tag| re.is_match(tag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use testsplit_shared::Cost;

    const FIXTURES: &str = "../../../fixtures/features";

    fn fixture(name: &str) -> PathBuf {
        Path::new(FIXTURES).join(name)
    }

    #[test]
    fn has_matching_tag_without_pattern_is_false() {
        assert!(!has_matching_tag(&["@wip".into()], None));
        let re = Regex::new("wip").unwrap();
        assert!(has_matching_tag(&["@smoke".into(), "@wip".into()], Some(&re)));
        assert!(!has_matching_tag(&[], Some(&re)));
    }

    #[test]
    fn estimator_for_each_strategy() {
        assert_eq!(estimator_for(GroupBy::Default, None).unwrap().name(), "default");
        assert_eq!(estimator_for(GroupBy::Weight, None).unwrap().name(), "weight");
        assert_eq!(estimator_for(GroupBy::Steps, None).unwrap().name(), "steps");
        assert_eq!(
            estimator_for(GroupBy::Scenarios, Some("@wip")).unwrap().name(),
            "scenarios"
        );
        assert!(estimator_for(GroupBy::Steps, Some("[")).is_err());
    }

    #[tokio::test]
    async fn estimate_files_preserves_order() {
        let paths = vec![fixture("login.feature"), fixture("checkout.feature")];
        let mut seen = Vec::new();
        let items = estimate_files(&paths, &WeightEstimator::new(), |path, current, total| {
            seen.push((path.to_path_buf(), current, total));
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].id.ends_with("login.feature"));
        assert_eq!(items[0].cost, Cost::Known(7.0));
        assert!(items[1].id.ends_with("checkout.feature"));
        assert_eq!(items[1].cost, Cost::Default);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1, 2);
        assert_eq!(seen[1].2, 2);
    }

    #[tokio::test]
    async fn estimate_files_counts_steps_from_fixtures() {
        let paths = vec![fixture("checkout.feature"), fixture("admin.feature")];
        let estimator = StepEstimator::new(Some("@manual")).unwrap();
        let items = estimate_files(&paths, &estimator, |_, _, _| {}).await.unwrap();

        // admin.feature is tagged @manual and left out
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cost, Cost::Known(8.0));
    }

    #[tokio::test]
    async fn uniform_estimator_does_not_read_files() {
        let paths = vec![PathBuf::from("does/not/exist.feature")];
        let items = estimate_files(&paths, &UniformEstimator, |_, _, _| {})
            .await
            .unwrap();
        assert_eq!(items, vec![WeightedItem::with_default_cost("does/not/exist.feature")]);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let paths = vec![PathBuf::from("does/not/exist.feature")];
        let err = estimate_files(&paths, &WeightEstimator::new(), |_, _, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, TestSplitError::Io { .. }));
    }

    #[tokio::test]
    async fn concurrent_reads_keep_input_order() {
        let names = ["login.feature", "admin.feature", "checkout.feature", "admin.feature"];
        let paths: Vec<PathBuf> = names.iter().map(|name| fixture(name)).collect();
        let items = estimate_files(&paths, &WeightEstimator::new(), |_, _, _| {})
            .await
            .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), names.len());
        for (id, name) in ids.iter().zip(names) {
            assert!(id.ends_with(name), "{id} should end with {name}");
        }
    }

    #[tokio::test]
    async fn missing_file_in_batch_names_that_file() {
        let paths = vec![
            fixture("login.feature"),
            PathBuf::from("does/not/exist.feature"),
            fixture("admin.feature"),
        ];
        let err = estimate_files(&paths, &WeightEstimator::new(), |_, _, _| {})
            .await
            .unwrap_err();
        match err {
            TestSplitError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("does/not/exist.feature"));
            }
            other => panic!("expected an io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_fixture_aborts_the_batch() {
        let paths = vec![fixture("checkout.feature"), fixture("broken.feature")];
        let estimator = StepEstimator::new(None).unwrap();
        let err = estimate_files(&paths, &estimator, |_, _, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, TestSplitError::Estimation { .. }));
        assert!(err.to_string().contains("broken.feature"));
    }
}
