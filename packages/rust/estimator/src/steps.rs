//! Cost from the number of steps in a feature file.

use std::path::Path;

use regex::Regex;
use testsplit_shared::{Result, TestSplitError, WeightedItem};
use tracing::debug;

use crate::feature::parse_feature;
use crate::{CostEstimator, artifact_id, compile_ignore_pattern, has_matching_tag};

/// Counts steps; sections tagged with an ignored tag count zero, and a
/// feature tagged with one is left out entirely.
#[derive(Debug, Clone, Default)]
pub struct StepEstimator {
    ignore_tags: Option<Regex>,
}

impl StepEstimator {
    /// `ignore_tag_pattern` is a regex matched against tags such as `@wip`.
    pub fn new(ignore_tag_pattern: Option<&str>) -> Result<Self> {
        Ok(Self {
            ignore_tags: compile_ignore_pattern(ignore_tag_pattern)?,
        })
    }
}

impl CostEstimator for StepEstimator {
    fn name(&self) -> &str {
        "steps"
    }

    fn estimate(&self, path: &Path, content: &str) -> Result<Vec<WeightedItem>> {
        let feature =
            parse_feature(content).map_err(|e| TestSplitError::estimation(path, e.to_string()))?;

        let ignore = self.ignore_tags.as_ref();
        if has_matching_tag(&feature.tags, ignore) {
            debug!(path = %path.display(), "feature skipped by ignored tag");
            return Ok(Vec::new());
        }

        let steps: usize = feature
            .children
            .iter()
            .filter(|child| !has_matching_tag(&child.tags, ignore))
            .map(|child| child.steps)
            .sum();

        Ok(vec![WeightedItem::new(artifact_id(path), steps as u64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testsplit_shared::Cost;

    const CONTENT: &str = "\
Feature: Checkout
  Background:
    Given a cart

  Scenario: pay
    When I pay
    Then I get a receipt

  @wip
  Scenario: refund
    When I refund
    Then money returns
    And I get an email
";

    fn cost_of(estimator: &StepEstimator, content: &str) -> Vec<WeightedItem> {
        estimator
            .estimate(Path::new("checkout.feature"), content)
            .unwrap()
    }

    #[test]
    fn counts_all_steps() {
        let items = cost_of(&StepEstimator::new(None).unwrap(), CONTENT);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "checkout.feature");
        assert_eq!(items[0].cost, Cost::Known(6.0));
    }

    #[test]
    fn ignored_scenarios_count_zero() {
        let estimator = StepEstimator::new(Some("@wip")).unwrap();
        let items = cost_of(&estimator, CONTENT);
        assert_eq!(items[0].cost, Cost::Known(3.0));
    }

    #[test]
    fn ignored_feature_is_skipped() {
        let estimator = StepEstimator::new(Some("@manual")).unwrap();
        let content = format!("@manual\n{CONTENT}");
        assert!(cost_of(&estimator, &content).is_empty());
    }

    #[test]
    fn feature_without_steps_costs_zero() {
        let items = cost_of(&StepEstimator::new(None).unwrap(), "Feature: empty\n");
        assert_eq!(items[0].cost, Cost::Known(0.0));
    }

    #[test]
    fn malformed_feature_is_an_estimation_error() {
        let err = StepEstimator::new(None)
            .unwrap()
            .estimate(Path::new("broken.feature"), "Given nothing\n")
            .unwrap_err();
        assert!(matches!(err, TestSplitError::Estimation { .. }));
        assert!(err.to_string().contains("broken.feature"));
    }

    #[test]
    fn invalid_ignore_pattern_is_a_config_error() {
        let err = StepEstimator::new(Some("@(wip")).unwrap_err();
        assert!(matches!(err, TestSplitError::Config { .. }));
    }
}
