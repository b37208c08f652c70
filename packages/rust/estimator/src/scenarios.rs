//! One artifact per scenario, keyed `path:line`.

use std::path::Path;

use regex::Regex;
use testsplit_shared::{Result, TestSplitError, WeightedItem};

use crate::feature::{ChildKind, parse_feature};
use crate::{CostEstimator, artifact_id, compile_ignore_pattern, has_matching_tag};

/// Splits feature files into their scenarios so that a long feature can be
/// spread over several groups. Outlines yield one artifact per examples row.
/// Every scenario costs the default.
#[derive(Debug, Clone, Default)]
pub struct ScenarioEstimator {
    ignore_tags: Option<Regex>,
}

impl ScenarioEstimator {
    pub fn new(ignore_tag_pattern: Option<&str>) -> Result<Self> {
        Ok(Self {
            ignore_tags: compile_ignore_pattern(ignore_tag_pattern)?,
        })
    }
}

impl CostEstimator for ScenarioEstimator {
    fn name(&self) -> &str {
        "scenarios"
    }

    fn estimate(&self, path: &Path, content: &str) -> Result<Vec<WeightedItem>> {
        let feature =
            parse_feature(content).map_err(|e| TestSplitError::estimation(path, e.to_string()))?;

        let ignore = self.ignore_tags.as_ref();
        if has_matching_tag(&feature.tags, ignore) {
            return Ok(Vec::new());
        }

        let id = artifact_id(path);
        let mut items = Vec::new();
        for scenario in feature.scenarios() {
            if has_matching_tag(&scenario.tags, ignore) {
                continue;
            }
            match scenario.kind {
                ChildKind::Outline => {
                    for examples in &scenario.examples {
                        if has_matching_tag(&examples.tags, ignore) {
                            continue;
                        }
                        items.extend(
                            examples
                                .rows
                                .iter()
                                .map(|row| WeightedItem::with_default_cost(format!("{id}:{row}"))),
                        );
                    }
                }
                _ => items.push(WeightedItem::with_default_cost(format!(
                    "{id}:{}",
                    scenario.line
                ))),
            }
        }

        Ok(items)
    }
}
