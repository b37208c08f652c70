//! Cost from a `weight <n>` annotation on the first line of a file.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use testsplit_shared::{Cost, Result, TestSplitError, WeightedItem};

use crate::{CostEstimator, artifact_id};

/// Matches `weight 12` anywhere on a line, e.g. `# weight 12`.
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"weight ([0-9]+)").expect("weight regex"));

/// Reads the explicit weight annotation; files without one cost the default.
#[derive(Debug, Clone, Default)]
pub struct WeightEstimator;

impl WeightEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl CostEstimator for WeightEstimator {
    fn name(&self) -> &str {
        "weight"
    }

    fn estimate(&self, path: &Path, content: &str) -> Result<Vec<WeightedItem>> {
        let cost = first_line_weight(content)
            .map_err(|msg| TestSplitError::estimation(path, msg))?;
        Ok(vec![WeightedItem::new(artifact_id(path), cost)])
    }
}

/// Parse the weight annotation of the first line, if any.
pub(crate) fn first_line_weight(content: &str) -> std::result::Result<Cost, String> {
    let Some(first) = content.lines().next() else {
        return Ok(Cost::Default);
    };
    match WEIGHT_RE.captures(first) {
        Some(caps) => caps[1]
            .parse::<u64>()
            .map(Cost::from)
            .map_err(|e| format!("invalid weight '{}': {e}", &caps[1])),
        None => Ok(Cost::Default),
    }
}
