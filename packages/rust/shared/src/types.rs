//! Core domain types for testsplit groupings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TestSplitError;

/// Cost substituted for artifacts whose estimator reported no cost.
pub const DEFAULT_COST: f64 = 1.0;

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// Estimated relative execution weight of one artifact.
///
/// `Default` is the explicit "no cost available, use [`DEFAULT_COST`]" signal
/// an estimator returns when an annotation is absent. It serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Cost {
    /// A concrete, estimator-supplied cost.
    Known(f64),
    /// Fall back to [`DEFAULT_COST`].
    #[default]
    Default,
}

impl Cost {
    /// Resolve the cost to the number used for comparison and summation.
    pub fn value(self) -> f64 {
        match self {
            Self::Known(v) => v,
            Self::Default => DEFAULT_COST,
        }
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Self::Known(value)
    }
}

impl From<u64> for Cost {
    fn from(value: u64) -> Self {
        Self::Known(value as f64)
    }
}

impl From<Option<f64>> for Cost {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Default, Self::Known)
    }
}

impl From<Cost> for Option<f64> {
    fn from(cost: Cost) -> Self {
        match cost {
            Cost::Known(v) => Some(v),
            Cost::Default => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WeightedItem
// ---------------------------------------------------------------------------

/// An artifact identifier paired with its estimated cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedItem {
    /// File path or `path:line` scenario key.
    pub id: String,
    /// Estimated cost; `null` means the default cost.
    #[serde(default)]
    pub cost: Cost,
}

impl WeightedItem {
    pub fn new(id: impl Into<String>, cost: impl Into<Cost>) -> Self {
        Self {
            id: id.into(),
            cost: cost.into(),
        }
    }

    /// An item whose cost falls back to [`DEFAULT_COST`].
    pub fn with_default_cost(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cost: Cost::Default,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupBy
// ---------------------------------------------------------------------------

/// How artifact costs are estimated before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Every file costs the default of 1.
    #[default]
    Default,
    /// `weight <n>` annotation on the first line of each file.
    Weight,
    /// Number of steps per feature file.
    Steps,
    /// One artifact per scenario.
    Scenarios,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Weight => "weight",
            Self::Steps => "steps",
            Self::Scenarios => "scenarios",
        };
        f.write_str(name)
    }
}

impl FromStr for GroupBy {
    type Err = TestSplitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "weight" => Ok(Self::Weight),
            "steps" => Ok(Self::Steps),
            "scenarios" => Ok(Self::Scenarios),
            other => Err(TestSplitError::config(format!(
                "unknown group_by '{other}': expected default, weight, steps, or scenarios"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// GroupingSummary
// ---------------------------------------------------------------------------

/// Per-group reporting data: members and their summed cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Zero-based group number.
    pub index: usize,
    /// Sorted artifact identifiers.
    pub items: Vec<String>,
    /// Sum of the members' resolved costs.
    pub total_cost: f64,
}

/// Structured report of a finished grouping. `Display` renders the
/// human-readable balancing log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingSummary {
    pub groups: Vec<GroupSummary>,
}

impl GroupingSummary {
    /// Number of groups, including empty ones.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Largest minus smallest group cost.
    pub fn spread(&self) -> f64 {
        let costs = self.groups.iter().map(|g| g.total_cost);
        let max = costs.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = costs.fold(f64::INFINITY, f64::min);
        if self.groups.is_empty() { 0.0 } else { max - min }
    }
}

const BANNER: &str = "====================";
const SEPARATOR: &str = "--------------------";

impl fmt::Display for GroupingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER}")?;
        writeln!(f, "Grouping features:")?;
        for group in &self.groups {
            writeln!(f, "Group number {}", group.index)?;
            writeln!(f, "{}", group.items.join("\n"))?;
            writeln!(f, "Total weight: {}", group.total_cost)?;
            writeln!(f, "{SEPARATOR}")?;
        }
        writeln!(f, "{BANNER}")
    }
}
