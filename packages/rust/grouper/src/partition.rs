//! Greedy largest-first partitioning with pinning and isolation.
//!
//! The fill works in one pass:
//! 1. Every artifact accepted by a pinning matcher moves to group 0
//!    (matchers are tried in order, first match wins)
//! 2. The remaining artifacts are stable-sorted by cost, largest first
//! 3. Each one goes to the eligible group with the lowest running cost,
//!    ties going to the lowest group index
//! 4. Group members are sorted by identifier for output

use tracing::{debug, info, instrument};

use testsplit_shared::{GroupSummary, GroupingSummary, Result, TestSplitError, WeightedItem};

use crate::matcher::Matcher;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Constraints applied on top of cost balancing.
#[derive(Debug, Default)]
pub struct GroupOptions {
    /// Pinning matchers, applied in order. Matches go to group 0.
    pub single_process: Vec<Box<dyn Matcher>>,
    /// Keep group 0 out of the general fill so it only runs pinned artifacts.
    pub isolate: bool,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pinning matcher.
    pub fn pin(mut self, matcher: impl Matcher + 'static) -> Self {
        self.single_process.push(Box::new(matcher));
        self
    }

    pub fn with_isolation(mut self, isolate: bool) -> Self {
        self.isolate = isolate;
        self
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// The finished grouping: one sorted artifact list per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    groups: Vec<Vec<String>>,
    summary: GroupingSummary,
}

impl Partition {
    /// Number of groups, including empty ones.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&[String]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    /// Members and total cost of every group, for reporting.
    pub fn summary(&self) -> &GroupingSummary {
        &self.summary
    }

    pub fn into_groups(self) -> Vec<Vec<String>> {
        self.groups
    }
}

/// Running state of one group while filling.
#[derive(Debug, Default)]
struct Group {
    items: Vec<String>,
    cost: f64,
}

impl Group {
    fn add(&mut self, item: WeightedItem) {
        self.cost += item.cost.value();
        self.items.push(item.id);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Split `items` into `num_groups` cost-balanced groups.
///
/// Always returns exactly `num_groups` groups; surplus groups stay empty.
/// Fails before doing any work if `num_groups` is zero, if isolation leaves
/// no group to fill, or if a cost is negative or not finite.
#[instrument(skip_all, fields(items = items.len(), num_groups, isolate = options.isolate))]
pub fn partition(
    items: Vec<WeightedItem>,
    num_groups: usize,
    options: &GroupOptions,
) -> Result<Partition> {
    validate(&items, num_groups, options)?;

    let mut groups: Vec<Group> = (0..num_groups).map(|_| Group::default()).collect();

    let mut pool = items;
    for matcher in &options.single_process {
        let (pinned, rest): (Vec<_>, Vec<_>) =
            pool.into_iter().partition(|item| matcher.matches(&item.id));
        debug!(?matcher, pinned = pinned.len(), "pinned artifacts to group 0");
        for item in pinned {
            groups[0].add(item);
        }
        pool = rest;
    }

    let first_eligible = usize::from(options.isolate);

    largest_first(&mut pool);
    for item in pool {
        let target = first_eligible + smallest_group(&groups[first_eligible..]);
        groups[target].add(item);
    }

    let partition = finalize(groups);
    info!(
        groups = partition.len(),
        spread = partition.summary.spread(),
        "grouping complete"
    );
    Ok(partition)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check a group count before any estimation or grouping work starts.
pub fn check_group_count(num_groups: usize, isolate: bool) -> Result<()> {
    if num_groups == 0 {
        return Err(TestSplitError::validation("number of groups must be at least 1"));
    }
    if isolate && num_groups < 2 {
        return Err(TestSplitError::validation(format!(
            "isolation needs at least 2 groups, got {num_groups}"
        )));
    }
    Ok(())
}

fn validate(items: &[WeightedItem], num_groups: usize, options: &GroupOptions) -> Result<()> {
    check_group_count(num_groups, options.isolate)?;
    if let Some(bad) = items
        .iter()
        .find(|item| !(item.cost.value().is_finite() && item.cost.value() >= 0.0))
    {
        return Err(TestSplitError::validation(format!(
            "cost of '{}' must be a non-negative number, got {}",
            bad.id,
            bad.cost.value()
        )));
    }
    Ok(())
}

/// Stable sort by descending cost; equal costs keep their input order.
fn largest_first(items: &mut [WeightedItem]) {
    items.sort_by(|a, b| b.cost.value().total_cmp(&a.cost.value()));
}

/// Index of the cheapest group, the lowest index on ties.
fn smallest_group(groups: &[Group]) -> usize {
    groups
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cost.total_cmp(&b.cost))
        .map_or(0, |(index, _)| index)
}

fn finalize(groups: Vec<Group>) -> Partition {
    let mut sorted = Vec::with_capacity(groups.len());
    let mut summary = Vec::with_capacity(groups.len());

    for (index, mut group) in groups.into_iter().enumerate() {
        group.items.sort();
        summary.push(GroupSummary {
            index,
            items: group.items.clone(),
            total_cost: group.cost,
        });
        sorted.push(group.items);
    }

    Partition {
        groups: sorted,
        summary: GroupingSummary { groups: summary },
    }
}
