//! Cost-balanced partitioning of test artifacts into parallel groups.
//!
//! [`partition`] takes `(artifact, cost)` pairs and splits them into a fixed
//! number of groups with a largest-first greedy fill. Artifacts accepted by a
//! pinning [`Matcher`] always land in group 0, which can optionally be
//! isolated from the general fill.

mod matcher;
mod partition;

pub use matcher::{Exact, Matcher, Predicate, Substring};
pub use partition::{GroupOptions, Partition, check_group_count, partition};
