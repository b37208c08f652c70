//! Pinning predicates.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

/// Decides whether an artifact identifier is pinned to group 0.
pub trait Matcher: fmt::Debug + Send + Sync {
    fn matches(&self, id: &str) -> bool;
}

/// Unanchored regex search, the usual single-process pattern.
impl Matcher for Regex {
    fn matches(&self, id: &str) -> bool {
        self.is_match(id)
    }
}

/// Matches identifiers containing a fixed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substring(pub String);

impl Matcher for Substring {
    fn matches(&self, id: &str) -> bool {
        id.contains(self.0.as_str())
    }
}

/// Matches an explicit set of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exact(pub BTreeSet<String>);

impl<S: Into<String>> FromIterator<S> for Exact {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Matcher for Exact {
    fn matches(&self, id: &str) -> bool {
        self.0.contains(id)
    }
}

/// Adapts any `Fn(&str) -> bool` closure.
pub struct Predicate<F>(pub F);

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl<F> Matcher for Predicate<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, id: &str) -> bool {
        (self.0)(id)
    }
}
