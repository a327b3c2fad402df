// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outcome lattice of every node in a [`tree`].
//!
//! [`Status`] is a closed set of tags ordered from the weakest to the
//! strongest:
//!
//! ```text
//! none < passed < cancelled < failed_no_children < failed < error
//! ```
//!
//! The order is exposed only through [`compare()`], [`strongest()`] and
//! [`aggregate()`]. [`Status`] implements neither [`PartialOrd`] nor [`Ord`].
//!
//! [`tree`]: crate::tree

use std::{cmp::Ordering, fmt, str::FromStr};

use crate::error::ConfigError;

/// Outcome of a [`Step`], [`Scenario`], [`Story`] or [`Feature`].
///
/// [`Feature`]: crate::Feature
/// [`Scenario`]: crate::Scenario
/// [`Step`]: crate::Step
/// [`Story`]: crate::Story
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Status {
    /// Not executed yet.
    #[default]
    None,

    /// Executed successfully.
    Passed,

    /// Skipped because of an issue in a preceding [`Step`].
    ///
    /// [`Step`]: crate::Step
    Cancelled,

    /// Node expected to have children, but none were found.
    FailedNoChildren,

    /// Executed and failed.
    Failed,

    /// Execution raised an error.
    Error,
}

impl Status {
    /// All the [`Status`] tags, from the weakest to the strongest.
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::Passed,
        Self::Cancelled,
        Self::FailedNoChildren,
        Self::Failed,
        Self::Error,
    ];

    /// Position of this [`Status`] in the lattice.
    const fn strength(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Passed => 1,
            Self::Cancelled => 2,
            Self::FailedNoChildren => 3,
            Self::Failed => 4,
            Self::Error => 5,
        }
    }

    /// Snake-case tag of this [`Status`].
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Passed => "passed",
            Self::Cancelled => "cancelled",
            Self::FailedNoChildren => "failed_no_children",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    /// Suffix rendered after a node's header in a report, if any.
    #[must_use]
    pub const fn label(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Passed => Some("PASSED"),
            Self::Cancelled => Some("CANCELLED"),
            Self::FailedNoChildren | Self::Failed => Some("FAILED"),
            Self::Error => Some("ERROR"),
        }
    }

    /// Indicates whether this [`Status`] breaks a [`Scenario`], so that the
    /// following [`Step`]s may be cancelled.
    ///
    /// [`Scenario`]: crate::Scenario
    /// [`Step`]: crate::Step
    #[must_use]
    pub const fn is_issue(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed | Self::Error)
    }

    /// Indicates whether this [`Status`] is reported as a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::FailedNoChildren | Self::Failed | Self::Error)
    }

    /// Shortcut for [`compare()`].
    #[must_use]
    pub fn compare(self, other: Self) -> Ordering {
        compare(self, other)
    }

    /// Shortcut for [`strongest()`].
    #[must_use]
    pub fn strongest(self, other: Self) -> Self {
        strongest(self, other)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Status {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.tag() == s)
            .ok_or_else(|| ConfigError::invalid_status(s))
    }
}

/// Compares two [`Status`]es by their position in the lattice.
#[must_use]
pub fn compare(a: Status, b: Status) -> Ordering {
    a.strength().cmp(&b.strength())
}

/// Returns the stronger of two [`Status`]es.
///
/// On a tie either operand is returned, as equal tags are identical.
#[must_use]
pub fn strongest(a: Status, b: Status) -> Status {
    match compare(a, b) {
        Ordering::Less => b,
        Ordering::Equal | Ordering::Greater => a,
    }
}

/// Derives the [`Status`] of a composite node out of its children ones.
///
/// Returns [`Status::None`] for no children. A resulting
/// [`Status::FailedNoChildren`] is reported as an ordinary
/// [`Status::Failed`] one level up.
#[must_use]
pub fn aggregate<I>(children: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    match children.into_iter().reduce(strongest) {
        None => Status::None,
        Some(Status::FailedNoChildren) => Status::Failed,
        Some(st) => st,
    }
}

#[cfg(test)]
mod tests {
    use itertools::iproduct;

    use super::*;

    #[test]
    fn compare_is_a_total_order() {
        for (a, b) in iproduct!(Status::ALL, Status::ALL) {
            let ab = compare(a, b);
            assert_eq!(ab, compare(b, a).reverse(), "{a} vs {b}");
            if ab == Ordering::Equal {
                assert_eq!(a, b);
            }
        }
        for (a, b, c) in iproduct!(Status::ALL, Status::ALL, Status::ALL) {
            if compare(a, b).is_le() && compare(b, c).is_le() {
                assert!(compare(a, c).is_le(), "{a} <= {b} <= {c}");
            }
        }
    }

    #[test]
    fn order_follows_lattice() {
        for pair in Status::ALL.windows(2) {
            assert_eq!(compare(pair[0], pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn strongest_is_commutative_and_associative() {
        for (a, b) in iproduct!(Status::ALL, Status::ALL) {
            assert_eq!(strongest(a, b), strongest(b, a));
        }
        for (a, b, c) in iproduct!(Status::ALL, Status::ALL, Status::ALL) {
            assert_eq!(
                strongest(strongest(a, b), c),
                strongest(a, strongest(b, c)),
            );
        }
    }

    #[test]
    fn aggregate_of_nothing_is_none() {
        assert_eq!(aggregate([]), Status::None);
    }

    #[test]
    fn error_dominates_aggregate() {
        for (a, b) in iproduct!(Status::ALL, Status::ALL) {
            assert_eq!(aggregate([a, Status::Error, b]), Status::Error);
        }
    }

    #[test]
    fn no_children_becomes_failed_one_level_up() {
        assert_eq!(aggregate([Status::FailedNoChildren]), Status::Failed);
        assert_eq!(
            aggregate([Status::Passed, Status::FailedNoChildren]),
            Status::Failed,
        );
        assert_eq!(aggregate([Status::Passed, Status::Cancelled]), Status::Cancelled);
    }

    #[test]
    fn parses_own_tags() {
        for st in Status::ALL {
            assert_eq!(st.tag().parse::<Status>().ok(), Some(st));
        }
        assert!("skipped".parse::<Status>().is_err());
    }
}
