// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable snapshots of a [`Feature`] > [`Story`] > [`Scenario`] >
//! [`Step`] tree.
//!
//! Every node is a value: running or rolling it up builds a new node and
//! never touches the one already referenced elsewhere. Parents own their
//! children, while children only carry a [`Lineage`] of their parents' IDs.

mod context;
mod feature;
pub mod id;
mod scenario;
pub mod step;
mod story;

use derive_more::with_trait::Display;

use crate::{status, Status};

#[doc(inline)]
pub use self::{
    context::{Hook, ScenarioContext, ScenarioFactory},
    feature::{Feature, FeatureBuilder},
    id::{FeatureId, ScenarioId, StoryId},
    scenario::{ColorTag, Scenario, ScenarioBuilder},
    step::{IntoVerdict, Keyword, Step, Verdict},
    story::{Story, StoryBuilder},
};

/// Non-owning back-references of a [`ScenarioContext`] (or a [`Scenario`])
/// to its parents, used for routing its result during a rollup.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Lineage {
    /// ID of the [`Feature`] this node belongs to, if any.
    pub feature_id: Option<FeatureId>,

    /// ID of the [`Story`] this node belongs to, if any.
    pub story_id: Option<StoryId>,
}

impl Lineage {
    /// Number of parents referenced by this [`Lineage`].
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.feature_id.is_some() as usize + self.story_id.is_some() as usize
    }
}

/// Business value of a [`Feature`] or a [`Story`].
///
/// Rendered as:
/// ```text
/// In order to <in_order_to>
/// As a <as_a>
/// I <i_want>
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Narrative {
    /// Benefit the node provides.
    pub in_order_to: Option<String>,

    /// Role benefiting from the node.
    pub as_a: Option<String>,

    /// Desired capability, continuing the "I" pronoun.
    pub i_want: Option<String>,
}

impl Narrative {
    /// Creates a new complete [`Narrative`].
    #[must_use]
    pub fn new(
        in_order_to: impl Into<String>,
        as_a: impl Into<String>,
        i_want: impl Into<String>,
    ) -> Self {
        Self {
            in_order_to: Some(in_order_to.into()),
            as_a: Some(as_a.into()),
            i_want: Some(i_want.into()),
        }
    }

    /// Indicates whether this [`Narrative`] has nothing to render.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.in_order_to.is_none() && self.as_a.is_none() && self.i_want.is_none()
    }

    /// Returns the lines of this [`Narrative`] to be rendered.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        [
            self.in_order_to.as_deref().map(|s| format!("In order to {s}")),
            self.as_a.as_deref().map(|s| format!("As a {s}")),
            self.i_want.as_deref().map(|s| format!("I {s}")),
        ]
        .into_iter()
        .flatten()
    }
}

/// Kind of a tree node a [`Loader`] may produce.
///
/// [`Loader`]: crate::Loader
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ComponentKind {
    /// [`Feature`].
    #[display("feature")]
    Feature,

    /// [`Story`].
    #[display("story")]
    Story,

    /// [`ScenarioContext`].
    #[display("scenario")]
    Scenario,
}

impl ComponentKind {
    /// Plural name of this [`ComponentKind`].
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Feature => "features",
            Self::Story => "stories",
            Self::Scenario => "scenarios",
        }
    }
}

/// Derives the [`Status`] of a composite node out of its children's ones.
///
/// Having no children, the node keeps its `explicit` [`Status`], or becomes
/// [`Status::FailedNoChildren`] without one.
pub(crate) fn derive_status(
    children: impl IntoIterator<Item = Status>,
    explicit: Option<Status>,
) -> Status {
    let mut children = children.into_iter().peekable();
    if children.peek().is_none() {
        explicit.unwrap_or(Status::FailedNoChildren)
    } else {
        status::aggregate(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_status_of_composites() {
        assert_eq!(derive_status([], None), Status::FailedNoChildren);
        assert_eq!(derive_status([], Some(Status::Passed)), Status::Passed);
        assert_eq!(
            derive_status([Status::Passed, Status::FailedNoChildren], Some(Status::Passed)),
            Status::Failed,
        );
        assert_eq!(derive_status([Status::None], None), Status::None);
    }

    #[test]
    fn narrative_lines() {
        let narrative = Narrative::new("ship faster", "developer", "want green builds");
        assert_eq!(
            narrative.lines().collect::<Vec<_>>(),
            ["In order to ship faster", "As a developer", "I want green builds"],
        );
        assert!(Narrative::default().is_empty());
        assert_eq!(Narrative::default().lines().count(), 0);
    }

    #[test]
    fn lineage_depth() {
        assert_eq!(Lineage::default().depth(), 0);
        let lineage = Lineage {
            feature_id: Some(FeatureId::from("f")),
            story_id: Some(StoryId::from("s")),
        };
        assert_eq!(lineage.depth(), 2);
    }

    #[test]
    fn component_kind_names() {
        assert_eq!(ComponentKind::Story.to_string(), "story");
        assert_eq!(ComponentKind::Story.plural(), "stories");
        assert_eq!(ComponentKind::Scenario.plural(), "scenarios");
    }
}
