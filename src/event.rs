// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in the lifecycle of a run.
//!
//! Only completely rolled up nodes are ever carried by an [`Event`]: a
//! [`Story`] or a [`Feature`] is published once all of its children are
//! resolved, never earlier.

use crate::{
    tree::{ColorTag, ScenarioId},
    Feature, ScenarioContext, Status, Step, Story,
};

/// Event emitted by a [`Runner`].
///
/// [`Runner`]: crate::Runner
#[derive(Clone, Debug)]
pub enum Event {
    /// Run started, with the number of [`Scenario`]s to execute.
    ///
    /// [`Scenario`]: crate::Scenario
    Started {
        /// Number of [`Scenario`]s to execute.
        ///
        /// [`Scenario`]: crate::Scenario
        scenarios: usize,
    },

    /// [`Step`] of a running [`Scenario`] finished.
    ///
    /// [`Scenario`]: crate::Scenario
    Step {
        /// ID of the [`Scenario`] the [`Step`] belongs to.
        ///
        /// [`Scenario`]: crate::Scenario
        scenario_id: ScenarioId,

        /// [`ColorTag`] of the [`Scenario`] the [`Step`] belongs to.
        ///
        /// [`Scenario`]: crate::Scenario
        color: ColorTag,

        /// Resolved [`Step`].
        step: Step,
    },

    /// [`ScenarioContext`] resolved.
    Scenario(ScenarioContext),

    /// [`Story`] rolled up.
    Story(Story),

    /// [`Feature`] rolled up.
    Feature(Feature),

    /// Run finished.
    Finished,
}

impl Event {
    /// Returns the [`Status`] of the node carried by this [`Event`], if any.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Started { .. } | Self::Finished => None,
            Self::Step { step, .. } => Some(step.status()),
            Self::Scenario(ctx) => Some(ctx.status()),
            Self::Story(story) => Some(story.status()),
            Self::Feature(feature) => Some(feature.status()),
        }
    }
}
