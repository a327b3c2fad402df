// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Scenario`] definition and its execution state machine.

use std::hash::{Hash as _, Hasher as _};

use super::{
    step::{Failure, IntoVerdict, Keyword, Step},
    Lineage, ScenarioId,
};
use crate::Status;

/// Tag visually grouping all the [`Step`]s of the same [`Scenario`] in a
/// report.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ColorTag(u8);

impl ColorTag {
    /// Number of distinct [`ColorTag`]s.
    pub const COUNT: u8 = 6;

    /// Creates a new [`ColorTag`], wrapping the given index into the
    /// available range.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index % Self::COUNT)
    }

    /// Derives a stable [`ColorTag`] out of a [`ScenarioId`].
    #[must_use]
    pub fn of(id: &ScenarioId) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        id.as_str().hash(&mut hasher);
        Self::new((hasher.finish() % u64::from(Self::COUNT)) as u8)
    }

    /// Returns the index of this [`ColorTag`].
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Ordered sequence of [`Step`]s checking one behavior.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// ID of this [`Scenario`].
    id: ScenarioId,

    /// Name of this [`Scenario`].
    name: String,

    /// [`Step`]s of this [`Scenario`], in execution order.
    steps: Vec<Step>,

    /// Outcome of this [`Scenario`].
    status: Status,

    /// Whether [`Step`]s following a broken one are cancelled.
    cancel_on_issue: bool,

    /// Explicitly set [`ColorTag`] of this [`Scenario`]'s [`Step`]s.
    color: Option<ColorTag>,

    /// Parents of this [`Scenario`].
    lineage: Lineage,
}

impl Scenario {
    /// Starts building a new [`Scenario`] with the given `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    /// Returns the ID of this [`Scenario`].
    #[must_use]
    pub const fn id(&self) -> &ScenarioId {
        &self.id
    }

    /// Returns the name of this [`Scenario`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the [`Step`]s of this [`Scenario`].
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the [`Status`] of this [`Scenario`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Indicates whether [`Step`]s following a broken one are cancelled.
    #[must_use]
    pub const fn cancel_on_issue(&self) -> bool {
        self.cancel_on_issue
    }

    /// Returns the [`ColorTag`] of this [`Scenario`], derived from its ID
    /// unless set explicitly.
    #[must_use]
    pub fn color(&self) -> ColorTag {
        self.color.unwrap_or_else(|| ColorTag::of(&self.id))
    }

    /// Returns the parents of this [`Scenario`].
    #[must_use]
    pub const fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Executes all the [`Step`]s, returning the resolved [`Scenario`].
    #[must_use]
    pub fn run(&self) -> Self {
        self.run_observed(|_| {})
    }

    /// Executes all the [`Step`]s sequentially, reporting each resolved
    /// [`Step`] to `on_step` as soon as it finishes.
    ///
    /// Once a [`Step`] resolves to an issue ([`Status::is_issue()`]), every
    /// following [`Step`] is cancelled without running, if
    /// [`Scenario::cancel_on_issue()`] is set. The first issue decides the
    /// resulting [`Status`]: [`Status::Error`] for an error,
    /// [`Status::Failed`] otherwise.
    #[must_use]
    pub fn run_observed(&self, mut on_step: impl FnMut(&Step)) -> Self {
        let mut previous = None;
        let mut status = Status::Passed;

        let steps = self
            .steps
            .iter()
            .map(|step| {
                let cancel = self.cancel_on_issue
                    && previous.is_some_and(Status::is_issue);
                let step = if cancel { step.cancel() } else { step.run() };
                on_step(&step);

                if status == Status::Passed {
                    status = match step.status() {
                        Status::Error => Status::Error,
                        Status::Failed | Status::Cancelled => Status::Failed,
                        _ => Status::Passed,
                    };
                }
                previous = Some(step.status());
                step
            })
            .collect();

        Self { steps, status, ..self.clone() }
    }

    /// Places this [`Scenario`] under the given `id` and [`Lineage`].
    pub(crate) fn placed(self, id: ScenarioId, lineage: Lineage) -> Self {
        Self { id, lineage, ..self }
    }

    /// Appends an errored [`Step`] describing a failed `hook`.
    ///
    /// An already broken [`Scenario`] keeps its [`Status`].
    pub(crate) fn with_hook_failure(mut self, hook: &str, failure: Failure) -> Self {
        self.steps.push(Step::errored(format!("{hook} hook"), failure));
        if !self.status.is_issue() {
            self.status = Status::Error;
        }
        self
    }
}

/// Builder of a [`Scenario`].
#[derive(Debug)]
pub struct ScenarioBuilder {
    /// ID of the [`Scenario`], generated if not set.
    id: Option<ScenarioId>,

    /// Name of the [`Scenario`].
    name: String,

    /// [`Step`]s of the [`Scenario`].
    steps: Vec<Step>,

    /// [`Status`] of the [`Scenario`].
    status: Status,

    /// Whether [`Step`]s following a broken one are cancelled.
    cancel_on_issue: bool,

    /// [`ColorTag`] of the [`Scenario`], derived from its ID if not set.
    color: Option<ColorTag>,
}

impl ScenarioBuilder {
    /// Creates a new [`ScenarioBuilder`].
    fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            steps: Vec::new(),
            status: Status::Passed,
            cancel_on_issue: true,
            color: None,
        }
    }

    /// Sets the ID of the [`Scenario`].
    #[must_use]
    pub fn id(mut self, id: impl Into<ScenarioId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the initial [`Status`] of the [`Scenario`].
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets whether [`Step`]s following a broken one are cancelled.
    ///
    /// Enabled by default.
    #[must_use]
    pub const fn cancel_on_issue(mut self, enabled: bool) -> Self {
        self.cancel_on_issue = enabled;
        self
    }

    /// Sets the [`ColorTag`] of the [`Scenario`].
    #[must_use]
    pub const fn color(mut self, color: ColorTag) -> Self {
        self.color = Some(color);
        self
    }

    /// Appends the given [`Step`].
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a [`Step`] prefixed with the given [`Keyword`].
    #[must_use]
    pub fn keyword<F, R>(self, keyword: Keyword, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.step(Step::new(format!("{keyword} {}", text.as_ref()), action))
    }

    /// Appends a [`Keyword::Given`] [`Step`].
    #[must_use]
    pub fn given<F, R>(self, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.keyword(Keyword::Given, text, action)
    }

    /// Appends a [`Keyword::And`] [`Step`].
    #[must_use]
    pub fn and<F, R>(self, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.keyword(Keyword::And, text, action)
    }

    /// Appends a [`Keyword::When`] [`Step`].
    #[must_use]
    pub fn when<F, R>(self, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.keyword(Keyword::When, text, action)
    }

    /// Appends a [`Keyword::Then`] [`Step`].
    #[must_use]
    pub fn then<F, R>(self, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.keyword(Keyword::Then, text, action)
    }

    /// Appends a [`Keyword::But`] [`Step`].
    #[must_use]
    pub fn but<F, R>(self, text: impl AsRef<str>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        self.keyword(Keyword::But, text, action)
    }

    /// Builds the [`Scenario`].
    #[must_use]
    pub fn build(self) -> Scenario {
        Scenario {
            id: self.id.unwrap_or_else(ScenarioId::generate),
            color: self.color,
            name: self.name,
            steps: self.steps,
            status: self.status,
            cancel_on_issue: self.cancel_on_issue,
            lineage: Lineage::default(),
        }
    }
}
