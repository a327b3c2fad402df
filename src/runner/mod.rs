// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of trees.
//!
//! [`Runner::run_with()`] executes every leaf [`ScenarioContext`] on its own
//! OS thread, at most [`Runner::max_concurrent_scenarios()`] at once. The
//! threads share nothing: each one reports its [`Step`]s and its resolved
//! [`ScenarioContext`] over a channel to a single coordinator, which folds
//! them into their parents with a [`Rollup`] and passes the resulting
//! [`Event`]s to a [`Writer`].
//!
//! There are no timeouts: a hung [`Step`] blocks its thread, and the run
//! never finishes.

mod cli;
pub mod rollup;

use std::thread;

use futures::{channel::mpsc, StreamExt as _};
use smart_default::SmartDefault;

use crate::{
    error::{Error, Result},
    writer::{Discard, Writer},
    Event, Feature, Scenario, ScenarioContext, Step, Story,
};

#[doc(inline)]
pub use self::{
    cli::Cli,
    rollup::{Rollup, Tree},
};

/// Executes the given [`ScenarioContext`] on the current thread, returning
/// the resolved one.
#[must_use]
pub fn run_scenario(ctx: &ScenarioContext) -> ScenarioContext {
    ctx.run()
}

/// Executor of trees, rolling up outcomes of the [`Scenario`]s into their
/// [`Story`]s and [`Feature`]s.
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Runner {
    /// Maximum number of concurrently executed [`Scenario`]s.
    ///
    /// [`Scenario`]: crate::Scenario
    #[default(Some(64))]
    max_concurrent_scenarios: Option<usize>,
}

impl Runner {
    /// Creates a new [`Runner`] with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// If `max` is [`Some`], then number of concurrently executed
    /// [`Scenario`]s will be limited.
    ///
    /// [`Scenario`]: crate::Scenario
    #[must_use]
    pub fn max_concurrent_scenarios(mut self, max: impl Into<Option<usize>>) -> Self {
        self.max_concurrent_scenarios = max.into();
        self
    }

    /// Applies the given [`Cli`] options, overriding the ones set
    /// programmatically.
    #[must_use]
    pub fn with_cli(self, cli: &Cli) -> Self {
        match cli.concurrency {
            Some(max) => self.max_concurrent_scenarios(max),
            None => self,
        }
    }

    /// Initializes a global [`tracing::Subscriber`] outputting events of
    /// [`tracing::Level::INFO`] and above.
    ///
    /// Does nothing if a global [`tracing::Subscriber`] is set already.
    #[cfg(feature = "tracing")]
    #[must_use]
    pub fn init_tracing(self) -> Self {
        use tracing_subscriber::{
            filter::LevelFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _,
            Layer as _,
        };

        drop(
            tracing_subscriber::registry()
                .with(LevelFilter::INFO.and_then(tracing_subscriber::fmt::layer()))
                .try_init(),
        );
        self
    }

    /// Number of [`Scenario`]s allowed to execute at once.
    ///
    /// [`Scenario`]: crate::Scenario
    fn concurrency(&self) -> usize {
        self.max_concurrent_scenarios.map_or(usize::MAX, |max| max.max(1))
    }

    /// Runs the given roots concurrently, discarding all the [`Event`]s.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with()`].
    pub async fn run(&self, roots: impl IntoIterator<Item = Tree>) -> Result<Vec<Tree>> {
        self.run_with(roots, &mut Discard).await
    }

    /// Runs the given [`Feature`] concurrently, returning the resolved one.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with()`].
    pub async fn run_feature(&self, feature: Feature) -> Result<Feature> {
        let trees = self.run([Tree::Feature(feature)]).await?;
        trees.into_iter().next().and_then(Tree::into_feature).ok_or(Error::Interrupted)
    }

    /// Runs the given standalone [`Story`] concurrently, returning the
    /// resolved one.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with()`].
    pub async fn run_story(&self, story: Story) -> Result<Story> {
        let trees = self.run([Tree::Story(story)]).await?;
        trees.into_iter().next().and_then(Tree::into_story).ok_or(Error::Interrupted)
    }

    /// Runs all the given [`Feature`]s concurrently, returning the resolved
    /// ones in the same order.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with()`].
    pub async fn run_features(
        &self,
        features: impl IntoIterator<Item = Feature>,
    ) -> Result<Vec<Feature>> {
        let trees = self.run(features.into_iter().map(Tree::Feature)).await?;
        trees.into_iter().map(|t| t.into_feature().ok_or(Error::Interrupted)).collect()
    }

    /// Runs the given roots concurrently, passing every [`Event`] to the
    /// given [`Writer`], and returns the resolved roots in their original
    /// order.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the roots are malformed, before anything is
    ///   executed;
    /// - [`Error::Spawn`] if an execution thread cannot be spawned;
    /// - [`Error::Write`] if the [`Writer`] fails;
    /// - [`Error::Interrupted`] if execution threads ended without reporting
    ///   all the results.
    pub async fn run_with<W: Writer + ?Sized>(
        &self,
        roots: impl IntoIterator<Item = Tree>,
        writer: &mut W,
    ) -> Result<Vec<Tree>> {
        let run = self.coordinate(roots.into_iter().collect(), writer);

        #[cfg(feature = "tracing")]
        let run = tracing::Instrument::instrument(run, tracing::info_span!("run"));

        run.await
    }

    /// Spawns the [`Scenario`] execution threads and folds their results.
    ///
    /// [`Scenario`]: crate::Scenario
    async fn coordinate<W: Writer + ?Sized>(
        &self,
        roots: Vec<Tree>,
        writer: &mut W,
    ) -> Result<Vec<Tree>> {
        let (mut rollup, jobs) = Rollup::plan(roots)?;
        emit(writer, &Event::Started { scenarios: jobs.len() })?;
        for ev in rollup.settle_childless() {
            emit(writer, &ev)?;
        }

        let limit = self.concurrency();
        let (sender, mut receiver) = mpsc::unbounded();
        let mut sender = Some(sender);
        let mut jobs = jobs.into_iter();
        let mut in_flight = 0;

        loop {
            while in_flight < limit {
                let Some(tx) = sender.as_ref() else { break };
                if let Some(ctx) = jobs.next() {
                    spawn_scenario(ctx, tx.clone())?;
                    in_flight += 1;
                } else {
                    // No more jobs: the channel closes once the last thread
                    // finishes.
                    sender = None;
                }
            }
            if in_flight == 0 {
                break;
            }

            match receiver.next().await {
                Some(Event::Scenario(ctx)) => {
                    in_flight -= 1;
                    for ev in rollup.scenario_finished(ctx) {
                        emit(writer, &ev)?;
                    }
                }
                Some(ev) => emit(writer, &ev)?,
                None => return Err(Error::Interrupted),
            }
        }

        emit(writer, &Event::Finished)?;
        rollup.finish().ok_or(Error::Interrupted)
    }

    /// Runs the given roots sequentially on the current thread, discarding
    /// all the [`Event`]s.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with_sync()`].
    pub fn run_sync(&self, roots: impl IntoIterator<Item = Tree>) -> Result<Vec<Tree>> {
        self.run_with_sync(roots, &mut Discard)
    }

    /// Runs the given [`Feature`] sequentially, returning the resolved one.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with_sync()`].
    pub fn run_feature_sync(&self, feature: Feature) -> Result<Feature> {
        let trees = self.run_sync([Tree::Feature(feature)])?;
        trees.into_iter().next().and_then(Tree::into_feature).ok_or(Error::Interrupted)
    }

    /// Runs the given standalone [`Story`] sequentially, returning the
    /// resolved one.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with_sync()`].
    pub fn run_story_sync(&self, story: Story) -> Result<Story> {
        let trees = self.run_sync([Tree::Story(story)])?;
        trees.into_iter().next().and_then(Tree::into_story).ok_or(Error::Interrupted)
    }

    /// Runs all the given [`Feature`]s sequentially, returning the resolved
    /// ones in the same order.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with_sync()`].
    pub fn run_features_sync(
        &self,
        features: impl IntoIterator<Item = Feature>,
    ) -> Result<Vec<Feature>> {
        let trees = self.run_sync(features.into_iter().map(Tree::Feature))?;
        trees.into_iter().map(|t| t.into_feature().ok_or(Error::Interrupted)).collect()
    }

    /// Runs the given roots sequentially on the current thread, in
    /// definition order, passing every [`Event`] to the given [`Writer`].
    ///
    /// Produces the same resolved roots as [`Runner::run_with()`] does.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the roots are malformed, before anything is
    ///   executed;
    /// - [`Error::Write`] if the [`Writer`] fails.
    pub fn run_with_sync<W: Writer + ?Sized>(
        &self,
        roots: impl IntoIterator<Item = Tree>,
        writer: &mut W,
    ) -> Result<Vec<Tree>> {
        #[cfg(feature = "tracing")]
        let _run = tracing::info_span!("run", sync = true).entered();

        let (mut rollup, jobs) = Rollup::plan(roots)?;
        emit(writer, &Event::Started { scenarios: jobs.len() })?;
        for ev in rollup.settle_childless() {
            emit(writer, &ev)?;
        }

        for ctx in jobs {
            #[cfg(feature = "tracing")]
            let _scenario = tracing::info_span!("scenario", id = %ctx.id()).entered();

            let mut failed = None;
            let ran = ctx.run_observed(|scenario, step| {
                if failed.is_none() {
                    failed = writer.handle_event(&step_event(scenario, step)).err();
                }
            });
            if let Some(e) = failed {
                return Err(Error::Write(e));
            }
            for ev in rollup.scenario_finished(ran) {
                emit(writer, &ev)?;
            }
        }

        emit(writer, &Event::Finished)?;
        rollup.finish().ok_or(Error::Interrupted)
    }
}

/// Passes the given [`Event`] to the given [`Writer`].
fn emit<W: Writer + ?Sized>(writer: &mut W, event: &Event) -> Result<()> {
    writer.handle_event(event).map_err(Error::Write)
}

/// Creates an [`Event::Step`] of the given [`Scenario`].
fn step_event(scenario: &Scenario, step: &Step) -> Event {
    Event::Step { scenario_id: scenario.id().clone(), color: scenario.color(), step: step.clone() }
}

/// Executes the given [`ScenarioContext`] on a new thread, reporting its
/// [`Step`]s and the result via the given `sender`.
fn spawn_scenario(ctx: ScenarioContext, sender: mpsc::UnboundedSender<Event>) -> Result<()> {
    let name = format!("scenario-{}", ctx.id());

    #[cfg(feature = "tracing")]
    let span = tracing::info_span!("scenario", id = %ctx.id());

    let handle = thread::Builder::new()
        .name(name)
        .spawn(move || {
            #[cfg(feature = "tracing")]
            let _span = span.entered();

            let ran = ctx.run_observed(|scenario, step| {
                drop(sender.unbounded_send(step_event(scenario, step)));
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(status = %ran.status(), "scenario resolved");

            drop(sender.unbounded_send(Event::Scenario(ran)));
        })
        .map_err(Error::Spawn)?;
    drop(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{tree::ColorTag, ScenarioId, Status};

    fn ctx(id: &str, ok: bool) -> ScenarioContext {
        ScenarioContext::of(
            Scenario::builder(id).id(id).given("setup", || true).then("check", move || ok).build(),
        )
    }

    #[test]
    fn with_cli_overrides_concurrency() {
        let runner = Runner::new().max_concurrent_scenarios(3);
        assert_eq!(runner.concurrency(), 3);
        assert_eq!(runner.with_cli(&Cli::default()).concurrency(), 3);
        let cli = Cli { concurrency: Some(0), select: vec![] };
        assert_eq!(runner.with_cli(&cli).concurrency(), 1);
        assert_eq!(Runner::new().concurrency(), 64);
        assert_eq!(Runner::new().max_concurrent_scenarios(None).concurrency(), usize::MAX);
    }

    #[test]
    fn sync_run_reports_events_in_order() {
        let story = Story::builder("s").id("s").scenarios([ctx("a", true), ctx("b", false)]).build();
        let mut events = Vec::new();

        let trees = Runner::new().run_with_sync([Tree::Story(story)], &mut events).unwrap();

        assert_eq!(trees[0].status(), Status::Failed);
        let kinds = events
            .iter()
            .map(|ev| match ev {
                Event::Started { .. } => "started",
                Event::Step { .. } => "step",
                Event::Scenario(_) => "scenario",
                Event::Story(_) => "story",
                Event::Feature(_) => "feature",
                Event::Finished => "finished",
            })
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            ["started", "step", "step", "scenario", "step", "step", "scenario", "story", "finished"],
        );
    }

    #[test]
    fn sync_run_rejects_duplicates_before_execution() {
        let executed = Arc::new(AtomicUsize::new(0));
        let counted = |id: &str| {
            let executed = Arc::clone(&executed);
            ScenarioContext::of(
                Scenario::builder(id)
                    .id(id)
                    .given("counted", move || {
                        executed.fetch_add(1, Ordering::SeqCst);
                    })
                    .build(),
            )
        };
        let story = Story::builder("s").id("s").scenarios([counted("a"), counted("a")]).build();

        let err = Runner::new().run_story_sync(story).unwrap_err();
        assert!(err.as_config().is_some(), "{err}");
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn step_events_carry_explicit_scenario_color() {
        let derived = ColorTag::of(&ScenarioId::from("painted"));
        let explicit = ColorTag::new(derived.index() + 1);
        let painted = ScenarioContext::of(
            Scenario::builder("painted")
                .id("painted")
                .color(explicit)
                .given("setup", || true)
                .build(),
        );
        let colors = |events: &[Event]| {
            events
                .iter()
                .filter_map(|ev| match ev {
                    Event::Step { color, .. } => Some(*color),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        let mut sync = Vec::new();
        _ = Runner::new().run_with_sync([Tree::Scenario(painted.clone())], &mut sync).unwrap();
        let mut spawned = Vec::new();
        _ = Runner::new().run_with([Tree::Scenario(painted)], &mut spawned).await.unwrap();

        assert_eq!(colors(&sync), [explicit]);
        assert_eq!(colors(&spawned), [explicit]);
    }

    #[test]
    fn run_scenario_resolves_context() {
        let ran = run_scenario(&ctx("x", false));
        assert_eq!(ran.status(), Status::Failed);
    }
}
