// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default [`Writer`] implementation.

use std::{io, ops::Deref, str::FromStr};

use itertools::Itertools as _;
use smart_default::SmartDefault;

use super::{
    out::{indent, Styles, WriteStrExt as _},
    Outputted, Writer,
};
use crate::{
    tree::{ColorTag, Lineage, ScenarioId},
    Event, Feature, ScenarioContext, Status, Step, Story,
};

/// CLI options of a [`Basic`] [`Writer`].
#[derive(Clone, Copy, Debug, SmartDefault, clap::Args)]
#[group(skip)]
pub struct Cli {
    /// Coloring policy for a console output.
    #[arg(long, value_name = "auto|always|never", default_value = "auto", global = true)]
    #[default(Coloring::Auto)]
    pub color: Coloring,

    /// Outputs every step as soon as it finishes, prefixed with the ID of
    /// its scenario.
    #[arg(long, global = true)]
    pub realtime_steps: bool,
}

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] to decide, whether output should
    /// be colored.
    Auto,

    /// Forcing of a colored output.
    Always,

    /// Forcing of a non-colored output.
    Never,
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

/// Default [`Writer`] implementation, outputting a colored tree of every
/// rolled up root node.
///
/// A [`Feature`] is rendered with all its direct [`Scenario`]s and
/// [`Story`]s, a [`Story`] with all its [`Scenario`]s, each level indented
/// with a tab. Nested nodes are only rendered as a part of their root.
///
/// [`Scenario`]: crate::Scenario
#[derive(Debug)]
pub struct Basic<Out: io::Write = io::Stdout> {
    /// [`io::Write`] implementor to output into.
    output: Out,

    /// [`Styles`] of the output.
    styles: Styles,

    /// Whether [`Event::Step`]s are output as they arrive.
    realtime_steps: bool,
}

impl Basic {
    /// Creates a new [`Basic`] [`Writer`] outputting into [`io::Stdout`].
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), &Cli::default())
    }
}

impl<Out: io::Write> Basic<Out> {
    /// Creates a new [`Basic`] [`Writer`] outputting into the given `output`
    /// according to the given [`Cli`] options.
    #[must_use]
    pub fn new(output: Out, cli: &Cli) -> Self {
        let mut styles = Styles::new();
        styles.apply_coloring(cli.color);
        Self { output, styles, realtime_steps: cli.realtime_steps }
    }

    /// Returns the output of this [`Basic`] [`Writer`].
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    /// Renders the given [`Feature`] along with all its children.
    #[must_use]
    pub fn feature_text(&self, feature: &Feature) -> String {
        let header = format!("Feature {}: {}", feature.id(), feature.name());
        let head = self.composite_text(
            header,
            feature.narrative().lines(),
            feature.status(),
            "No scenarios or stories found",
        );

        let scenarios = feature
            .scenario_contexts()
            .iter()
            .map(|ctx| indent(&self.scenario_text(ctx), 1));
        let stories = feature
            .stories()
            .iter()
            .map(|story| indent(&self.story_text(story), 1));

        std::iter::once(head).chain(scenarios).chain(stories).join("\n")
    }

    /// Renders the given [`Story`] along with all its [`Scenario`]s.
    ///
    /// [`Scenario`]: crate::Scenario
    #[must_use]
    pub fn story_text(&self, story: &Story) -> String {
        let header = story.feature_id().map_or_else(
            || format!("Story {}: {}", story.id(), story.name()),
            |f| format!("Feature {f} - Story {}: {}", story.id(), story.name()),
        );
        let head = self.composite_text(
            header,
            story.narrative().lines(),
            story.status(),
            "No scenarios found",
        );

        let scenarios = story
            .scenario_contexts()
            .iter()
            .map(|ctx| indent(&self.scenario_text(ctx), 1));

        std::iter::once(head).chain(scenarios).join("\n")
    }

    /// Renders the [`Scenario`] of the given [`ScenarioContext`] along with
    /// its [`Step`]s.
    ///
    /// [`Scenario`]: crate::Scenario
    #[must_use]
    pub fn scenario_text(&self, ctx: &ScenarioContext) -> String {
        let scenario = ctx.scenario();
        let header = format!(
            "{}: {}",
            self.styles.tagged(scenario.color(), scenario_header(ctx.id(), ctx.lineage())),
            self.styles.header(scenario.name()),
        );

        std::iter::once(header)
            .chain(scenario.steps().iter().map(|step| self.step_text(step, 1)))
            .join("\n")
    }

    /// Renders the given [`Step`] indented by `depth` tabs.
    #[must_use]
    pub fn step_text(&self, step: &Step, depth: usize) -> String {
        let text = match (step.status(), step.status().label()) {
            (Status::Error, _) | (_, None) => step.text(),
            (_, Some(label)) => format!("{}: {label}", step.text()),
        };
        self.styles.status(step.status(), indent(&text, depth)).into_owned()
    }

    /// Renders the header of a [`Feature`] or a [`Story`] followed by its
    /// narrative, colored according to its [`Status`].
    fn composite_text(
        &self,
        header: String,
        narrative: impl Iterator<Item = String>,
        status: Status,
        no_children: &str,
    ) -> String {
        let header = match status {
            Status::None => header,
            Status::Passed => format!("{header}: PASSED"),
            Status::FailedNoChildren => format!("{header}: FAILED - {no_children}"),
            Status::Cancelled | Status::Failed | Status::Error => {
                format!("{header}: FAILED")
            }
        };
        let text = std::iter::once(header).chain(narrative).join("\n");
        self.styles.status(status, text).into_owned()
    }

    /// Outputs the given [`Step`] of a running [`Scenario`].
    ///
    /// [`Scenario`]: crate::Scenario
    fn realtime_step(&mut self, id: &ScenarioId, color: ColorTag, step: &Step) -> io::Result<()> {
        let line = format!(
            "{}: {}",
            self.styles.tagged(color, id.as_str()),
            self.step_text(step, 0),
        );
        self.output.write_line(line)
    }
}

impl<Out: io::Write> Writer for Basic<Out> {
    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        let text = match event {
            Event::Started { .. } => return Ok(()),
            Event::Step { scenario_id, color, step } => {
                return if self.realtime_steps {
                    self.realtime_step(scenario_id, *color, step)
                } else {
                    Ok(())
                };
            }
            Event::Scenario(ctx) if ctx.lineage().depth() == 0 => self.scenario_text(ctx),
            Event::Story(story) if story.feature_id().is_none() => self.story_text(story),
            Event::Feature(feature) => self.feature_text(feature),
            Event::Scenario(_) | Event::Story(_) => return Ok(()),
            Event::Finished => return self.output.flush(),
        };
        self.output.write_line(text)
    }
}

impl<Out: io::Write> Outputted for Basic<Out> {
    fn styles(&self) -> &Styles {
        &self.styles
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.output.write_line(text)
    }
}

impl<Out: io::Write> Deref for Basic<Out> {
    type Target = Styles;

    fn deref(&self) -> &Self::Target {
        &self.styles
    }
}

/// Returns the header of a [`Scenario`] listing its parents.
///
/// [`Scenario`]: crate::Scenario
fn scenario_header(id: &ScenarioId, lineage: &Lineage) -> String {
    lineage
        .feature_id
        .as_ref()
        .map(|f| format!("Feature {f}"))
        .into_iter()
        .chain(lineage.story_id.as_ref().map(|s| format!("Story {s}")))
        .chain(std::iter::once(format!("Scenario {id}")))
        .join(" - ")
}
