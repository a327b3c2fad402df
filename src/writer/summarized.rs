// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Writer`]-wrapper for collecting a summary of execution.

use std::io;

use super::{Outputted, Stats, Writer};
use crate::Event;

/// Wrapper for a [`Writer`] outputting an execution summary once the run is
/// [`Event::Finished`].
///
/// ```text
/// [Summary]
/// 1 feature (1 failed)
/// 2 stories (1 passed, 1 failed)
/// 2 scenarios (1 passed, 1 failed)
/// 5 steps (3 passed, 1 failed, 1 cancelled)
/// ```
#[derive(Clone, Debug)]
pub struct Summarized<W> {
    /// Original [`Writer`] to summarize output of.
    writer: W,

    /// Collected [`Stats`].
    stats: Stats,
}

impl<W> Summarized<W> {
    /// Wraps the given [`Writer`] into a new [`Summarized`] one.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer, stats: Stats::default() }
    }

    /// Returns the [`Stats`] collected so far.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns the original [`Writer`] of this [`Summarized`] one.
    #[must_use]
    pub fn inner_writer(&self) -> &W {
        &self.writer
    }

    /// Unwraps the original [`Writer`] of this [`Summarized`] one.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Outputted> Summarized<W> {
    /// Renders the collected [`Stats`].
    fn summary(&self) -> String {
        let styles = self.writer.styles();
        let stats = self.stats.to_string();
        let stats = if self.stats.execution_has_failed() {
            styles.err(stats)
        } else {
            styles.ok(stats)
        };
        format!("{}\n{stats}", styles.bold("[Summary]"))
    }
}

impl<W: Outputted> Writer for Summarized<W> {
    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        self.stats.record(event);
        if matches!(event, Event::Finished) {
            let summary = self.summary();
            self.writer.write_text(&summary)?;
        }
        self.writer.handle_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        writer::{out::WritableString, Basic, Cli, Coloring, Ext as _},
        Feature, Scenario, ScenarioContext,
    };

    #[test]
    fn outputs_summary_on_finish() {
        let cli = Cli { color: Coloring::Never, realtime_steps: false };
        let mut writer = Basic::new(WritableString::default(), &cli).summarized();

        let ctx = ScenarioContext::of(
            Scenario::builder("s").id("sc").given("fails", || false).build(),
        );
        let feature = Feature::builder("F").id("f").scenario(ctx).build();
        let ran = feature.with_scenario_contexts(
            feature.scenario_contexts().iter().map(ScenarioContext::run).collect(),
        );

        writer.handle_event(&Event::Feature(ran)).unwrap();
        writer.handle_event(&Event::Finished).unwrap();

        assert_eq!(writer.stats().features.failed, 1);
        let out = writer.into_inner().into_inner().0;
        assert!(out.ends_with("[Summary]\n1 feature (1 failed)\n"), "{out}");
    }
}
