//! Outcome counters of a run.

use std::{fmt, io};

use super::Writer;
use crate::{Event, Status};

/// Numbers of nodes of the same kind, by their outcome.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
    /// Number of passed nodes.
    pub passed: usize,

    /// Number of failed nodes, including the ones without any children.
    pub failed: usize,

    /// Number of cancelled nodes.
    pub cancelled: usize,

    /// Number of errored nodes.
    pub errored: usize,

    /// Number of not executed nodes.
    pub undetermined: usize,
}

impl Counts {
    /// Accounts a node with the given [`Status`].
    pub fn record(&mut self, status: Status) {
        let counter = match status {
            Status::None => &mut self.undetermined,
            Status::Passed => &mut self.passed,
            Status::Cancelled => &mut self.cancelled,
            Status::FailedNoChildren | Status::Failed => &mut self.failed,
            Status::Error => &mut self.errored,
        };
        *counter += 1;
    }

    /// Returns the total number of accounted nodes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.cancelled + self.errored + self.undetermined
    }

    /// Indicates whether any accounted node failed or errored.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0 || self.errored > 0
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.passed, "passed"),
            (self.failed, "failed"),
            (self.cancelled, "cancelled"),
            (self.errored, "errored"),
            (self.undetermined, "not run"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, what)| format!("{n} {what}"))
        .collect::<Vec<_>>();

        if parts.is_empty() {
            Ok(())
        } else {
            write!(f, " ({})", parts.join(", "))
        }
    }
}

/// [`Writer`] counting the resolved nodes of a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Rolled up [`Feature`]s.
    ///
    /// [`Feature`]: crate::Feature
    pub features: Counts,

    /// Rolled up [`Story`]s.
    ///
    /// [`Story`]: crate::Story
    pub stories: Counts,

    /// Resolved [`Scenario`]s.
    ///
    /// [`Scenario`]: crate::Scenario
    pub scenarios: Counts,

    /// Resolved [`Step`]s.
    ///
    /// [`Step`]: crate::Step
    pub steps: Counts,
}

impl Stats {
    /// Indicates whether any node of the run failed or errored.
    #[must_use]
    pub const fn execution_has_failed(&self) -> bool {
        self.features.has_failures()
            || self.stories.has_failures()
            || self.scenarios.has_failures()
            || self.steps.has_failures()
    }

    /// Accounts the node carried by the given [`Event`], if any.
    pub fn record(&mut self, event: &Event) {
        let counts = match event {
            Event::Started { .. } | Event::Finished => return,
            Event::Step { .. } => &mut self.steps,
            Event::Scenario(_) => &mut self.scenarios,
            Event::Story(_) => &mut self.stories,
            Event::Feature(_) => &mut self.features,
        };
        if let Some(status) = event.status() {
            counts.record(status);
        }
    }
}

impl Writer for Stats {
    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        self.record(event);
        Ok(())
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            (self.features, "feature", "features"),
            (self.stories, "story", "stories"),
            (self.scenarios, "scenario", "scenarios"),
            (self.steps, "step", "steps"),
        ];
        let mut first = true;
        for (counts, one, many) in rows {
            if counts.total() == 0 {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            let noun = if counts.total() == 1 { one } else { many };
            write!(f, "{} {noun}{counts}", counts.total())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tree::ColorTag, Scenario, ScenarioContext, Step};

    #[test]
    fn counts_by_outcome() {
        let mut counts = Counts::default();
        for status in Status::ALL {
            counts.record(status);
        }
        assert_eq!(
            counts,
            Counts { passed: 1, failed: 2, cancelled: 1, errored: 1, undetermined: 1 },
        );
        assert_eq!(counts.total(), 6);
        assert!(counts.has_failures());
        assert_eq!(Counts::default().to_string(), "");
    }

    #[test]
    fn records_events_by_kind() {
        let mut stats = Stats::default();
        let ctx = ScenarioContext::of(
            Scenario::builder("s").id("sc").given("ok", || true).build(),
        )
        .run();
        let step = Step::new("ok", || true).run();

        for ev in [
            Event::Started { scenarios: 1 },
            Event::Step { scenario_id: ctx.id().clone(), color: ColorTag::new(0), step },
            Event::Scenario(ctx),
            Event::Finished,
        ] {
            stats.handle_event(&ev).unwrap();
        }

        assert_eq!(stats.steps.passed, 1);
        assert_eq!(stats.scenarios.passed, 1);
        assert_eq!(stats.features.total(), 0);
        assert!(!stats.execution_has_failed());
        assert_eq!(stats.to_string(), "1 scenario (1 passed)\n1 step (1 passed)");
    }
}
