//! [`ScenarioContext`]: lazily produced [`Scenario`] with its hooks.

use std::{fmt, sync::Arc};

use super::{step::Failure, Lineage, Scenario, ScenarioId};
use crate::{panic_trap, Status, Step};

/// Factory producing a [`Scenario`] for the given [`Lineage`].
pub type ScenarioFactory = Arc<dyn Fn(&Lineage) -> Scenario + Send + Sync>;

/// Hook executed once around every execution of a [`Scenario`].
pub type Hook = Arc<dyn Fn(&ScenarioId, &Lineage) + Send + Sync>;

/// Where the [`Scenario`] of a [`ScenarioContext`] comes from.
#[derive(Clone)]
enum Origin {
    /// Not executed yet, produced on demand.
    Factory(ScenarioFactory),

    /// Already executed.
    Resolved(Arc<Scenario>),
}

/// Leaf of a tree: wraps a factory of a [`Scenario`] along with the hooks
/// to run around its execution, and routing back-references to its parent
/// [`Story`] and [`Feature`].
///
/// [`Feature`]: crate::Feature
/// [`Story`]: crate::Story
#[derive(Clone)]
pub struct ScenarioContext {
    /// ID of this [`ScenarioContext`] and its [`Scenario`].
    id: ScenarioId,

    /// [`Status`] of the produced [`Scenario`], [`Status::None`] until
    /// executed.
    status: Status,

    /// Non-owning back-references to the parents.
    lineage: Lineage,

    /// Source of the [`Scenario`].
    origin: Origin,

    /// Hook executed before the [`Scenario`].
    before: Option<Hook>,

    /// Hook executed after the [`Scenario`].
    after: Option<Hook>,
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("lineage", &self.lineage)
            .field("resolved", &self.resolved())
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Creates a new [`ScenarioContext`] out of a [`Scenario`] factory.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Lineage) -> Scenario + Send + Sync + 'static,
    {
        Self {
            id: ScenarioId::generate(),
            status: Status::None,
            lineage: Lineage::default(),
            origin: Origin::Factory(Arc::new(factory)),
            before: None,
            after: None,
        }
    }

    /// Creates a new [`ScenarioContext`] producing copies of the given
    /// [`Scenario`], sharing its ID.
    #[must_use]
    pub fn of(scenario: Scenario) -> Self {
        let id = scenario.id().clone();
        Self::new(move |_| scenario.clone()).with_id(id)
    }

    /// Sets the ID of this [`ScenarioContext`].
    #[must_use]
    pub fn with_id(self, id: impl Into<ScenarioId>) -> Self {
        Self { id: id.into(), ..self }
    }

    /// Sets the hook to execute before the [`Scenario`].
    #[must_use]
    pub fn before<F>(self, hook: F) -> Self
    where
        F: Fn(&ScenarioId, &Lineage) + Send + Sync + 'static,
    {
        Self { before: Some(Arc::new(hook)), ..self }
    }

    /// Sets the hook to execute after the [`Scenario`].
    #[must_use]
    pub fn after<F>(self, hook: F) -> Self
    where
        F: Fn(&ScenarioId, &Lineage) + Send + Sync + 'static,
    {
        Self { after: Some(Arc::new(hook)), ..self }
    }

    /// Returns the ID of this [`ScenarioContext`].
    #[must_use]
    pub const fn id(&self) -> &ScenarioId {
        &self.id
    }

    /// Returns the [`Status`] of this [`ScenarioContext`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the [`Lineage`] of this [`ScenarioContext`].
    #[must_use]
    pub const fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Returns the executed [`Scenario`], if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&Scenario> {
        match &self.origin {
            Origin::Factory(_) => None,
            Origin::Resolved(s) => Some(s),
        }
    }

    /// Returns the [`Scenario`] of this [`ScenarioContext`], producing it if
    /// not executed yet.
    #[must_use]
    pub fn scenario(&self) -> Arc<Scenario> {
        match &self.origin {
            Origin::Factory(f) => Arc::new(self.produce(f)),
            Origin::Resolved(s) => Arc::clone(s),
        }
    }

    /// Places this [`ScenarioContext`] under the given [`Lineage`].
    pub(crate) fn placed(self, lineage: Lineage) -> Self {
        Self { lineage, ..self }
    }

    /// Executes the hooks and the [`Scenario`], returning the resolved
    /// [`ScenarioContext`].
    #[must_use]
    pub fn run(&self) -> Self {
        self.run_observed(|_, _| {})
    }

    /// Same as [`ScenarioContext::run()`], but reports each resolved
    /// [`Step`] to `on_step`, along with the [`Scenario`] executing it, as
    /// soon as it finishes.
    ///
    /// A panicking hook or factory resolves the [`Scenario`] as
    /// [`Status::Error`] with an additional [`Step`] describing the panic.
    /// Nothing is executed after a failed `before` hook or factory.
    #[must_use]
    pub fn run_observed(&self, on_step: impl FnMut(&Scenario, &Step)) -> Self {
        let scenario = self.execute(on_step);
        Self {
            status: scenario.status(),
            origin: Origin::Resolved(Arc::new(scenario)),
            ..self.clone()
        }
    }

    /// Produces the [`Scenario`] placed under this [`ScenarioContext`].
    fn produce(&self, factory: &ScenarioFactory) -> Scenario {
        factory(&self.lineage).placed(self.id.clone(), self.lineage.clone())
    }

    /// Runs the hooks and the [`Scenario`].
    fn execute(&self, mut on_step: impl FnMut(&Scenario, &Step)) -> Scenario {
        let hook = |hook: &Option<Hook>| {
            hook.as_ref().map_or(Ok(()), |h| {
                panic_trap::trap(|| h(&self.id, &self.lineage)).map_err(Failure::from)
            })
        };

        if let Err(failure) = hook(&self.before) {
            return self.placeholder().with_hook_failure("Before", failure);
        }

        let produced = match &self.origin {
            Origin::Factory(f) => panic_trap::trap(|| self.produce(f)),
            Origin::Resolved(s) => Ok((**s).clone()),
        };
        let ran = match produced {
            Ok(scenario) => scenario.run_observed(|step| on_step(&scenario, step)),
            Err(panic) => {
                return self.placeholder().with_hook_failure("Scenario factory", panic.into());
            }
        };

        match hook(&self.after) {
            Ok(()) => ran,
            Err(failure) => ran.with_hook_failure("After", failure),
        }
    }

    /// Empty [`Scenario`] standing for one that couldn't be produced.
    fn placeholder(&self) -> Scenario {
        Scenario::builder(format!("Scenario {}", self.id))
            .build()
            .placed(self.id.clone(), self.lineage.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;
    use crate::tree::{FeatureId, StoryId};

    #[test]
    fn run_resolves_scenario() {
        let ctx = ScenarioContext::new(|_| {
            Scenario::builder("produced").given("ok", || true).build()
        })
        .with_id("sc1");
        assert_eq!(ctx.status(), Status::None);
        assert!(ctx.resolved().is_none());

        let ran = ctx.run();
        assert_eq!(ran.status(), Status::Passed);
        let scenario = ran.resolved().expect("resolved");
        assert_eq!(scenario.id().as_str(), "sc1");
        assert_eq!(scenario.steps()[0].status(), Status::Passed);

        // The original snapshot is untouched.
        assert_eq!(ctx.status(), Status::None);
    }

    #[test]
    fn hooks_run_once_around_scenario() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let push = |what: &'static str| {
            let log = Arc::clone(&log);
            move |id: &ScenarioId, _: &Lineage| {
                log.lock().unwrap().push(format!("{what} {id}"));
            }
        };
        let ctx = ScenarioContext::new({
            let log = Arc::clone(&log);
            move |_| {
                let log = Arc::clone(&log);
                Scenario::builder("logged")
                    .given("step", move || log.lock().unwrap().push("step".into()))
                    .build()
            }
        })
        .with_id("x")
        .before(push("before"))
        .after(push("after"));

        _ = ctx.run();
        assert_eq!(*log.lock().unwrap(), ["before x", "step", "after x"]);
    }

    #[test]
    fn factory_receives_lineage() {
        let lineage = Lineage {
            feature_id: Some(FeatureId::from("f")),
            story_id: Some(StoryId::from("s")),
        };
        let ctx = ScenarioContext::new(|lineage| {
            let ok = lineage.story_id.as_ref().is_some_and(|s| s.as_str() == "s");
            Scenario::builder("lineage").then("knows its story", move || ok).build()
        })
        .placed(lineage.clone());

        let ran = ctx.run();
        assert_eq!(ran.status(), Status::Passed);
        assert_eq!(ran.resolved().map(Scenario::lineage), Some(&lineage));
    }

    #[test]
    fn panicking_before_hook_skips_scenario() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ScenarioContext::new({
            let calls = Arc::clone(&calls);
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Scenario::builder("never").build()
            }
        })
        .before(|_, _| panic!("no database"));

        let ran = ctx.run();
        assert_eq!(ran.status(), Status::Error);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let step = &ran.resolved().expect("resolved").steps()[0];
        assert!(step.text().starts_with("Before hook: ERROR\nno database"));
    }

    #[test]
    fn panicking_factory_is_an_error() {
        let ran = ScenarioContext::new(|_| panic!("bad definition")).run();
        assert_eq!(ran.status(), Status::Error);
    }

    #[test]
    fn panicking_after_hook_breaks_passed_scenario() {
        let ran = ScenarioContext::of(Scenario::builder("ok").given("a", || ()).build())
            .after(|_, _| panic!("cleanup"))
            .run();
        assert_eq!(ran.status(), Status::Error);
    }

    #[test]
    fn rerun_uses_resolved_scenario() {
        let ran = ScenarioContext::of(Scenario::builder("twice").given("a", || false).build())
            .run()
            .run();
        assert_eq!(ran.status(), Status::Failed);
        assert_eq!(ran.resolved().map(|s| s.steps().len()), Some(1));
    }
}
