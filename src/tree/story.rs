//! [`Story`] definition.

use super::{derive_status, FeatureId, Lineage, Narrative, ScenarioContext, StoryId};
use crate::Status;

/// Group of [`ScenarioContext`]s describing one user-facing capability.
#[derive(Clone, Debug)]
pub struct Story {
    /// ID of this [`Story`].
    id: StoryId,

    /// Name of this [`Story`].
    name: String,

    /// Business value of this [`Story`].
    narrative: Narrative,

    /// Root path this [`Story`] was loaded from.
    root: String,

    /// [`ScenarioContext`]s of this [`Story`].
    scenario_contexts: Vec<ScenarioContext>,

    /// [`Status`] supplied explicitly, used while having no children.
    explicit_status: Option<Status>,

    /// Derived [`Status`] of this [`Story`].
    status: Status,

    /// Non-owning back-reference to the parent [`Feature`].
    ///
    /// [`Feature`]: crate::Feature
    feature_id: Option<FeatureId>,
}

impl Story {
    /// Starts building a new [`Story`] with the given `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> StoryBuilder {
        StoryBuilder {
            id: None,
            name: name.into(),
            narrative: Narrative::default(),
            root: String::new(),
            scenario_contexts: Vec::new(),
            status: None,
        }
    }

    /// Returns the ID of this [`Story`].
    #[must_use]
    pub const fn id(&self) -> &StoryId {
        &self.id
    }

    /// Returns the name of this [`Story`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the [`Narrative`] of this [`Story`].
    #[must_use]
    pub const fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// Returns the root path this [`Story`] was loaded from.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the [`ScenarioContext`]s of this [`Story`].
    #[must_use]
    pub fn scenario_contexts(&self) -> &[ScenarioContext] {
        &self.scenario_contexts
    }

    /// Returns the [`Status`] of this [`Story`].
    ///
    /// It's the aggregate of its [`ScenarioContext`]s, or, having none of
    /// them, the explicitly supplied [`Status`], or
    /// [`Status::FailedNoChildren`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the explicitly supplied [`Status`], if any.
    #[must_use]
    pub const fn explicit_status(&self) -> Option<Status> {
        self.explicit_status
    }

    /// Returns the ID of the parent [`Feature`], if any.
    ///
    /// [`Feature`]: crate::Feature
    #[must_use]
    pub const fn feature_id(&self) -> Option<&FeatureId> {
        self.feature_id.as_ref()
    }

    /// Returns the [`Lineage`] of the [`ScenarioContext`]s of this [`Story`].
    #[must_use]
    pub fn lineage(&self) -> Lineage {
        Lineage {
            feature_id: self.feature_id.clone(),
            story_id: Some(self.id.clone()),
        }
    }

    /// Returns a new snapshot of this [`Story`] owning the given
    /// [`ScenarioContext`]s.
    #[must_use]
    pub fn with_scenario_contexts(&self, scenario_contexts: Vec<ScenarioContext>) -> Self {
        self.rebuilt(self.feature_id.clone(), scenario_contexts, self.explicit_status)
    }

    /// Returns a new snapshot of this [`Story`] with the given explicit
    /// [`Status`].
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        self.rebuilt(self.feature_id.clone(), self.scenario_contexts.clone(), Some(status))
    }

    /// Returns a new snapshot of this [`Story`] placed under the given
    /// [`Feature`].
    ///
    /// [`Feature`]: crate::Feature
    pub(crate) fn placed(&self, feature_id: Option<FeatureId>) -> Self {
        self.rebuilt(feature_id, self.scenario_contexts.clone(), self.explicit_status)
    }

    /// Returns this [`Story`] loaded from the given definition root.
    pub(crate) fn with_root(self, root: impl Into<String>) -> Self {
        Self { root: root.into(), ..self }
    }

    /// Rebuilds this [`Story`], re-deriving back-references and [`Status`].
    fn rebuilt(
        &self,
        feature_id: Option<FeatureId>,
        scenario_contexts: Vec<ScenarioContext>,
        explicit_status: Option<Status>,
    ) -> Self {
        let lineage = Lineage { feature_id: feature_id.clone(), story_id: Some(self.id.clone()) };
        let scenario_contexts = scenario_contexts
            .into_iter()
            .map(|ctx| ctx.placed(lineage.clone()))
            .collect::<Vec<_>>();
        Self {
            status: derive_status(
                scenario_contexts.iter().map(ScenarioContext::status),
                explicit_status,
            ),
            id: self.id.clone(),
            name: self.name.clone(),
            narrative: self.narrative.clone(),
            root: self.root.clone(),
            scenario_contexts,
            explicit_status,
            feature_id,
        }
    }
}

/// Builder of a [`Story`].
#[derive(Debug)]
pub struct StoryBuilder {
    /// ID of the [`Story`], generated if not set.
    id: Option<StoryId>,

    /// Name of the [`Story`].
    name: String,

    /// Business value of the [`Story`].
    narrative: Narrative,

    /// Root path of the [`Story`].
    root: String,

    /// [`ScenarioContext`]s of the [`Story`].
    scenario_contexts: Vec<ScenarioContext>,

    /// Explicit [`Status`] of the [`Story`].
    status: Option<Status>,
}

impl StoryBuilder {
    /// Sets the ID of the [`Story`].
    #[must_use]
    pub fn id(mut self, id: impl Into<StoryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the [`Narrative`] of the [`Story`].
    #[must_use]
    pub fn narrative(mut self, narrative: Narrative) -> Self {
        self.narrative = narrative;
        self
    }

    /// Sets the root path of the [`Story`].
    #[must_use]
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Appends a [`ScenarioContext`].
    #[must_use]
    pub fn scenario(mut self, ctx: ScenarioContext) -> Self {
        self.scenario_contexts.push(ctx);
        self
    }

    /// Appends all the given [`ScenarioContext`]s.
    #[must_use]
    pub fn scenarios(mut self, ctxs: impl IntoIterator<Item = ScenarioContext>) -> Self {
        self.scenario_contexts.extend(ctxs);
        self
    }

    /// Sets the explicit [`Status`], used while the [`Story`] has no
    /// [`ScenarioContext`]s.
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds the [`Story`].
    #[must_use]
    pub fn build(self) -> Story {
        let story = Story {
            id: self.id.unwrap_or_else(StoryId::generate),
            name: self.name,
            narrative: self.narrative,
            root: self.root,
            scenario_contexts: Vec::new(),
            explicit_status: self.status,
            status: Status::None,
            feature_id: None,
        };
        story.rebuilt(None, self.scenario_contexts, self.status)
    }
}
