//! [`Feature`] definition.

use super::{derive_status, FeatureId, Lineage, Narrative, ScenarioContext, Story};
use crate::Status;

/// Top-level node of a tree: [`Story`]s and [`ScenarioContext`]s describing
/// one product feature.
#[derive(Clone, Debug)]
pub struct Feature {
    /// ID of this [`Feature`].
    id: FeatureId,

    /// Name of this [`Feature`].
    name: String,

    /// Business value of this [`Feature`].
    narrative: Narrative,

    /// Root path this [`Feature`] was loaded from.
    root: String,

    /// [`Story`]s of this [`Feature`].
    stories: Vec<Story>,

    /// [`ScenarioContext`]s directly attached to this [`Feature`].
    scenario_contexts: Vec<ScenarioContext>,

    /// [`Status`] supplied explicitly, used while having no children.
    explicit_status: Option<Status>,

    /// Derived [`Status`] of this [`Feature`].
    status: Status,
}

impl Feature {
    /// Starts building a new [`Feature`] with the given `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FeatureBuilder {
        FeatureBuilder {
            id: None,
            name: name.into(),
            narrative: Narrative::default(),
            root: String::new(),
            stories: Vec::new(),
            scenario_contexts: Vec::new(),
            status: None,
        }
    }

    /// Returns the ID of this [`Feature`].
    #[must_use]
    pub const fn id(&self) -> &FeatureId {
        &self.id
    }

    /// Returns the name of this [`Feature`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the [`Narrative`] of this [`Feature`].
    #[must_use]
    pub const fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// Returns the root path this [`Feature`] was loaded from.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the [`Story`]s of this [`Feature`].
    #[must_use]
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Returns the [`ScenarioContext`]s directly attached to this
    /// [`Feature`].
    #[must_use]
    pub fn scenario_contexts(&self) -> &[ScenarioContext] {
        &self.scenario_contexts
    }

    /// Returns the [`Status`] of this [`Feature`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the explicitly supplied [`Status`], if any.
    #[must_use]
    pub const fn explicit_status(&self) -> Option<Status> {
        self.explicit_status
    }

    /// Returns the [`Lineage`] of the direct [`ScenarioContext`]s of this
    /// [`Feature`].
    #[must_use]
    pub fn lineage(&self) -> Lineage {
        Lineage { feature_id: Some(self.id.clone()), story_id: None }
    }

    /// Iterates over the [`ScenarioContext`]s of all the [`Story`]s of this
    /// [`Feature`].
    pub fn stories_scenario_contexts(&self) -> impl Iterator<Item = &ScenarioContext> {
        self.stories.iter().flat_map(Story::scenario_contexts)
    }

    /// Iterates over the direct [`ScenarioContext`]s of this [`Feature`]
    /// followed by the ones of its [`Story`]s.
    pub fn all_scenario_contexts(&self) -> impl Iterator<Item = &ScenarioContext> {
        self.scenario_contexts.iter().chain(self.stories_scenario_contexts())
    }

    /// Returns a new snapshot of this [`Feature`] owning the given
    /// [`Story`]s.
    #[must_use]
    pub fn with_stories(&self, stories: Vec<Story>) -> Self {
        self.rebuilt(stories, self.scenario_contexts.clone(), self.explicit_status)
    }

    /// Returns a new snapshot of this [`Feature`] owning the given direct
    /// [`ScenarioContext`]s.
    #[must_use]
    pub fn with_scenario_contexts(&self, scenario_contexts: Vec<ScenarioContext>) -> Self {
        self.rebuilt(self.stories.clone(), scenario_contexts, self.explicit_status)
    }

    /// Returns a new snapshot of this [`Feature`] with the given explicit
    /// [`Status`].
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        self.rebuilt(self.stories.clone(), self.scenario_contexts.clone(), Some(status))
    }

    /// Returns a new snapshot of this [`Feature`] owning the given children.
    pub(crate) fn with_children(
        &self,
        stories: Vec<Story>,
        scenario_contexts: Vec<ScenarioContext>,
    ) -> Self {
        self.rebuilt(stories, scenario_contexts, self.explicit_status)
    }

    /// Returns this [`Feature`] loaded from the given definition root.
    pub(crate) fn with_root(self, root: impl Into<String>) -> Self {
        Self { root: root.into(), ..self }
    }

    /// Rebuilds this [`Feature`], re-deriving back-references and
    /// [`Status`].
    fn rebuilt(
        &self,
        stories: Vec<Story>,
        scenario_contexts: Vec<ScenarioContext>,
        explicit_status: Option<Status>,
    ) -> Self {
        let lineage = self.lineage();
        let stories = stories
            .iter()
            .map(|s| s.placed(Some(self.id.clone())))
            .collect::<Vec<_>>();
        let scenario_contexts = scenario_contexts
            .into_iter()
            .map(|ctx| ctx.placed(lineage.clone()))
            .collect::<Vec<_>>();
        Self {
            status: derive_status(
                stories
                    .iter()
                    .map(Story::status)
                    .chain(scenario_contexts.iter().map(ScenarioContext::status)),
                explicit_status,
            ),
            id: self.id.clone(),
            name: self.name.clone(),
            narrative: self.narrative.clone(),
            root: self.root.clone(),
            stories,
            scenario_contexts,
            explicit_status,
        }
    }
}

/// Builder of a [`Feature`].
#[derive(Debug)]
pub struct FeatureBuilder {
    /// ID of the [`Feature`], generated if not set.
    id: Option<FeatureId>,

    /// Name of the [`Feature`].
    name: String,

    /// Business value of the [`Feature`].
    narrative: Narrative,

    /// Root path of the [`Feature`].
    root: String,

    /// [`Story`]s of the [`Feature`].
    stories: Vec<Story>,

    /// Direct [`ScenarioContext`]s of the [`Feature`].
    scenario_contexts: Vec<ScenarioContext>,

    /// Explicit [`Status`] of the [`Feature`].
    status: Option<Status>,
}

impl FeatureBuilder {
    /// Sets the ID of the [`Feature`].
    #[must_use]
    pub fn id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the [`Narrative`] of the [`Feature`].
    #[must_use]
    pub fn narrative(mut self, narrative: Narrative) -> Self {
        self.narrative = narrative;
        self
    }

    /// Sets the root path of the [`Feature`].
    #[must_use]
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Appends a [`Story`].
    #[must_use]
    pub fn story(mut self, story: Story) -> Self {
        self.stories.push(story);
        self
    }

    /// Appends all the given [`Story`]s.
    #[must_use]
    pub fn stories(mut self, stories: impl IntoIterator<Item = Story>) -> Self {
        self.stories.extend(stories);
        self
    }

    /// Appends a direct [`ScenarioContext`].
    #[must_use]
    pub fn scenario(mut self, ctx: ScenarioContext) -> Self {
        self.scenario_contexts.push(ctx);
        self
    }

    /// Appends all the given direct [`ScenarioContext`]s.
    #[must_use]
    pub fn scenarios(mut self, ctxs: impl IntoIterator<Item = ScenarioContext>) -> Self {
        self.scenario_contexts.extend(ctxs);
        self
    }

    /// Sets the explicit [`Status`], used while the [`Feature`] has no
    /// children.
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds the [`Feature`].
    #[must_use]
    pub fn build(self) -> Feature {
        let feature = Feature {
            id: self.id.unwrap_or_else(FeatureId::generate),
            name: self.name,
            narrative: self.narrative,
            root: self.root,
            stories: Vec::new(),
            scenario_contexts: Vec::new(),
            explicit_status: self.status,
            status: Status::None,
        };
        feature.rebuilt(self.stories, self.scenario_contexts, self.status)
    }
}
