//! Order-independent folding of resolved [`ScenarioContext`]s into their
//! parent [`Story`]s and [`Feature`]s.

use std::{collections::HashMap, fmt::Display, hash::Hash};

use derive_more::with_trait::From;
use linked_hash_map::LinkedHashMap;

use crate::{
    error::{ConfigError, ConfigResult},
    event::Event,
    tree::{ComponentKind, FeatureId, Lineage, ScenarioId, StoryId},
    Feature, Pipeline, ScenarioContext, Status, Story,
};

/// Root of a tree to be run.
#[derive(Clone, Debug, From)]
pub enum Tree {
    /// [`Feature`] with all its children.
    Feature(Feature),

    /// Standalone [`Story`].
    Story(Story),

    /// Standalone [`ScenarioContext`].
    Scenario(ScenarioContext),
}

impl Tree {
    /// Returns the [`Status`] of the root node.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Feature(f) => f.status(),
            Self::Story(s) => s.status(),
            Self::Scenario(ctx) => ctx.status(),
        }
    }

    /// Returns the root node as a [`Feature`], if it's one.
    #[must_use]
    pub const fn as_feature(&self) -> Option<&Feature> {
        match self {
            Self::Feature(f) => Some(f),
            Self::Story(_) | Self::Scenario(_) => None,
        }
    }

    /// Returns the root node as a [`Story`], if it's one.
    #[must_use]
    pub const fn as_story(&self) -> Option<&Story> {
        match self {
            Self::Story(s) => Some(s),
            Self::Feature(_) | Self::Scenario(_) => None,
        }
    }

    /// Returns the root node as a [`ScenarioContext`], if it's one.
    #[must_use]
    pub const fn as_scenario(&self) -> Option<&ScenarioContext> {
        match self {
            Self::Scenario(ctx) => Some(ctx),
            Self::Feature(_) | Self::Story(_) => None,
        }
    }

    /// Unwraps the root node as a [`Feature`], if it's one.
    #[must_use]
    pub fn into_feature(self) -> Option<Feature> {
        match self {
            Self::Feature(f) => Some(f),
            Self::Story(_) | Self::Scenario(_) => None,
        }
    }

    /// Unwraps the root node as a [`Story`], if it's one.
    #[must_use]
    pub fn into_story(self) -> Option<Story> {
        match self {
            Self::Story(s) => Some(s),
            Self::Feature(_) | Self::Scenario(_) => None,
        }
    }

    /// Returns all the leaf [`ScenarioContext`]s of this [`Tree`], in
    /// definition order.
    #[must_use]
    pub fn scenario_contexts(&self) -> Vec<ScenarioContext> {
        match self {
            Self::Feature(f) => f.all_scenario_contexts().cloned().collect(),
            Self::Story(s) => s.scenario_contexts().to_vec(),
            Self::Scenario(ctx) => vec![ctx.clone()],
        }
    }
}

/// Key of a root in a [`Rollup`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum RootKey {
    Feature(FeatureId),
    Story(StoryKey),
    Scenario(ScenarioId),
}

/// Key of a [`Story`], unique inside its [`Feature`].
type StoryKey = (Option<FeatureId>, StoryId);

/// Children of a node being resolved, kept at their definition positions.
#[derive(Debug)]
struct Slots<K, V> {
    /// Positions of the children.
    index: HashMap<K, usize>,

    /// Resolved children.
    values: Vec<Option<V>>,

    /// Number of children not resolved yet.
    pending: usize,
}

impl<K: Clone + Display + Eq + Hash, V> Slots<K, V> {
    /// Creates new [`Slots`] for children with the given `keys`.
    ///
    /// # Errors
    ///
    /// If `keys` contain duplicates.
    fn new<'k>(kind: ComponentKind, keys: impl IntoIterator<Item = &'k K>) -> ConfigResult<Self>
    where
        K: 'k,
    {
        let mut index = HashMap::new();
        for (pos, key) in keys.into_iter().enumerate() {
            if index.insert(key.clone(), pos).is_some() {
                return Err(ConfigError::duplicate_id(kind, key));
            }
        }
        let pending = index.len();
        Ok(Self { index, values: (0..pending).map(|_| None).collect(), pending })
    }

    /// Places the resolved child at its position.
    ///
    /// Returns `false` if the child is unknown or was already resolved.
    fn fill(&mut self, key: &K, value: V) -> bool {
        let Some(slot) = self.index.get(key).and_then(|&pos| self.values.get_mut(pos)) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        self.pending -= 1;
        true
    }

    /// Indicates whether all the children are resolved.
    const fn is_done(&self) -> bool {
        self.pending == 0
    }

    /// Takes all the resolved children in their definition order.
    fn take(&mut self) -> Vec<V> {
        self.values.iter_mut().filter_map(Option::take).collect()
    }
}

/// Completion tracker of a [`Story`].
#[derive(Debug)]
struct StoryTracker {
    /// Design-time snapshot of the [`Story`].
    story: Story,

    /// Indicator whether the [`Story`] is a root of the run.
    root: bool,

    /// [`ScenarioContext`]s of the [`Story`].
    scenarios: Slots<ScenarioId, ScenarioContext>,
}

impl StoryTracker {
    /// Builds the resolved [`Story`].
    fn resolve(mut self) -> Story {
        let scenarios = self.scenarios.take();
        if scenarios.is_empty() {
            settled(self.story.explicit_status(), || {
                self.story.with_status(Status::FailedNoChildren)
            })
            .unwrap_or(self.story)
        } else {
            self.story.with_scenario_contexts(scenarios)
        }
    }
}

/// Completion tracker of a [`Feature`].
#[derive(Debug)]
struct FeatureTracker {
    /// Design-time snapshot of the [`Feature`].
    feature: Feature,

    /// Direct [`ScenarioContext`]s of the [`Feature`].
    scenarios: Slots<ScenarioId, ScenarioContext>,

    /// [`Story`]s of the [`Feature`].
    stories: Slots<StoryId, Story>,
}

impl FeatureTracker {
    /// Indicates whether all the children of the [`Feature`] are resolved.
    const fn is_done(&self) -> bool {
        self.scenarios.is_done() && self.stories.is_done()
    }

    /// Builds the resolved [`Feature`].
    fn resolve(mut self) -> Feature {
        let stories = self.stories.take();
        let scenarios = self.scenarios.take();
        if stories.is_empty() && scenarios.is_empty() {
            settled(self.feature.explicit_status(), || {
                self.feature.with_status(Status::FailedNoChildren)
            })
            .unwrap_or(self.feature)
        } else {
            self.feature.with_children(stories, scenarios)
        }
    }
}

/// Returns the `failed` snapshot of a childless node, unless it carries an
/// explicit terminal [`Status`].
fn settled<T>(explicit: Option<Status>, failed: impl FnOnce() -> T) -> Option<T> {
    match explicit {
        Some(st) if st != Status::None => None,
        _ => Some(failed()),
    }
}

/// Human-readable parent referenced by a [`Lineage`].
fn parent_of(lineage: &Lineage) -> String {
    match (&lineage.feature_id, &lineage.story_id) {
        (Some(f), Some(s)) => format!("{f}/{s}"),
        (Some(f), None) => f.to_string(),
        (None, Some(s)) => s.to_string(),
        (None, None) => "nothing".to_owned(),
    }
}

/// Checks the back-references of the given [`ScenarioContext`]s.
fn check_placed<'c>(
    contexts: impl IntoIterator<Item = &'c ScenarioContext>,
    parent: &Lineage,
) -> ConfigResult<()> {
    for ctx in contexts {
        if ctx.lineage() != parent {
            return Err(ConfigError::Misplaced {
                kind: ComponentKind::Scenario,
                id: ctx.id().to_string(),
                referenced: parent_of(ctx.lineage()),
                parent: parent_of(parent),
            });
        }
    }
    Ok(())
}

/// Coordinator state folding resolved [`ScenarioContext`]s into their
/// parents.
///
/// Resolved children are placed at their definition positions, and a parent
/// is rebuilt exactly once, when its last child arrives. So the resulting
/// trees depend only on the set of outcomes, never on their arrival order.
///
/// A [`Rollup`] is mutated by a single coordinator only.
#[derive(Debug, Default)]
pub struct Rollup {
    /// Roots of the run in their order, [`None`] until resolved.
    roots: LinkedHashMap<RootKey, Option<Tree>>,

    /// Trackers of not yet resolved [`Feature`]s.
    features: LinkedHashMap<FeatureId, FeatureTracker>,

    /// Trackers of not yet resolved [`Story`]s.
    stories: LinkedHashMap<StoryKey, StoryTracker>,

    /// Number of not yet resolved roots.
    pending: usize,
}

impl Rollup {
    /// Plans a run of the given `roots`, returning the [`Rollup`] tracking
    /// it and all the leaf [`ScenarioContext`]s to execute.
    ///
    /// # Errors
    ///
    /// If the `roots` contain duplicate IDs in the same scope, or nodes which
    /// back-references don't match their actual parents.
    pub fn plan(
        roots: impl IntoIterator<Item = Tree>,
    ) -> ConfigResult<(Self, Vec<ScenarioContext>)> {
        let roots = roots.into_iter().collect::<Vec<_>>();

        let mut rollup = Self::default();
        for tree in &roots {
            rollup.track(tree)?;
        }

        let jobs = Pipeline::source(roots)
            .flat_map(|tree| tree.scenario_contexts())
            .to_list()
            .unwrap_or_else(|never| match never {});

        #[cfg(feature = "tracing")]
        tracing::debug!(
            roots = rollup.roots.len(),
            scenarios = jobs.len(),
            "planned rollup"
        );

        Ok((rollup, jobs))
    }

    /// Resolves all the [`Story`]s and [`Feature`]s having no children at
    /// all, returning the [`Event`]s of the rolled up nodes.
    ///
    /// A childless node keeps its explicit terminal [`Status`], or becomes
    /// [`Status::FailedNoChildren`] otherwise.
    pub fn settle_childless(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        let stories = self
            .stories
            .iter()
            .filter_map(|(key, t)| t.scenarios.is_done().then(|| key.clone()))
            .collect::<Vec<_>>();
        for key in stories {
            if let Some(tracker) = self.stories.remove(&key) {
                self.story_resolved(key, tracker, &mut events);
            }
        }

        let features = self
            .features
            .iter()
            .filter_map(|(id, t)| t.is_done().then(|| id.clone()))
            .collect::<Vec<_>>();
        for id in features {
            if let Some(tracker) = self.features.remove(&id) {
                self.feature_resolved(tracker, &mut events);
            }
        }

        events
    }

    /// Folds the resolved [`ScenarioContext`] into its parents, returning
    /// the [`Event`]s of all the nodes resolved by it.
    ///
    /// It's routed by its [`Lineage`] only, so a standalone root is the one
    /// with no parents. An unknown or already resolved [`ScenarioContext`]
    /// is ignored.
    pub fn scenario_finished(&mut self, ctx: ScenarioContext) -> Vec<Event> {
        let Lineage { feature_id, story_id } = ctx.lineage().clone();
        let mut events = vec![Event::Scenario(ctx.clone())];
        let accepted = match (feature_id, story_id) {
            (feature_id, Some(story_id)) => {
                let key = (feature_id, story_id);
                let done = self.stories.get_mut(&key).map(|t| {
                    (t.scenarios.fill(ctx.id(), ctx.clone()), t.scenarios.is_done())
                });
                if let Some((true, true)) = done {
                    if let Some(tracker) = self.stories.remove(&key) {
                        self.story_resolved(key, tracker, &mut events);
                    }
                }
                matches!(done, Some((true, _)))
            }
            (Some(feature_id), None) => {
                let done = self.features.get_mut(&feature_id).map(|t| {
                    (t.scenarios.fill(ctx.id(), ctx.clone()), t.is_done())
                });
                if let Some((true, true)) = done {
                    if let Some(tracker) = self.features.remove(&feature_id) {
                        self.feature_resolved(tracker, &mut events);
                    }
                }
                matches!(done, Some((true, _)))
            }
            (None, None) => self.resolve_root(
                RootKey::Scenario(ctx.id().clone()),
                Tree::Scenario(ctx.clone()),
            ),
        };

        if accepted {
            events
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                scenario = %ctx.id(),
                "ignoring completion of an unknown or already resolved scenario"
            );
            Vec::new()
        }
    }

    /// Indicates whether all the roots are resolved.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.pending == 0
    }

    /// Returns the resolved roots in their original order, or [`None`] if
    /// some of them are not resolved yet.
    #[must_use]
    pub fn finish(self) -> Option<Vec<Tree>> {
        self.roots.into_iter().map(|(_, tree)| tree).collect()
    }

    /// Starts tracking the given root.
    fn track(&mut self, tree: &Tree) -> ConfigResult<()> {
        let key = match tree {
            Tree::Feature(f) => {
                if self.features.contains_key(f.id()) {
                    return Err(ConfigError::duplicate_id(ComponentKind::Feature, f.id()));
                }
                let scenarios = Slots::new(
                    ComponentKind::Scenario,
                    f.scenario_contexts().iter().map(ScenarioContext::id),
                )?;
                check_placed(f.scenario_contexts(), &f.lineage())?;
                let stories =
                    Slots::new(ComponentKind::Story, f.stories().iter().map(Story::id))?;
                for story in f.stories() {
                    if story.feature_id() != Some(f.id()) {
                        return Err(ConfigError::Misplaced {
                            kind: ComponentKind::Story,
                            id: story.id().to_string(),
                            referenced: story
                                .feature_id()
                                .map_or_else(|| "nothing".to_owned(), ToString::to_string),
                            parent: f.id().to_string(),
                        });
                    }
                    self.track_story(story, false)?;
                }
                _ = self.features.insert(
                    f.id().clone(),
                    FeatureTracker { feature: f.clone(), scenarios, stories },
                );
                RootKey::Feature(f.id().clone())
            }
            Tree::Story(s) => {
                self.track_story(s, true)?;
                RootKey::Story((s.feature_id().cloned(), s.id().clone()))
            }
            Tree::Scenario(ctx) => {
                check_placed([ctx], &Lineage::default())?;
                RootKey::Scenario(ctx.id().clone())
            }
        };

        if self.roots.contains_key(&key) {
            let (kind, id) = match key {
                RootKey::Feature(id) => (ComponentKind::Feature, id.to_string()),
                RootKey::Story((_, id)) => (ComponentKind::Story, id.to_string()),
                RootKey::Scenario(id) => (ComponentKind::Scenario, id.to_string()),
            };
            return Err(ConfigError::duplicate_id(kind, id));
        }
        _ = self.roots.insert(key, None);
        self.pending += 1;
        Ok(())
    }

    /// Starts tracking the given [`Story`].
    fn track_story(&mut self, story: &Story, root: bool) -> ConfigResult<()> {
        let key = (story.feature_id().cloned(), story.id().clone());
        if self.stories.contains_key(&key) {
            return Err(ConfigError::duplicate_id(ComponentKind::Story, story.id()));
        }
        let scenarios = Slots::new(
            ComponentKind::Scenario,
            story.scenario_contexts().iter().map(ScenarioContext::id),
        )?;
        check_placed(story.scenario_contexts(), &story.lineage())?;
        _ = self
            .stories
            .insert(key, StoryTracker { story: story.clone(), root, scenarios });
        Ok(())
    }

    /// Rolls up the completed [`Story`] and propagates it to its
    /// [`Feature`].
    fn story_resolved(&mut self, key: StoryKey, tracker: StoryTracker, events: &mut Vec<Event>) {
        let root = tracker.root;
        let story = tracker.resolve();

        #[cfg(feature = "tracing")]
        tracing::debug!(story = %story.id(), status = %story.status(), "story rolled up");

        events.push(Event::Story(story.clone()));
        if root {
            _ = self.resolve_root(RootKey::Story(key), Tree::Story(story));
            return;
        }

        let Some(feature_id) = key.0 else { return };
        let done = self
            .features
            .get_mut(&feature_id)
            .map(|t| (t.stories.fill(story.id(), story.clone()), t.is_done()));
        if let Some((true, true)) = done {
            if let Some(tracker) = self.features.remove(&feature_id) {
                self.feature_resolved(tracker, events);
            }
        }
    }

    /// Rolls up the completed [`Feature`].
    fn feature_resolved(&mut self, tracker: FeatureTracker, events: &mut Vec<Event>) {
        let feature = tracker.resolve();

        #[cfg(feature = "tracing")]
        tracing::debug!(feature = %feature.id(), status = %feature.status(), "feature rolled up");

        events.push(Event::Feature(feature.clone()));
        _ = self.resolve_root(RootKey::Feature(feature.id().clone()), Tree::Feature(feature));
    }

    /// Stores the resolved root.
    ///
    /// Returns `false` if the root is unknown or was already resolved.
    fn resolve_root(&mut self, key: RootKey, tree: Tree) -> bool {
        if let Some(slot) = self.roots.get_mut(&key) {
            if slot.is_none() {
                *slot = Some(tree);
                self.pending -= 1;
                return true;
            }
        }
        false
    }
}
