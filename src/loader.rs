// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discovery of tree nodes.
//!
//! A [`Loader`] enumerates definitions matching a path pattern. Definitions
//! are laid out relative to a root path:
//!
//! ```text
//! <root>/features/<feature>/<definition>
//! <feature root>/stories/<story>/<definition>
//! <feature or story root>/scenarios/<definition>
//! ```
//!
//! [`Registry`] is an in-memory [`Loader`] with explicitly registered
//! definitions.

use std::{fmt, str::FromStr, sync::Arc};

use derive_more::with_trait::From;
use linked_hash_map::LinkedHashMap;
use regex::Regex;

use crate::{
    error::{ConfigError, ConfigResult},
    tree::{ComponentKind, Lineage},
    Feature, Pipeline, ScenarioContext, Story,
};

/// Node produced by a [`Loader`].
#[derive(Clone, Debug, From)]
pub enum Component {
    /// [`Feature`] definition.
    Feature(Feature),

    /// [`Story`] definition.
    Story(Story),

    /// [`ScenarioContext`] definition.
    Scenario(ScenarioContext),
}

impl Component {
    /// Returns the [`ComponentKind`] of this [`Component`].
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Feature(_) => ComponentKind::Feature,
            Self::Story(_) => ComponentKind::Story,
            Self::Scenario(_) => ComponentKind::Scenario,
        }
    }
}

/// Source of tree node definitions.
pub trait Loader {
    /// Enumerates all the definitions of the given `kind` which paths match
    /// the given `pattern`, producing them for the given [`Lineage`].
    ///
    /// `*` in a `pattern` matches any sequence of characters inside a single
    /// path segment.
    ///
    /// # Errors
    ///
    /// If a definition can't be produced, or isn't of the expected `kind`.
    fn enumerate(
        &self,
        kind: ComponentKind,
        pattern: &str,
        lineage: &Lineage,
    ) -> ConfigResult<Vec<Component>>;
}

/// Factory of a registered definition.
pub type Definition = Arc<dyn Fn(&Lineage) -> Component + Send + Sync>;

/// In-memory [`Loader`] of explicitly registered definitions.
///
/// A produced [`Feature`] or [`Story`] without a root gets the directory of
/// its registered path as one.
///
/// ```rust
/// # use storyline::{loader::{Registry, LoadMode}, Feature, Scenario, ScenarioContext};
/// let registry = Registry::new()
///     .register("app/features/login/feature", |_| {
///         Feature::builder("Login").id("login").build().into()
///     })
///     .register("app/features/login/scenarios/ok", |_| {
///         ScenarioContext::of(Scenario::builder("Ok").given("fine", || true).build())
///             .into()
///     });
///
/// let features = storyline::loader::load_features("app", &registry).unwrap();
/// let loaded = features[0].load(LoadMode::All, &registry).unwrap();
/// assert_eq!(loaded.scenario_contexts().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    /// Definitions by their paths, in registration order.
    definitions: LinkedHashMap<String, Definition>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("paths", &self.definitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under the given `path`, replacing any previous
    /// one.
    #[must_use]
    pub fn register<F>(mut self, path: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Lineage) -> Component + Send + Sync + 'static,
    {
        drop(self.definitions.insert(path.into(), Arc::new(factory)));
        self
    }

    /// Returns the number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indicates whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Loader for Registry {
    fn enumerate(
        &self,
        kind: ComponentKind,
        pattern: &str,
        lineage: &Lineage,
    ) -> ConfigResult<Vec<Component>> {
        let matcher = glob_regex(pattern)?;
        let lineage = lineage.clone();

        Pipeline::source(self.definitions.iter().map(|(p, d)| (p.clone(), Arc::clone(d))))
            .filter(move |(path, _)| matcher.is_match(path))
            .fallible()
            .try_map(move |(path, definition)| produce(kind, &path, &definition, &lineage))
            .to_list()
    }
}

/// Produces and validates the [`Component`] registered under the given
/// `path`.
fn produce(
    expected: ComponentKind,
    path: &str,
    definition: &Definition,
    lineage: &Lineage,
) -> ConfigResult<Component> {
    let component = definition(lineage);
    if component.kind() != expected {
        return Err(ConfigError::UnexpectedComponent {
            expected,
            found: component.kind(),
            path: path.to_owned(),
        });
    }

    let missing_name = || ConfigError::MissingField {
        kind: expected,
        path: path.to_owned(),
        field: "name",
    };
    let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir);

    Ok(match component {
        Component::Feature(f) if f.name().is_empty() => return Err(missing_name()),
        Component::Story(s) if s.name().is_empty() => return Err(missing_name()),
        Component::Feature(f) if f.root().is_empty() => f.with_root(dir).into(),
        Component::Story(s) if s.root().is_empty() => s.with_root(dir).into(),
        other => other,
    })
}

/// Compiles a path `pattern` into a [`Regex`], where `*` matches inside a
/// single path segment.
fn glob_regex(pattern: &str) -> ConfigResult<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^/]*");
    Regex::new(&format!("^{body}$"))
        .map_err(|source| ConfigError::InvalidPattern { pattern: pattern.to_owned(), source })
}

/// Joins a `root` path with a relative `pattern`.
fn under(root: &str, pattern: &str) -> String {
    if root.is_empty() {
        pattern.to_owned()
    } else {
        format!("{}/{pattern}", root.trim_end_matches('/'))
    }
}

/// Children to load under a [`Feature`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LoadMode {
    /// Nothing.
    #[default]
    None,

    /// [`Story`]s without their [`ScenarioContext`]s.
    Stories,

    /// [`Story`]s with their [`ScenarioContext`]s.
    StoriesWithScenarios,

    /// Direct [`ScenarioContext`]s.
    ScenarioContexts,

    /// [`Story`]s with their [`ScenarioContext`]s, and direct
    /// [`ScenarioContext`]s.
    All,
}

impl FromStr for LoadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "stories" | "with_stories" => Ok(Self::Stories),
            "stories_with_scenarios" | "with_stories_scenarios" => {
                Ok(Self::StoriesWithScenarios)
            }
            "scenario_contexts" | "with_scenarios" => Ok(Self::ScenarioContexts),
            "all" | "with_all" => Ok(Self::All),
            _ => Err(ConfigError::invalid_load_mode(s)),
        }
    }
}

impl Feature {
    /// Loads children of this [`Feature`] according to the given
    /// [`LoadMode`], returning a new snapshot owning them.
    ///
    /// # Errors
    ///
    /// If the [`Loader`] fails.
    pub fn load(&self, mode: LoadMode, loader: &(impl Loader + ?Sized)) -> ConfigResult<Self> {
        match mode {
            LoadMode::None => Ok(self.clone()),
            LoadMode::Stories => Ok(self.with_stories(self.load_stories(loader)?)),
            LoadMode::StoriesWithScenarios => {
                let stories = self
                    .load(LoadMode::Stories, loader)?
                    .stories()
                    .iter()
                    .map(|s| s.load(loader))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(self.with_stories(stories))
            }
            LoadMode::ScenarioContexts => {
                let pattern = under(self.root(), "scenarios/*");
                let ctxs = scenarios(loader, &pattern, &self.lineage())?;
                Ok(self.with_scenario_contexts(ctxs))
            }
            LoadMode::All => self
                .load(LoadMode::StoriesWithScenarios, loader)?
                .load(LoadMode::ScenarioContexts, loader),
        }
    }

    /// Loads the [`Story`]s of this [`Feature`], without their children.
    fn load_stories(&self, loader: &(impl Loader + ?Sized)) -> ConfigResult<Vec<Story>> {
        let pattern = under(self.root(), "stories/*/*");
        of_kind(
            loader.enumerate(ComponentKind::Story, &pattern, &self.lineage())?,
            ComponentKind::Story,
            &pattern,
            |c| match c {
                Component::Story(s) => Ok(s),
                c @ (Component::Feature(_) | Component::Scenario(_)) => Err(c),
            },
        )
    }
}

impl Story {
    /// Loads the [`ScenarioContext`]s of this [`Story`], returning a new
    /// snapshot owning them.
    ///
    /// # Errors
    ///
    /// If the [`Loader`] fails.
    pub fn load(&self, loader: &(impl Loader + ?Sized)) -> ConfigResult<Self> {
        let pattern = under(self.root(), "scenarios/*");
        let ctxs = scenarios(loader, &pattern, &self.lineage())?;
        Ok(self.with_scenario_contexts(ctxs))
    }
}

/// Enumerates the [`ScenarioContext`]s matching the given `pattern`.
fn scenarios(
    loader: &(impl Loader + ?Sized),
    pattern: &str,
    lineage: &Lineage,
) -> ConfigResult<Vec<ScenarioContext>> {
    of_kind(
        loader.enumerate(ComponentKind::Scenario, pattern, lineage)?,
        ComponentKind::Scenario,
        pattern,
        |c| match c {
            Component::Scenario(ctx) => Ok(ctx),
            c @ (Component::Feature(_) | Component::Story(_)) => Err(c),
        },
    )
}

/// Unwraps the enumerated [`Component`]s, expecting all of them to be of the
/// given `kind`.
///
/// # Errors
///
/// [`ConfigError::UnexpectedComponent`] on the first [`Component`] of
/// another kind.
fn of_kind<T>(
    components: Vec<Component>,
    kind: ComponentKind,
    pattern: &str,
    unwrap: impl Fn(Component) -> Result<T, Component>,
) -> ConfigResult<Vec<T>> {
    components
        .into_iter()
        .map(|c| {
            unwrap(c).map_err(|c| ConfigError::UnexpectedComponent {
                expected: kind,
                found: c.kind(),
                path: pattern.to_owned(),
            })
        })
        .collect()
}

/// Loads all the [`Feature`]s defined under the given `root`, without their
/// children.
///
/// # Errors
///
/// - [`ConfigError::NoComponentFound`] if there are no [`Feature`]s;
/// - if the [`Loader`] fails.
pub fn load_features(root: &str, loader: &(impl Loader + ?Sized)) -> ConfigResult<Vec<Feature>> {
    let pattern = under(root, "features/*/*");
    let features = of_kind(
        loader.enumerate(ComponentKind::Feature, &pattern, &Lineage::default())?,
        ComponentKind::Feature,
        &pattern,
        |c| match c {
            Component::Feature(f) => Ok(f),
            c @ (Component::Story(_) | Component::Scenario(_)) => Err(c),
        },
    )?;

    if features.is_empty() {
        return Err(ConfigError::no_component_found(ComponentKind::Feature, root));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(root, features = features.len(), "loaded features");

    Ok(features)
}

/// Restricts the given [`Feature`]s to the ones with the given `ids`, keeping
/// all of them if `ids` are empty.
///
/// # Errors
///
/// [`ConfigError::NoComponentMatch`] listing the `ids` without a matching
/// [`Feature`].
pub fn select<S: AsRef<str>>(features: Vec<Feature>, ids: &[S]) -> ConfigResult<Vec<Feature>> {
    if ids.is_empty() {
        return Ok(features);
    }

    let offenders = ids
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| !features.iter().any(|f| f.id().as_str() == *id))
        .collect::<Vec<_>>();
    if !offenders.is_empty() {
        return Err(ConfigError::no_component_match(ComponentKind::Feature, offenders));
    }

    Ok(features
        .into_iter()
        .filter(|f| ids.iter().any(|id| id.as_ref() == f.id().as_str()))
        .collect())
}

/// Loads all the [`Feature`]s defined under the given `root` with all their
/// children, restricted to the given `ids` (if any).
///
/// # Errors
///
/// See [`load_features()`] and [`select()`].
pub fn load_all<S: AsRef<str>>(
    root: &str,
    ids: &[S],
    loader: &(impl Loader + ?Sized),
) -> ConfigResult<Vec<Feature>> {
    select(load_features(root, loader)?, ids)?
        .iter()
        .map(|f| f.load(LoadMode::All, loader))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scenario, Status};

    fn scenario(name: &str, ok: bool) -> Component {
        ScenarioContext::of(Scenario::builder(name).id(name).then("check", move || ok).build())
            .into()
    }

    fn registry() -> Registry {
        Registry::new()
            .register("root/features/shop/feature", |_| {
                Feature::builder("Shop").id("shop").build().into()
            })
            .register("root/features/bank/feature", |_| {
                Feature::builder("Bank").id("bank").build().into()
            })
            .register("root/features/shop/scenarios/browse", |_| scenario("browse", true))
            .register("root/features/shop/stories/pay/story", |_| {
                Story::builder("Pay").id("pay").build().into()
            })
            .register("root/features/shop/stories/pay/scenarios/card", |_| {
                scenario("card", false)
            })
    }

    #[test]
    fn glob_matches_single_segment() {
        let re = glob_regex("a/*/b.rs").unwrap();
        assert!(re.is_match("a/x/b.rs"));
        assert!(!re.is_match("a/x/y/b.rs"));
        assert!(!re.is_match("a/x/bXrs"));
    }

    #[test]
    fn loads_features_with_default_roots() {
        let features = load_features("root", &registry()).unwrap();
        let ids = features.iter().map(|f| f.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids, ["shop", "bank"]);
        assert_eq!(features[0].root(), "root/features/shop");
    }

    #[test]
    fn loads_children_by_mode() {
        let registry = registry();
        let shop = load_features("root", &registry).unwrap().remove(0);

        let bare = shop.load(LoadMode::Stories, &registry).unwrap();
        assert_eq!(bare.stories().len(), 1);
        assert!(bare.stories()[0].scenario_contexts().is_empty());
        assert_eq!(bare.stories()[0].status(), Status::FailedNoChildren);

        let all = shop.load(LoadMode::All, &registry).unwrap();
        assert_eq!(all.scenario_contexts().len(), 1);
        let card = &all.stories()[0].scenario_contexts()[0];
        assert_eq!(card.lineage().feature_id.as_ref().map(|f| f.as_str()), Some("shop"));
        assert_eq!(card.lineage().story_id.as_ref().map(|s| s.as_str()), Some("pay"));
    }

    #[test]
    fn rejects_unexpected_kind() {
        let registry = Registry::new()
            .register("r/features/x/feature", |_| Story::builder("S").build().into());
        let err = load_features("r", &registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnexpectedComponent {
                expected: ComponentKind::Feature,
                found: ComponentKind::Story,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unexpected_kind_from_any_loader() {
        /// [`Loader`] answering every query with a [`Story`].
        struct Stubborn;

        impl Loader for Stubborn {
            fn enumerate(
                &self,
                _: ComponentKind,
                _: &str,
                _: &Lineage,
            ) -> ConfigResult<Vec<Component>> {
                Ok(vec![Story::builder("S").id("s").build().into()])
            }
        }

        let err = load_features("r", &Stubborn).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected a feature definition at 'r/features/*/*', found a story",
        );

        let feature = Feature::builder("F").id("f").root("r/features/f").build();
        let err = feature.load(LoadMode::ScenarioContexts, &Stubborn).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnexpectedComponent {
                expected: ComponentKind::Scenario,
                found: ComponentKind::Story,
                ..
            }
        ));
        assert!(feature.load(LoadMode::Stories, &Stubborn).is_ok());
    }

    #[test]
    fn rejects_nameless_definition() {
        let registry = Registry::new()
            .register("r/features/x/feature", |_| Feature::builder("").build().into());
        let err = load_features("r", &registry).unwrap_err();
        assert_eq!(err.to_string(), "The feature definition at 'r/features/x/feature' has no name");
    }

    #[test]
    fn empty_root_is_e0000() {
        let err = load_features("elsewhere", &registry()).unwrap_err();
        assert!(err.to_string().starts_with("E0000: No features were found under path 'elsewhere'"));
    }

    #[test]
    fn selects_by_ids() {
        let features = load_features("root", &registry()).unwrap();

        let picked = select(features.clone(), &["bank"]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id().as_str(), "bank");

        assert_eq!(select(features.clone(), &[] as &[&str]).unwrap().len(), 2);

        let err = select(features, &["bank", "nope", "gone"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "E0001: The following selected feature ids couldn't be found: nope, gone",
        );
    }

    #[test]
    fn parses_load_modes_and_aliases() {
        assert_eq!("with_all".parse::<LoadMode>().unwrap(), LoadMode::All);
        assert_eq!(
            "with_stories_scenarios".parse::<LoadMode>().unwrap(),
            LoadMode::StoriesWithScenarios,
        );
        assert_eq!("scenario_contexts".parse::<LoadMode>().unwrap(), LoadMode::ScenarioContexts);
        assert!(matches!(
            "everything".parse::<LoadMode>(),
            Err(ConfigError::InvalidLoadMode { .. })
        ));
    }

    #[test]
    fn load_all_builds_full_tree() {
        let features = load_all("root", &["shop"], &registry()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].all_scenario_contexts().count(), 2);
        assert_eq!(features[0].status(), Status::None);
    }
}
