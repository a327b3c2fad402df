//! Reusable [`Pipeline`] definitions.

use std::{convert::Infallible, fmt, sync::Arc};

use super::{
    stage::{BoxStage, Filter, FlatMap, Map, Source, TryMap},
    Pipeline,
};

/// Builder of a [`Stage`] chain on top of the given upstream.
///
/// [`Stage`]: super::Stage
type Build<T, U, E> = Arc<dyn Fn(BoxStage<T, E>) -> BoxStage<U, E>>;

/// [`Pipeline`] definition without a source.
///
/// Every [`Query::over()`] or [`Pipeline::pipe()`] builds a brand new chain
/// of [`Stage`]s, so the same [`Query`] may be replayed against any number
/// of sources without sharing any progress between them.
///
/// ```rust
/// # use storyline::pipeline::Query;
/// let evens = Query::<u32>::new().filter(|n| n % 2 == 0).map(|n| n * 10);
///
/// assert_eq!(evens.over([1, 2, 3, 4]).to_list(), Ok(vec![20, 40]));
/// assert_eq!(evens.over([6, 7]).to_list(), Ok(vec![60]));
/// ```
///
/// [`Stage`]: super::Stage
pub struct Query<T, U = T, E = Infallible> {
    /// Builder of the [`Stage`] chain.
    ///
    /// [`Stage`]: super::Stage
    build: Build<T, U, E>,
}

impl<T, U, E> Clone for Query<T, U, E> {
    fn clone(&self) -> Self {
        Self { build: Arc::clone(&self.build) }
    }
}

impl<T, U, E> fmt::Debug for Query<T, U, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").finish_non_exhaustive()
    }
}

impl<T: 'static> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Query<T> {
    /// Creates a new [`Query`] passing items through as they are.
    #[must_use]
    pub fn new() -> Self {
        Self { build: Arc::new(|upstream: BoxStage<T, Infallible>| upstream) }
    }
}

impl<T: 'static, E: 'static> Query<T, T, E> {
    /// Creates a new [`Query`] which transforms may fail with `E`.
    #[must_use]
    pub fn fallible() -> Self {
        Self { build: Arc::new(|upstream: BoxStage<T, E>| upstream) }
    }
}

impl<T: 'static, U: 'static, E: 'static> Query<T, U, E> {
    /// Appends a [`Filter`] stage.
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&U) -> bool + 'static) -> Self {
        let predicate = Arc::new(predicate) as Arc<dyn Fn(&U) -> bool>;
        self.then(move |s| -> BoxStage<U, E> {
            Box::new(Filter::new(s, Arc::clone(&predicate)))
        })
    }

    /// Appends a [`Map`] stage.
    #[must_use]
    pub fn map<V: 'static>(self, transform: impl Fn(U) -> V + 'static) -> Query<T, V, E> {
        let transform = Arc::new(transform) as Arc<dyn Fn(U) -> V>;
        self.then(move |s| -> BoxStage<V, E> {
            Box::new(Map::new(s, Arc::clone(&transform)))
        })
    }

    /// Appends a [`TryMap`] stage.
    #[must_use]
    pub fn try_map<V: 'static>(
        self,
        transform: impl Fn(U) -> Result<V, E> + 'static,
    ) -> Query<T, V, E> {
        let transform = Arc::new(transform) as Arc<dyn Fn(U) -> Result<V, E>>;
        self.then(move |s| -> BoxStage<V, E> {
            Box::new(TryMap::new(s, Arc::clone(&transform)))
        })
    }

    /// Appends a [`FlatMap`] stage.
    #[must_use]
    pub fn flat_map<V, I>(self, transform: impl Fn(U) -> I + 'static) -> Query<T, V, E>
    where
        V: 'static,
        I: IntoIterator<Item = V>,
    {
        let transform = Arc::new(move |item: U| -> Vec<V> {
            transform(item).into_iter().collect()
        }) as Arc<dyn Fn(U) -> Vec<V>>;
        self.then(move |s| -> BoxStage<V, E> {
            Box::new(FlatMap::new(s, Arc::clone(&transform)))
        })
    }

    /// Builds a new [`Pipeline`] of this [`Query`] over the given `items`.
    #[must_use]
    pub fn over(&self, items: impl IntoIterator<Item = T>) -> Pipeline<U, E>
    where
        T: Clone,
    {
        Pipeline::from_boxed(self.apply(Box::new(Source::new(items))))
    }

    /// Builds a new chain of this [`Query`] on top of the given `upstream`.
    pub(super) fn apply(&self, upstream: BoxStage<T, E>) -> BoxStage<U, E> {
        (self.build)(upstream)
    }

    /// Composes the chain built by this [`Query`] with the given one.
    fn then<V: 'static>(
        self,
        next: impl Fn(BoxStage<U, E>) -> BoxStage<V, E> + 'static,
    ) -> Query<T, V, E> {
        let prev = self.build;
        Query { build: Arc::new(move |upstream: BoxStage<T, E>| next(prev(upstream))) }
    }
}
