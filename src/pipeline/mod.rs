// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lazy pull-based sequence processing.
//!
//! A [`Pipeline`] is a chain of [`Stage`]s, each holding its upstream one.
//! Resuming the last [`Stage`] pulls exactly as many upstream items as it
//! needs to yield a single item: a [`Filter`] loops until its predicate
//! holds, and a [`FlatMap`] keeps pulling while expansions are empty.
//!
//! Pipelines are single-pass and resumed through `&mut`, so each one has a
//! single consumer. [`Pipeline::fork()`] and [`Query`] build fresh copies
//! of a chain for every other consumer.
//!
//! ```rust
//! # use storyline::Pipeline;
//! let words = Pipeline::source(["a b", "", "c"])
//!     .flat_map(|line| line.split_whitespace().collect::<Vec<_>>())
//!     .map(str::to_uppercase)
//!     .to_list();
//!
//! assert_eq!(words, Ok(vec!["A".to_owned(), "B".to_owned(), "C".to_owned()]));
//! ```

mod query;
mod stage;

use std::{convert::Infallible, fmt, sync::Arc};

#[doc(inline)]
pub use self::{
    query::Query,
    stage::{BoxStage, Filter, FlatMap, Halt, Map, MapErr, Source, Stage, TryMap},
};

/// Chain of [`Stage`]s driven by its consumer.
pub struct Pipeline<T, E = Infallible> {
    /// Last [`Stage`] of the chain.
    stage: BoxStage<T, E>,
}

impl<T, E> fmt::Debug for Pipeline<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Pipeline<T> {
    /// Creates a new [`Pipeline`] yielding every element of `items` once, in
    /// order.
    #[must_use]
    pub fn source(items: impl IntoIterator<Item = T>) -> Self {
        Self::from_boxed(Box::new(Source::new(items)))
    }
}

impl<T: 'static> Pipeline<T> {
    /// Makes transforms of this [`Pipeline`] able to fail with `E`.
    #[must_use]
    pub fn fallible<E: 'static>(self) -> Pipeline<T, E> {
        self.map_err(|never| match never {})
    }
}

impl<T: 'static, E: 'static> Pipeline<T, E> {
    /// Creates a new [`Pipeline`] ending with the given [`Stage`].
    #[must_use]
    pub fn from_stage(stage: impl Stage<T, E> + 'static) -> Self {
        Self::from_boxed(Box::new(stage))
    }

    /// Creates a new [`Pipeline`] ending with the given boxed [`Stage`].
    #[must_use]
    pub fn from_boxed(stage: BoxStage<T, E>) -> Self {
        Self { stage }
    }

    /// Appends a [`Filter`] stage yielding only items satisfying the given
    /// `predicate`.
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self::from_stage(Filter::new(self.stage, Arc::new(predicate)))
    }

    /// Appends a [`Map`] stage.
    #[must_use]
    pub fn map<U: 'static>(self, transform: impl Fn(T) -> U + 'static) -> Pipeline<U, E> {
        Pipeline::from_stage(Map::new(self.stage, Arc::new(transform)))
    }

    /// Appends a [`TryMap`] stage, which errors halt the [`Pipeline`] with
    /// [`Halt::Failed`].
    #[must_use]
    pub fn try_map<U: 'static>(
        self,
        transform: impl Fn(T) -> Result<U, E> + 'static,
    ) -> Pipeline<U, E> {
        Pipeline::from_stage(TryMap::new(self.stage, Arc::new(transform)))
    }

    /// Appends a [`FlatMap`] stage, yielding the elements of each expansion
    /// one by one.
    #[must_use]
    pub fn flat_map<U, I>(self, transform: impl Fn(T) -> I + 'static) -> Pipeline<U, E>
    where
        U: 'static,
        I: IntoIterator<Item = U>,
    {
        Pipeline::from_stage(FlatMap::new(
            self.stage,
            Arc::new(move |item: T| -> Vec<U> { transform(item).into_iter().collect() }),
        ))
    }

    /// Appends a [`MapErr`] stage converting errors of this [`Pipeline`].
    #[must_use]
    pub fn map_err<F: 'static>(self, convert: impl Fn(E) -> F + 'static) -> Pipeline<T, F> {
        Pipeline::from_stage(MapErr::new(self.stage, Arc::new(convert)))
    }

    /// Builds the given [`Query`] on top of this [`Pipeline`].
    #[must_use]
    pub fn pipe<U: 'static>(self, query: &Query<T, U, E>) -> Pipeline<U, E> {
        Pipeline::from_boxed(query.apply(self.stage))
    }

    /// Returns an independent copy of this [`Pipeline`], starting from the
    /// beginning of its source.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::from_boxed(self.stage.fresh())
    }

    /// Resumes this [`Pipeline`] until it yields the next item.
    ///
    /// # Errors
    ///
    /// See [`Stage::resume()`].
    pub fn resume(&mut self) -> Result<T, Halt<E>> {
        self.stage.resume()
    }

    /// Drives this [`Pipeline`] until it's exhausted, collecting all the
    /// yielded items.
    ///
    /// # Errors
    ///
    /// With the first [`Halt::Failed`] error.
    pub fn to_list(mut self) -> Result<Vec<T>, E> {
        let mut items = Vec::new();
        loop {
            match self.stage.resume() {
                Ok(item) => items.push(item),
                Err(Halt::Exhausted) => return Ok(items),
                Err(Halt::Failed(e)) => return Err(e),
            }
        }
    }

    /// Drives this [`Pipeline`] for at most `limit` items, discarding them,
    /// or until it's exhausted if `limit` is `0`.
    ///
    /// Returns the number of items driven.
    ///
    /// # Errors
    ///
    /// With the first [`Halt::Failed`] error.
    pub fn execute(&mut self, limit: usize) -> Result<usize, E> {
        let mut driven = 0;
        while limit == 0 || driven < limit {
            match self.stage.resume() {
                Ok(_) => driven += 1,
                Err(Halt::Exhausted) => break,
                Err(Halt::Failed(e)) => return Err(e),
            }
        }
        Ok(driven)
    }
}

impl<T: 'static, E: 'static> Iterator for Pipeline<T, E> {
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.resume() {
            Ok(item) => Some(Ok(item)),
            Err(halt) => halt.failure().map(Err),
        }
    }
}
