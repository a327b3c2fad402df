//! [`Stage`]s of a [`Pipeline`].
//!
//! [`Pipeline`]: super::Pipeline

use std::{collections::VecDeque, fmt, sync::Arc};

/// Reason of a [`Stage`] not yielding an item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Halt<E> {
    /// Upstream has no more items. It's a control signal, not an error.
    Exhausted,

    /// User-provided transform failed.
    Failed(E),
}

impl<E> Halt<E> {
    /// Indicates whether this [`Halt`] is the end of a sequence.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns the error of this [`Halt`], if it's not the end of a
    /// sequence.
    #[must_use]
    pub fn failure(self) -> Option<E> {
        match self {
            Self::Exhausted => None,
            Self::Failed(e) => Some(e),
        }
    }

    /// Maps the error of this [`Halt`].
    #[must_use]
    pub fn map<F>(self, f: impl FnOnce(E) -> F) -> Halt<F> {
        match self {
            Self::Exhausted => Halt::Exhausted,
            Self::Failed(e) => Halt::Failed(f(e)),
        }
    }
}

/// Suspend/resume unit of a [`Pipeline`].
///
/// Every [`Stage::resume()`] call requests items from the upstream until it
/// has exactly one item to yield downstream, or the upstream halts.
///
/// [`Pipeline`]: super::Pipeline
pub trait Stage<T, E> {
    /// Resumes this [`Stage`] until it yields the next item.
    ///
    /// # Errors
    ///
    /// - [`Halt::Exhausted`] once the sequence is over;
    /// - [`Halt::Failed`] if a transform failed, propagated unchanged.
    fn resume(&mut self) -> Result<T, Halt<E>>;

    /// Returns a copy of the whole chain ending with this [`Stage`], without
    /// any progress accumulated so far.
    fn fresh(&self) -> BoxStage<T, E>;
}

/// Type-erased [`Stage`].
pub type BoxStage<T, E> = Box<dyn Stage<T, E>>;

/// Terminal producer yielding every element of a collection once, in order.
pub struct Source<T> {
    /// Elements to yield, shared between fresh copies.
    items: Arc<[T]>,

    /// Index of the next element to yield.
    cursor: usize,
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("len", &self.items.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl<T> Source<T> {
    /// Creates a new [`Source`] over the given `items`.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self { items: items.into_iter().collect(), cursor: 0 }
    }
}

impl<T: Clone + 'static, E: 'static> Stage<T, E> for Source<T> {
    fn resume(&mut self) -> Result<T, Halt<E>> {
        let item = self.items.get(self.cursor).cloned().ok_or(Halt::Exhausted)?;
        self.cursor += 1;
        Ok(item)
    }

    fn fresh(&self) -> BoxStage<T, E> {
        Box::new(Self { items: Arc::clone(&self.items), cursor: 0 })
    }
}

/// Predicate of a [`Filter`].
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool>;

/// [`Stage`] yielding only upstream items satisfying a predicate.
pub struct Filter<T, E> {
    /// Upstream [`Stage`].
    upstream: BoxStage<T, E>,

    /// Predicate an item should satisfy to be yielded.
    predicate: Predicate<T>,
}

impl<T, E> Filter<T, E> {
    /// Creates a new [`Filter`] on top of the given `upstream`.
    pub fn new(upstream: BoxStage<T, E>, predicate: Predicate<T>) -> Self {
        Self { upstream, predicate }
    }
}

impl<T: 'static, E: 'static> Stage<T, E> for Filter<T, E> {
    fn resume(&mut self) -> Result<T, Halt<E>> {
        loop {
            let item = self.upstream.resume()?;
            if (self.predicate)(&item) {
                return Ok(item);
            }
        }
    }

    fn fresh(&self) -> BoxStage<T, E> {
        Box::new(Self::new(self.upstream.fresh(), Arc::clone(&self.predicate)))
    }
}

/// Transform of a [`Map`].
pub type Transform<T, U> = Arc<dyn Fn(T) -> U>;

/// [`Stage`] yielding a transformed upstream item.
pub struct Map<T, U, E> {
    /// Upstream [`Stage`].
    upstream: BoxStage<T, E>,

    /// Transform applied to every item.
    transform: Transform<T, U>,
}

impl<T, U, E> Map<T, U, E> {
    /// Creates a new [`Map`] on top of the given `upstream`.
    pub fn new(upstream: BoxStage<T, E>, transform: Transform<T, U>) -> Self {
        Self { upstream, transform }
    }
}

impl<T: 'static, U: 'static, E: 'static> Stage<U, E> for Map<T, U, E> {
    fn resume(&mut self) -> Result<U, Halt<E>> {
        self.upstream.resume().map(&*self.transform)
    }

    fn fresh(&self) -> BoxStage<U, E> {
        Box::new(Self::new(self.upstream.fresh(), Arc::clone(&self.transform)))
    }
}

/// [`Stage`] yielding a transformed upstream item, or [`Halt::Failed`] if
/// the transform fails.
pub struct TryMap<T, U, E> {
    /// Upstream [`Stage`].
    upstream: BoxStage<T, E>,

    /// Fallible transform applied to every item.
    transform: Transform<T, Result<U, E>>,
}

impl<T, U, E> TryMap<T, U, E> {
    /// Creates a new [`TryMap`] on top of the given `upstream`.
    pub fn new(upstream: BoxStage<T, E>, transform: Transform<T, Result<U, E>>) -> Self {
        Self { upstream, transform }
    }
}

impl<T: 'static, U: 'static, E: 'static> Stage<U, E> for TryMap<T, U, E> {
    fn resume(&mut self) -> Result<U, Halt<E>> {
        let item = self.upstream.resume()?;
        (self.transform)(item).map_err(Halt::Failed)
    }

    fn fresh(&self) -> BoxStage<U, E> {
        Box::new(Self::new(self.upstream.fresh(), Arc::clone(&self.transform)))
    }
}

/// [`Stage`] expanding every upstream item into a sub-sequence, yielding
/// its elements one per resume.
///
/// An empty sub-sequence makes it pull the next upstream item, so it never
/// yields nothing while the upstream has items.
pub struct FlatMap<T, U, E> {
    /// Upstream [`Stage`].
    upstream: BoxStage<T, E>,

    /// Expansion applied to every item.
    transform: Transform<T, Vec<U>>,

    /// Not yet yielded elements of the current sub-sequence.
    pending: VecDeque<U>,
}

impl<T, U, E> FlatMap<T, U, E> {
    /// Creates a new [`FlatMap`] on top of the given `upstream`.
    pub fn new(upstream: BoxStage<T, E>, transform: Transform<T, Vec<U>>) -> Self {
        Self { upstream, transform, pending: VecDeque::new() }
    }
}

impl<T: 'static, U: 'static, E: 'static> Stage<U, E> for FlatMap<T, U, E> {
    fn resume(&mut self) -> Result<U, Halt<E>> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Ok(next);
            }
            let item = self.upstream.resume()?;
            self.pending.extend((self.transform)(item));
        }
    }

    fn fresh(&self) -> BoxStage<U, E> {
        Box::new(Self::new(self.upstream.fresh(), Arc::clone(&self.transform)))
    }
}

/// [`Stage`] converting the errors of its upstream.
pub struct MapErr<T, E, F> {
    /// Upstream [`Stage`].
    upstream: BoxStage<T, E>,

    /// Conversion of the upstream errors.
    convert: Transform<E, F>,
}

impl<T, E, F> MapErr<T, E, F> {
    /// Creates a new [`MapErr`] on top of the given `upstream`.
    pub fn new(upstream: BoxStage<T, E>, convert: Transform<E, F>) -> Self {
        Self { upstream, convert }
    }
}

impl<T: 'static, E: 'static, F: 'static> Stage<T, F> for MapErr<T, E, F> {
    fn resume(&mut self) -> Result<T, Halt<F>> {
        self.upstream.resume().map_err(|halt| halt.map(&*self.convert))
    }

    fn fresh(&self) -> BoxStage<T, F> {
        Box::new(Self::new(self.upstream.fresh(), Arc::clone(&self.convert)))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn source(items: &[u8]) -> BoxStage<u8, Infallible> {
        Box::new(Source::new(items.to_vec()))
    }

    #[test]
    fn source_halts_after_last_item() {
        let mut s = source(&[1, 2]);
        assert_eq!(s.resume(), Ok(1));
        assert_eq!(s.resume(), Ok(2));
        assert_eq!(s.resume(), Err(Halt::Exhausted));
        assert_eq!(s.resume(), Err(Halt::Exhausted));
    }

    #[test]
    fn fresh_copy_drops_progress() {
        let mut f = Filter::new(source(&[1, 2, 3, 4]), Arc::new(|n: &u8| n % 2 == 0));
        assert_eq!(f.resume(), Ok(2));

        let mut copy = f.fresh();
        assert_eq!(copy.resume(), Ok(2));
        assert_eq!(copy.resume(), Ok(4));
        assert_eq!(f.resume(), Ok(4));
        assert_eq!(f.resume(), Err(Halt::Exhausted));
    }

    #[test]
    fn flat_map_skips_empty_expansions() {
        let mut f = FlatMap::new(
            source(&[0, 2, 0, 1]),
            Arc::new(|n: u8| vec![n; usize::from(n)]),
        );
        assert_eq!(f.resume(), Ok(2));
        assert_eq!(f.resume(), Ok(2));
        assert_eq!(f.resume(), Ok(1));
        assert_eq!(f.resume(), Err(Halt::Exhausted));
    }

    #[test]
    fn try_map_failure_is_not_exhaustion() {
        let mut m = TryMap::new(
            Box::new(Source::new([1_u8, 0, 2])) as BoxStage<u8, String>,
            Arc::new(|n: u8| if n == 0 { Err("zero".to_owned()) } else { Ok(10 / n) }),
        );
        assert_eq!(m.resume(), Ok(10));
        let halt = m.resume().unwrap_err();
        assert!(!halt.is_exhausted());
        assert_eq!(halt.failure().as_deref(), Some("zero"));
        assert_eq!(m.resume(), Ok(5));
        assert!(m.resume().unwrap_err().is_exhausted());
    }
}
