// Sequence contract and the generic fold drivers; callers hand in a worker, never pull.
use std::marker::PhantomData;

use crate::core::accumulator::{Accumulator, YieldingAccumulator};
use crate::core::combinators::{Filtered, Limited, Mapped};
use crate::core::error::Error;
use crate::core::source::{Handle, IterSource, Source, finish};
use crate::core::yielder::{Yielder, drive};

pub trait Sequence<T> {
    /// Folds every element into `accumulator`, starting from `init`.
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, T>;

    /// Folds until `accumulator` yields or the sequence is exhausted.
    ///
    /// A paused yielder owns the open resource; callers that stop before
    /// `is_done()` must `release` it (dropping it also releases).
    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        T: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, T> + 'a;

    fn map<U, F>(self, f: F) -> Mapped<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> U,
    {
        Mapped::new(self, f)
    }

    fn filter<P>(self, predicate: P) -> Filtered<Self, P>
    where
        Self: Sized,
        P: Fn(&T) -> bool,
    {
        Filtered::new(self, predicate)
    }

    fn limit(self, limit: usize) -> Limited<Self>
    where
        Self: Sized,
    {
        Limited::new(self, limit)
    }

    fn to_vec(&self) -> Result<Vec<T>, Error> {
        self.accumulate(
            Vec::new(),
            |mut items: Vec<T>, item: T| -> Result<Vec<T>, Error> {
                items.push(item);
                Ok(items)
            },
        )
    }
}

/// Eager fold over an open source, releasing it on every exit path.
pub(crate) fn fold_source<Out, S, A>(source: S, init: Out, mut accumulator: A) -> Result<Out, Error>
where
    S: Source,
    A: Accumulator<Out, S::Item>,
{
    let mut handle = Handle::new(source);
    let outcome = fold_all(&mut handle, init, &mut accumulator);
    finish(&mut handle, outcome)
}

fn fold_all<Out, S, A>(handle: &mut Handle<S>, init: Out, accumulator: &mut A) -> Result<Out, Error>
where
    S: Source,
    A: Accumulator<Out, S::Item>,
{
    let mut value = init;
    while let Some(element) = handle.pull()? {
        value = accumulator.accumulate(value, element)?;
    }
    Ok(value)
}

/// Suspendable fold over an open source.
pub(crate) fn yield_source<'a, Out, S, A>(
    source: S,
    init: Out,
    accumulator: A,
) -> Result<Yielder<'a, Out>, Error>
where
    Out: 'a,
    S: Source + 'a,
    A: YieldingAccumulator<Out, S::Item> + 'a,
{
    drive(Handle::new(source), init, accumulator)
}

/// Sequence over a resource opened on demand by `opener`.
///
/// Repeatable: every fold calls `opener` again and releases what it opened.
/// If `opener` fails nothing was acquired, so nothing is released.
pub struct BaseSequence<F, S> {
    opener: F,
    _source: PhantomData<fn() -> S>,
}

impl<F, S> BaseSequence<F, S>
where
    F: Fn() -> Result<S, Error>,
    S: Source,
{
    pub fn new(opener: F) -> Self {
        Self {
            opener,
            _source: PhantomData,
        }
    }
}

impl<F, S> Sequence<S::Item> for BaseSequence<F, S>
where
    F: Fn() -> Result<S, Error>,
    S: Source,
{
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, S::Item>,
    {
        let source = (self.opener)()?;
        tracing::debug!("opened sequence resource for accumulate");
        fold_source(source, init, accumulator)
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        S::Item: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, S::Item> + 'a,
    {
        let source = (self.opener)()?;
        tracing::debug!("opened sequence resource for yielder");
        yield_source(source, init, accumulator)
    }
}

/// In-memory sequence over anything cloneable and iterable; repeatable.
#[derive(Clone, Debug)]
pub struct SimpleSequence<I> {
    items: I,
}

impl<I> SimpleSequence<I>
where
    I: IntoIterator + Clone,
{
    pub fn new(items: I) -> Self {
        Self { items }
    }
}

impl<I> Sequence<I::Item> for SimpleSequence<I>
where
    I: IntoIterator + Clone,
{
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, I::Item>,
    {
        fold_source(
            IterSource::new(self.items.clone().into_iter()),
            init,
            accumulator,
        )
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        I::Item: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, I::Item> + 'a,
    {
        yield_source(
            IterSource::new(self.items.clone().into_iter()),
            init,
            accumulator,
        )
    }
}
