// Combinators: map/filter wrap the worker; limit/concat pull inner sequences through `each`.
use std::marker::PhantomData;

use crate::core::accumulator::{Accumulator, Step, YieldingAccumulator};
use crate::core::error::Error;
use crate::core::sequence::{Sequence, fold_source, yield_source};
use crate::core::source::Source;
use crate::core::yielder::Yielder;

/// Yielder that pauses on every element, holding it as `Some(element)`.
///
/// The done yielder holds `None`.
pub fn each<'a, T, S>(sequence: &'a S) -> Result<Yielder<'a, Option<T>>, Error>
where
    T: 'a,
    S: Sequence<T>,
{
    sequence.to_yielder(
        None,
        |_: Option<T>, element: T| -> Result<Step<Option<T>>, Error> {
            Ok(Step::Yield(Some(element)))
        },
    )
}

/// Pull adapter over an `each` yielder.
///
/// Opening pulls the first element from the inner sequence; later elements
/// are pulled one at a time, only when asked for.
pub(crate) struct EachSource<'a, T> {
    current: Option<Yielder<'a, Option<T>>>,
}

impl<'a, T: 'a> EachSource<'a, T> {
    pub(crate) fn open<S>(sequence: &'a S) -> Result<Self, Error>
    where
        S: Sequence<T>,
    {
        Ok(Self {
            current: Some(each(sequence)?),
        })
    }
}

impl<T> Source for EachSource<'_, T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>, Error> {
        loop {
            let Some(mut yielder) = self.current.take() else {
                return Ok(None);
            };
            if let Some(element) = yielder.get_mut().take() {
                self.current = Some(yielder);
                return Ok(Some(element));
            }
            if yielder.is_done() {
                self.current = Some(yielder);
                return Ok(None);
            }
            self.current = Some(yielder.next(None)?);
        }
    }

    fn close(self) -> Result<(), Error> {
        match self.current {
            Some(mut yielder) => yielder.release(),
            None => Ok(()),
        }
    }
}

pub struct Mapped<S, F, T> {
    inner: S,
    f: F,
    _element: PhantomData<fn(T)>,
}

impl<S, F, T> Mapped<S, F, T> {
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _element: PhantomData,
        }
    }
}

impl<S, F, T, U> Sequence<U> for Mapped<S, F, T>
where
    S: Sequence<T>,
    F: Fn(T) -> U,
{
    fn accumulate<Out, A>(&self, init: Out, mut accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, U>,
    {
        let f = &self.f;
        self.inner
            .accumulate(init, |acc: Out, element: T| -> Result<Out, Error> {
                accumulator.accumulate(acc, f(element))
            })
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        mut accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        U: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, U> + 'a,
    {
        let f = &self.f;
        self.inner.to_yielder(
            init,
            move |acc: Out, element: T| -> Result<Step<Out>, Error> {
                accumulator.accumulate(acc, f(element))
            },
        )
    }
}

pub struct Filtered<S, P> {
    inner: S,
    predicate: P,
}

impl<S, P> Filtered<S, P> {
    pub fn new(inner: S, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<S, P, T> Sequence<T> for Filtered<S, P>
where
    S: Sequence<T>,
    P: Fn(&T) -> bool,
{
    fn accumulate<Out, A>(&self, init: Out, mut accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, T>,
    {
        let predicate = &self.predicate;
        self.inner
            .accumulate(init, |acc: Out, element: T| -> Result<Out, Error> {
                if predicate(&element) {
                    accumulator.accumulate(acc, element)
                } else {
                    Ok(acc)
                }
            })
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        mut accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        T: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, T> + 'a,
    {
        let predicate = &self.predicate;
        self.inner.to_yielder(
            init,
            move |acc: Out, element: T| -> Result<Step<Out>, Error> {
                if predicate(&element) {
                    accumulator.accumulate(acc, element)
                } else {
                    Ok(Step::Continue(acc))
                }
            },
        )
    }
}

/// At most `limit` leading elements; the inner resource is released as soon
/// as the limit is reached.
pub struct Limited<S> {
    inner: S,
    limit: usize,
}

impl<S> Limited<S> {
    pub fn new(inner: S, limit: usize) -> Self {
        Self { inner, limit }
    }
}

struct LimitSource<'a, T> {
    inner: EachSource<'a, T>,
    remaining: usize,
}

impl<T> Source for LimitSource<'_, T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>, Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let next = self.inner.pull()?;
        if next.is_some() {
            self.remaining -= 1;
        }
        Ok(next)
    }

    fn close(self) -> Result<(), Error> {
        self.inner.close()
    }
}

impl<S, T> Sequence<T> for Limited<S>
where
    S: Sequence<T>,
{
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, T>,
    {
        if self.limit == 0 {
            return Ok(init);
        }
        let source = LimitSource {
            inner: EachSource::open(&self.inner)?,
            remaining: self.limit,
        };
        fold_source(source, init, accumulator)
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        T: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, T> + 'a,
    {
        if self.limit == 0 {
            return Ok(Yielder::done(init));
        }
        let source = LimitSource {
            inner: EachSource::open(&self.inner)?,
            remaining: self.limit,
        };
        yield_source(source, init, accumulator)
    }
}

/// Inner sequences back to back; each one is opened only after the previous
/// one is exhausted and released.
pub struct Concat<S> {
    sequences: Vec<S>,
}

impl<S> Concat<S> {
    pub fn new(sequences: Vec<S>) -> Self {
        Self { sequences }
    }
}

struct ConcatSource<'a, S, T> {
    pending: std::slice::Iter<'a, S>,
    current: Option<EachSource<'a, T>>,
}

impl<'a, S, T> Source for ConcatSource<'a, S, T>
where
    S: Sequence<T>,
    T: 'a,
{
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>, Error> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(element) = current.pull()? {
                    return Ok(Some(element));
                }
                if let Some(finished) = self.current.take() {
                    finished.close()?;
                }
            }
            match self.pending.next() {
                Some(sequence) => self.current = Some(EachSource::open(sequence)?),
                None => return Ok(None),
            }
        }
    }

    fn close(self) -> Result<(), Error> {
        match self.current {
            Some(current) => current.close(),
            None => Ok(()),
        }
    }
}

impl<S, T> Sequence<T> for Concat<S>
where
    S: Sequence<T>,
{
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, T>,
    {
        let source = ConcatSource {
            pending: self.sequences.iter(),
            current: None,
        };
        fold_source(source, init, accumulator)
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        T: 'a,
        Out: 'a,
        A: YieldingAccumulator<Out, T> + 'a,
    {
        let source = ConcatSource {
            pending: self.sequences.iter(),
            current: None,
        };
        yield_source(source, init, accumulator)
    }
}
