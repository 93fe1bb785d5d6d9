// Fold workers handed to a `Sequence`; any matching `FnMut` closure qualifies.
use crate::core::error::Error;

/// Outcome of one yielding fold step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step<Out> {
    /// Keep feeding elements.
    Continue(Out),
    /// Stop after this element and hand control back to the consumer.
    Yield(Out),
}

impl<Out> Step<Out> {
    pub fn is_yield(&self) -> bool {
        matches!(self, Step::Yield(_))
    }

    pub fn into_value(self) -> Out {
        match self {
            Step::Continue(out) | Step::Yield(out) => out,
        }
    }

    pub fn map<U, F>(self, f: F) -> Step<U>
    where
        F: FnOnce(Out) -> U,
    {
        match self {
            Step::Continue(out) => Step::Continue(f(out)),
            Step::Yield(out) => Step::Yield(f(out)),
        }
    }
}

pub trait Accumulator<Out, In> {
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Out, Error>;
}

impl<Out, In, F> Accumulator<Out, In> for F
where
    F: FnMut(Out, In) -> Result<Out, Error>,
{
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Out, Error> {
        self(accumulated, element)
    }
}

pub trait YieldingAccumulator<Out, In> {
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Step<Out>, Error>;
}

impl<Out, In, F> YieldingAccumulator<Out, In> for F
where
    F: FnMut(Out, In) -> Result<Step<Out>, Error>,
{
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Step<Out>, Error> {
        self(accumulated, element)
    }
}

/// Yielding worker that never pauses; lets an `Accumulator` drive a yielder chain.
pub struct NeverYield<A>(pub A);

impl<Out, In, A> YieldingAccumulator<Out, In> for NeverYield<A>
where
    A: Accumulator<Out, In>,
{
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Step<Out>, Error> {
        self.0.accumulate(accumulated, element).map(Step::Continue)
    }
}

/// Yielding worker that pauses after every `batch` consumed elements.
///
/// A batch size of zero is treated as one.
pub struct Batched<A> {
    inner: A,
    batch: usize,
    seen: usize,
}

impl<A> Batched<A> {
    pub fn new(inner: A, batch: usize) -> Self {
        Self {
            inner,
            batch: batch.max(1),
            seen: 0,
        }
    }
}

impl<Out, In, A> YieldingAccumulator<Out, In> for Batched<A>
where
    A: Accumulator<Out, In>,
{
    fn accumulate(&mut self, accumulated: Out, element: In) -> Result<Step<Out>, Error> {
        let out = self.inner.accumulate(accumulated, element)?;
        self.seen += 1;
        if self.seen == self.batch {
            self.seen = 0;
            Ok(Step::Yield(out))
        } else {
            Ok(Step::Continue(out))
        }
    }
}
