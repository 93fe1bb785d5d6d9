// Sorted merge of already-sorted sequences, driven through per-input yielders.
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::core::accumulator::{Accumulator, YieldingAccumulator};
use crate::core::combinators::EachSource;
use crate::core::error::Error;
use crate::core::sequence::{Sequence, fold_source, yield_source};
use crate::core::source::Source;
use crate::core::yielder::Yielder;

/// Merges inputs that are each sorted ascending into one ascending sequence.
///
/// Every input is opened when the fold begins and released as soon as it runs
/// dry. Ties are broken by input position, so the merge is stable.
pub struct MergeSequence<S> {
    sequences: Vec<S>,
}

impl<S> MergeSequence<S> {
    pub fn new(sequences: Vec<S>) -> Self {
        Self { sequences }
    }
}

struct Head<'a, T> {
    element: T,
    input: usize,
    rest: EachSource<'a, T>,
}

impl<T: Ord> PartialEq for Head<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Head<'_, T> {}

impl<T: Ord> PartialOrd for Head<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Head<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.element
            .cmp(&other.element)
            .then(self.input.cmp(&other.input))
    }
}

struct MergeSource<'a, T> {
    heads: BinaryHeap<Reverse<Head<'a, T>>>,
}

impl<'a, T: Ord + 'a> MergeSource<'a, T> {
    fn open<S>(sequences: &'a [S]) -> Result<Self, Error>
    where
        S: Sequence<T>,
    {
        let mut merge = Self {
            heads: BinaryHeap::with_capacity(sequences.len()),
        };
        for (input, sequence) in sequences.iter().enumerate() {
            if let Err(err) = merge.push_input(input, sequence) {
                if let Err(close_err) = merge.close() {
                    tracing::warn!(error = %close_err, "failed to release merge inputs after open failure");
                }
                return Err(err);
            }
        }
        Ok(merge)
    }

    fn push_input<S>(&mut self, input: usize, sequence: &'a S) -> Result<(), Error>
    where
        S: Sequence<T>,
    {
        let mut rest = EachSource::open(sequence)?;
        match rest.pull()? {
            Some(element) => {
                self.heads.push(Reverse(Head {
                    element,
                    input,
                    rest,
                }));
                Ok(())
            }
            None => rest.close(),
        }
    }
}

impl<T: Ord> Source for MergeSource<'_, T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>, Error> {
        let Some(Reverse(head)) = self.heads.pop() else {
            return Ok(None);
        };
        let Head {
            element,
            input,
            mut rest,
        } = head;
        match rest.pull()? {
            Some(next) => self.heads.push(Reverse(Head {
                element: next,
                input,
                rest,
            })),
            None => rest.close()?,
        }
        Ok(Some(element))
    }

    fn close(self) -> Result<(), Error> {
        let mut first_err = None;
        for Reverse(head) in self.heads {
            if let Err(err) = head.rest.close() {
                match first_err {
                    None => first_err = Some(err),
                    Some(_) => {
                        tracing::warn!(error = %err, "failed to release merge input");
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<S, T> Sequence<T> for MergeSequence<S>
where
    S: Sequence<T>,
    T: Ord,
{
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, T>,
    {
        let source = MergeSource::open(&self.sequences)?;
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
        let source = MergeSource::open(&self.sequences)?;
        yield_source(source, init, accumulator)
    }
}
