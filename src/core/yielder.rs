// Suspended folds: each `Yielder` is one checkpoint, owning the open resource while paused.
use std::fmt;

use crate::core::accumulator::{Step, YieldingAccumulator};
use crate::core::error::{Error, ErrorKind};
use crate::core::source::{Handle, Source, finish};

/// Resume and release capabilities of a paused fold.
///
/// Implementations own the open resource. `release` must be idempotent, and
/// dropping an implementation must release whatever is still held.
pub trait Continuation<'a, Out> {
    fn resume(self: Box<Self>, init: Out) -> Result<Yielder<'a, Out>, Error>;
    fn release(&mut self) -> Result<(), Error>;
}

enum State<'a, Out> {
    Paused(Box<dyn Continuation<'a, Out> + 'a>),
    Done,
    Released,
}

pub struct Yielder<'a, Out> {
    value: Out,
    state: State<'a, Out>,
}

impl<'a, Out> Yielder<'a, Out> {
    /// Terminal checkpoint; holds no resource.
    pub fn done(value: Out) -> Self {
        Self {
            value,
            state: State::Done,
        }
    }

    pub fn paused(value: Out, continuation: Box<dyn Continuation<'a, Out> + 'a>) -> Self {
        Self {
            value,
            state: State::Paused(continuation),
        }
    }

    pub fn get(&self) -> &Out {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut Out {
        &mut self.value
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// True after `release` abandoned a paused fold.
    pub fn is_released(&self) -> bool {
        matches!(self.state, State::Released)
    }

    /// Continues the fold from the next unconsumed element, seeding the
    /// accumulator with `init` for the resumed segment.
    pub fn next(self, init: Out) -> Result<Yielder<'a, Out>, Error> {
        match self.state {
            State::Paused(continuation) => continuation.resume(init),
            State::Done => Err(done_misuse()),
            State::Released => Err(released_misuse()),
        }
    }

    /// `next` seeded with this checkpoint's own value.
    pub fn resume(self) -> Result<Yielder<'a, Out>, Error> {
        match self.state {
            State::Paused(continuation) => continuation.resume(self.value),
            State::Done => Err(done_misuse()),
            State::Released => Err(released_misuse()),
        }
    }

    /// Releases the resource held by a paused fold. Safe to call repeatedly
    /// and on done yielders.
    pub fn release(&mut self) -> Result<(), Error> {
        let State::Paused(continuation) = &mut self.state else {
            return Ok(());
        };
        let released = continuation.release();
        self.state = State::Released;
        released
    }

    /// Releases any held resource and returns the current value.
    pub fn into_value(mut self) -> Result<Out, Error> {
        self.release()?;
        Ok(self.value)
    }
}

impl<Out: fmt::Debug> fmt::Debug for Yielder<'_, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Paused(_) => "paused",
            State::Done => "done",
            State::Released => "released",
        };
        f.debug_struct("Yielder")
            .field("value", &self.value)
            .field("state", &state)
            .finish()
    }
}

fn done_misuse() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("yielder is done")
        .with_hint("Check is_done() before calling next().")
}

fn released_misuse() -> Error {
    Error::new(ErrorKind::Usage).with_message("yielder was released")
}

struct Suspended<S: Source, A> {
    handle: Handle<S>,
    accumulator: A,
}

impl<'a, Out, S, A> Continuation<'a, Out> for Suspended<S, A>
where
    Out: 'a,
    S: Source + 'a,
    A: YieldingAccumulator<Out, S::Item> + 'a,
{
    fn resume(self: Box<Self>, init: Out) -> Result<Yielder<'a, Out>, Error> {
        let Suspended {
            handle,
            accumulator,
        } = *self;
        drive(handle, init, accumulator)
    }

    fn release(&mut self) -> Result<(), Error> {
        self.handle.release()
    }
}

/// Feeds elements from `handle` into `accumulator` until it yields or the
/// source runs dry.
///
/// On a yield the handle moves into the returned yielder. On exhaustion or
/// failure the handle is released before returning.
pub(crate) fn drive<'a, Out, S, A>(
    mut handle: Handle<S>,
    init: Out,
    mut accumulator: A,
) -> Result<Yielder<'a, Out>, Error>
where
    Out: 'a,
    S: Source + 'a,
    A: YieldingAccumulator<Out, S::Item> + 'a,
{
    let mut value = init;
    loop {
        let element = match handle.pull() {
            Ok(Some(element)) => element,
            Ok(None) => {
                handle.release()?;
                return Ok(Yielder::done(value));
            }
            Err(err) => return finish(&mut handle, Err(err)),
        };
        match accumulator.accumulate(value, element) {
            Ok(Step::Continue(out)) => value = out,
            Ok(Step::Yield(out)) => {
                return Ok(Yielder::paused(
                    out,
                    Box::new(Suspended {
                        handle,
                        accumulator,
                    }),
                ));
            }
            Err(err) => return finish(&mut handle, Err(err)),
        }
    }
}
