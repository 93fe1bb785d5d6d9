// Pull-side resource contract and the guard that releases it exactly once.
use crate::core::error::Error;

/// A producer that owns an open resource and hands out elements one at a time.
///
/// Only the fold machinery in this crate pulls from a `Source`; consumers see
/// sequences, never sources.
pub trait Source {
    type Item;

    /// Returns the next element, or `None` once the resource is exhausted.
    fn pull(&mut self) -> Result<Option<Self::Item>, Error>;

    /// Releases the underlying resource. Taking `self` by value makes a second
    /// close unrepresentable.
    fn close(self) -> Result<(), Error>;
}

/// Owns an open `Source` and guarantees `close` runs at most once.
///
/// `release` closes eagerly and reports failure; dropping an unreleased handle
/// closes on a best-effort basis and logs failure.
#[derive(Debug)]
pub(crate) struct Handle<S: Source> {
    source: Option<S>,
}

impl<S: Source> Handle<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub(crate) fn pull(&mut self) -> Result<Option<S::Item>, Error> {
        match self.source.as_mut() {
            Some(source) => source.pull(),
            None => Ok(None),
        }
    }

    pub(crate) fn release(&mut self) -> Result<(), Error> {
        match self.source.take() {
            Some(source) => {
                tracing::debug!("releasing sequence resource");
                source.close()
            }
            None => Ok(()),
        }
    }
}

impl<S: Source> Drop for Handle<S> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "failed to release abandoned sequence resource");
        }
    }
}

/// Releases `handle` after a fold step failed or finished.
///
/// The fold outcome wins: a release failure is only surfaced when the fold
/// itself succeeded, otherwise it is logged and the fold error returned.
pub(crate) fn finish<S, T>(handle: &mut Handle<S>, outcome: Result<T, Error>) -> Result<T, Error>
where
    S: Source,
{
    let released = handle.release();
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            tracing::warn!(
                error = %release_err,
                "failed to release sequence resource while propagating fold error"
            );
            Err(err)
        }
    }
}

/// `Source` over an in-memory iterator; closing is a no-op.
#[derive(Debug)]
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I: Iterator> Source for IterSource<I> {
    type Item = I::Item;

    fn pull(&mut self) -> Result<Option<Self::Item>, Error> {
        Ok(self.iter.next())
    }

    fn close(self) -> Result<(), Error> {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Ledger;
    use super::{Handle, IterSource, Source, finish};
    use crate::core::error::{Error, ErrorKind};

    #[test]
    fn release_closes_once() {
        let ledger = Ledger::default();
        let mut handle = Handle::new(ledger.open(vec![1, 2]));
        handle.release().expect("release");
        handle.release().expect("release again");
        drop(handle);
        assert_eq!(ledger.closed(), 1);
    }

    #[test]
    fn drop_closes_unreleased_handle() {
        let ledger = Ledger::default();
        let handle = Handle::new(ledger.open(vec![1]));
        drop(handle);
        assert_eq!(ledger.closed(), 1);
    }

    #[test]
    fn released_handle_pulls_nothing() {
        let ledger = Ledger::default();
        let mut handle = Handle::new(ledger.open(vec![1, 2]));
        handle.release().expect("release");
        assert_eq!(handle.pull().expect("pull"), None);
        assert_eq!(ledger.pulled(), 0);
    }

    #[test]
    fn finish_prefers_fold_error_over_close_error() {
        let ledger = Ledger::default();
        let mut source = ledger.open(vec![]);
        source.fail_close = true;
        let mut handle = Handle::new(source);
        let outcome: Result<(), Error> =
            Err(Error::new(ErrorKind::Usage).with_message("accumulator failed"));
        let err = finish(&mut handle, outcome).expect_err("fold error");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(ledger.closed(), 1);
    }

    #[test]
    fn finish_surfaces_close_error_after_success() {
        let ledger = Ledger::default();
        let mut source = ledger.open(vec![]);
        source.fail_close = true;
        let mut handle = Handle::new(source);
        let err = finish(&mut handle, Ok(5)).expect_err("close error");
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn iter_source_drains_then_reports_end() {
        let mut source = IterSource::new(vec!["a", "b"].into_iter());
        assert_eq!(source.pull().expect("pull"), Some("a"));
        assert_eq!(source.pull().expect("pull"), Some("b"));
        assert_eq!(source.pull().expect("pull"), None);
        source.close().expect("close");
    }
}
