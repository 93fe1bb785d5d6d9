// File-backed sequence of raw lines; the file is opened per fold and closed with it.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use bstr::ByteSlice;

use crate::core::accumulator::{Accumulator, YieldingAccumulator};
use crate::core::error::{Error, ErrorKind};
use crate::core::sequence::{Sequence, fold_source, yield_source};
use crate::core::source::Source;
use crate::core::yielder::Yielder;

/// One line of input with its terminator (`\n` or `\r\n`) removed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    /// 1-based line number within the file.
    pub number: u64,
    pub bytes: Vec<u8>,
}

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_str_lossy(&self) -> String {
        self.bytes.to_str_lossy().into_owned()
    }
}

/// Lines of the file at `path`.
///
/// Repeatable: each fold opens the file afresh and reads from the start.
#[derive(Clone, Debug)]
pub struct LineSequence {
    path: PathBuf,
}

pub fn lines(path: impl Into<PathBuf>) -> LineSequence {
    LineSequence { path: path.into() }
}

impl LineSequence {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<LineSource, Error> {
        let file = File::open(&self.path).map_err(|err| {
            let kind = if err.kind() == io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message("failed to open input")
                .with_path(&self.path)
                .with_source(err)
        })?;
        tracing::debug!(path = %self.path.display(), "opened line input");
        Ok(LineSource {
            reader: BufReader::new(file),
            path: self.path.clone(),
            line_no: 0,
        })
    }
}

struct LineSource {
    reader: BufReader<File>,
    path: PathBuf,
    line_no: u64,
}

impl Source for LineSource {
    type Item = Line;

    fn pull(&mut self) -> Result<Option<Line>, Error> {
        let mut bytes = Vec::new();
        let read = self.reader.read_until(b'\n', &mut bytes).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input")
                .with_path(&self.path)
                .with_line(self.line_no + 1)
                .with_source(err)
        })?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        Ok(Some(Line {
            number: self.line_no,
            bytes,
        }))
    }

    fn close(self) -> Result<(), Error> {
        tracing::debug!(path = %self.path.display(), lines = self.line_no, "closed line input");
        drop(self.reader);
        Ok(())
    }
}

impl Sequence<Line> for LineSequence {
    fn accumulate<Out, A>(&self, init: Out, accumulator: A) -> Result<Out, Error>
    where
        A: Accumulator<Out, Line>,
    {
        fold_source(self.open()?, init, accumulator)
    }

    fn to_yielder<'a, Out, A>(
        &'a self,
        init: Out,
        accumulator: A,
    ) -> Result<Yielder<'a, Out>, Error>
    where
        Out: 'a,
        A: YieldingAccumulator<Out, Line> + 'a,
    {
        yield_source(self.open()?, init, accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::lines;
    use crate::core::accumulator::Step;
    use crate::core::error::{Error, ErrorKind};
    use crate::core::sequence::Sequence;
    use std::io::Write;

    fn write_input(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(contents).expect("write");
        file.flush().expect("flush");
        file
    }

    #[test]
    fn strips_terminators_and_numbers_lines() {
        let file = write_input(b"a\tb\r\nc\n\nlast");
        let seq = lines(file.path());
        let collected = seq.to_vec().expect("lines");
        let texts: Vec<String> = collected.iter().map(|line| line.to_str_lossy()).collect();
        assert_eq!(texts, vec!["a\tb", "c", "", "last"]);
        let numbers: Vec<u64> = collected.iter().map(|line| line.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seq = lines(dir.path().join("absent.tsv"));
        let err = seq.to_vec().expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.path().is_some());
    }

    #[test]
    fn yielder_reads_incrementally() {
        let file = write_input(b"1\n2\n3\n");
        let seq = lines(file.path());
        let yielder = seq
            .to_yielder(
                0u64,
                |count: u64, _line: super::Line| -> Result<Step<u64>, Error> {
                    Ok(Step::Yield(count + 1))
                },
            )
            .expect("yielder");
        assert_eq!(*yielder.get(), 1);
        let yielder = yielder.resume().expect("resume");
        assert_eq!(*yielder.get(), 2);
        assert_eq!(yielder.into_value().expect("value"), 2);
    }

    #[test]
    fn sequence_rereads_on_each_fold() {
        let file = write_input(b"x\ny\n");
        let seq = lines(file.path());
        assert_eq!(seq.path(), file.path());
        let count = |n: usize, _line: super::Line| -> Result<usize, Error> { Ok(n + 1) };
        assert_eq!(seq.accumulate(0, count).expect("first"), 2);
        assert_eq!(seq.accumulate(0, count).expect("second"), 2);
    }
}
