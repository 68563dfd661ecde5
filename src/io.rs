//! Line sources and sinks
//!
//! Input is consumed one line at a time through [`LineSource`]; files are memory-mapped,
//! standard input goes through a buffered reader. Output goes through [`LineSink`], which
//! every `std::io::Write` implementation already satisfies.

use crate::error::{SortContext, SortError, SortResult};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

/// A stream of text lines without their `\n` terminators
pub trait LineSource {
    /// Whether another line can be read
    fn has_more(&mut self) -> SortResult<bool>;

    /// Read the next line. Calling this when `has_more` is false is an error.
    fn next_line(&mut self) -> SortResult<String>;
}

/// Destination for rendered text; nothing is appended implicitly
pub trait LineSink {
    fn write(&mut self, text: &str) -> SortResult<()>;

    fn flush(&mut self) -> SortResult<()>;
}

impl<W: Write> LineSink for W {
    fn write(&mut self, text: &str) -> SortResult<()> {
        self.write_all(text.as_bytes())
            .with_context(|| "writing output".to_string())
    }

    fn flush(&mut self) -> SortResult<()> {
        Write::flush(self).with_context(|| "flushing output".to_string())
    }
}

fn end_of_input() -> SortError {
    SortError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "no more input lines",
    ))
}

/// Line source over any buffered reader (standard input, in-memory buffers)
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn has_more(&mut self) -> SortResult<bool> {
        Ok(!self.reader.fill_buf()?.is_empty())
    }

    fn next_line(&mut self) -> SortResult<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(end_of_input());
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(line)
    }
}

/// Line source over a memory-mapped file
pub struct MappedSource {
    /// `None` for empty files, which cannot be mapped on every platform
    mmap: Option<Mmap>,
    position: usize,
}

impl MappedSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(io::Error::new(io::ErrorKind::Other, "Is a directory"));
        }

        let mmap = if metadata.len() == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and lives as long as this source. The table is
            // fully built, and the source dropped, before any output file is opened.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self { mmap, position: 0 })
    }

    fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

impl LineSource for MappedSource {
    fn has_more(&mut self) -> SortResult<bool> {
        Ok(self.position < self.data().len())
    }

    fn next_line(&mut self) -> SortResult<String> {
        let rest = &self.data()[self.position..];
        if rest.is_empty() {
            return Err(end_of_input());
        }

        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            // Last line without a terminator
            None => (rest, rest.len()),
        };
        let line = String::from_utf8(line.to_vec())?;
        self.position += consumed;
        Ok(line)
    }
}

/// `None` and `-` both name the standard stream
pub(crate) fn is_standard_stream(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

/// Open the input named by `path`, or standard input when it is `None` or `-`
pub fn open_source(path: Option<&Path>) -> SortResult<Box<dyn LineSource>> {
    match path {
        Some(path) if !is_standard_stream(Some(path)) => {
            let source = MappedSource::open(path).with_file_context(&path.display().to_string())?;
            Ok(Box::new(source))
        }
        _ => Ok(Box::new(ReaderSource::new(io::stdin().lock()))),
    }
}

/// Open the output named by `path`, or standard output when it is `None` or `-`
pub fn open_sink(path: Option<&Path>) -> SortResult<Box<dyn LineSink>> {
    match path {
        Some(path) if !is_standard_stream(Some(path)) => {
            let file = File::create(path).with_file_context(&path.display().to_string())?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
