//! Line-oriented I/O for the legacy package file formats.
//!
//! Contains the symmetric fixed-width / free-format field codec, the inline
//! array-block reader and writer, and the [`traits::PackageFile`] interface
//! implemented by every package adapter.

pub mod arrays;
pub mod codec;
pub mod traits;

use crate::error::PackageError;
use std::io::BufRead;

/// Buffered line source that tracks the current 1-based line number for
/// error reporting.
pub struct LineReader<R> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader { inner, line_no: 0 }
    }

    /// Number of the most recently returned line (0 before the first read).
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Reads the next line, stripping the trailing newline. Returns `None`
    /// at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>, std::io::Error> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Reads the next line, failing when the stream ends early.
    pub fn expect_line(&mut self, context: &str) -> Result<String, PackageError> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(PackageError::parse(
                self.line_no + 1,
                format!("unexpected end of file while reading {context}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn line_reader_tracks_line_numbers_and_strips_newlines() {
        let mut reader = LineReader::new(Cursor::new("first\r\nsecond\n"));
        assert_eq!(reader.next_line().unwrap(), Some("first".to_string()));
        assert_eq!(reader.line_no(), 1);
        assert_eq!(reader.next_line().unwrap(), Some("second".to_string()));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.line_no(), 2);
    }

    #[test]
    fn expect_line_reports_context_at_eof() {
        let mut reader = LineReader::new(Cursor::new(""));
        let err = reader.expect_line("the GHB header").unwrap_err();
        assert!(err.to_string().contains("the GHB header"));
    }
}
