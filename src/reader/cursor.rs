//! Single-pass cursor over a [`Reader`] with one line of lookahead.

use std::io::BufRead;
use std::path::Path;

use super::stream::{LogicalLine, Reader};
use crate::error::Result;

pub struct LineCursor<R: BufRead> {
    reader: Reader<R>,
    peeked: Option<LogicalLine>,
}

impl<R: BufRead> LineCursor<R> {
    #[must_use]
    pub fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            peeked: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Look at the next logical line without consuming it.
    pub fn peek(&mut self) -> Result<Option<&LogicalLine>> {
        if self.peeked.is_none() {
            self.peeked = self.reader.next_logical_line()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume and return the next logical line.
    pub fn advance(&mut self) -> Result<Option<LogicalLine>> {
        match self.peeked.take() {
            Some(line) => Ok(Some(line)),
            None => self.reader.next_logical_line(),
        }
    }

    pub fn at_end(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Last physical line the underlying reader has consumed
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.reader.line_number()
    }
}
