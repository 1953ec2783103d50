//! # Record Readers
//!
//! Line-oriented readers that turn FASTA, FASTQ and GFA text into
//! [`Record`](crate::Record)s, one at a time.
//!
//! The readers are deliberately small collaborators: they recognise the
//! record shapes the builder ingests and hand everything else through as
//! `Record::Unknown`. They never buffer more than one record.

mod fasta;
mod gfa;

pub use fasta::{FastaReader, FastqReader};
pub use gfa::GfaReader;

use crate::SeqRefError;
use crate::primitives::MAX_NAME_LENGTH;
use std::io::BufRead;

/// Line source shared by the readers: tracks line numbers and strips
/// trailing `\r\n`.
#[derive(Debug)]
pub(crate) struct LineSource<R> {
    reader: R,
    path: String,
    line: u64,
}

impl<R: BufRead> LineSource<R> {
    pub(crate) fn new(reader: R, path: impl Into<String>) -> Self {
        Self {
            reader,
            path: path.into(),
            line: 0,
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    /// Read the next line into `buf`. Returns `false` at end of input.
    pub(crate) fn next_line(&mut self, buf: &mut String) -> Result<bool, SeqRefError> {
        buf.clear();
        let read = self
            .reader
            .read_line(buf)
            .map_err(|e| self.error(e.to_string()))?;
        if read == 0 {
            return Ok(false);
        }
        self.line += 1;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(true)
    }

    pub(crate) fn error(&self, reason: impl Into<String>) -> SeqRefError {
        SeqRefError::Read {
            path: self.path.clone(),
            line: self.line,
            reason: reason.into(),
        }
    }

    /// Validate a record name.
    pub(crate) fn check_name(&self, name: &str) -> Result<(), SeqRefError> {
        if name.is_empty() {
            return Err(self.error("empty record name"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(self.error(format!(
                "record name longer than {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }
}
