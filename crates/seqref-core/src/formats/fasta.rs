//! FASTA and FASTQ readers. Every entry becomes a segment named by the first
//! word of its header.

use super::LineSource;
use crate::stream::RecordStream;
use crate::{Record, SeqRefError};
use std::io::BufRead;

/// First whitespace-delimited word after the header marker.
fn header_name(header: &str) -> &str {
    header.get(1..).unwrap_or("").split_whitespace().next().unwrap_or("")
}

// =============================================================================
// FASTA
// =============================================================================

/// Streaming FASTA reader.
#[derive(Debug)]
pub struct FastaReader<R> {
    lines: LineSource<R>,
    /// Header of the next entry, already consumed from the input.
    next_header: Option<String>,
    buf: String,
}

impl<R: BufRead> FastaReader<R> {
    /// Read FASTA from `reader`; `path` names the source in errors.
    pub fn new(reader: R, path: impl Into<String>) -> Self {
        Self {
            lines: LineSource::new(reader, path),
            next_header: None,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> RecordStream for FastaReader<R> {
    fn source(&self) -> &str {
        self.lines.path()
    }

    fn read_next(&mut self) -> Result<Option<Record>, SeqRefError> {
        let header = match self.next_header.take() {
            Some(header) => header,
            None => loop {
                if !self.lines.next_line(&mut self.buf)? {
                    return Ok(None);
                }
                if self.buf.trim().is_empty() {
                    continue;
                }
                if !self.buf.starts_with('>') {
                    return Err(self.lines.error("sequence data before the first '>' header"));
                }
                break std::mem::take(&mut self.buf);
            },
        };

        let name = header_name(&header);
        self.lines.check_name(name)?;

        let mut bases = Vec::new();
        while self.lines.next_line(&mut self.buf)? {
            if self.buf.starts_with('>') {
                self.next_header = Some(std::mem::take(&mut self.buf));
                break;
            }
            bases.extend(self.buf.bytes().filter(|b| !b.is_ascii_whitespace()));
        }

        Ok(Some(Record::segment(name, bases)))
    }
}

// =============================================================================
// FASTQ
// =============================================================================

/// Streaming FASTQ reader. Qualities are validated for length and dropped.
#[derive(Debug)]
pub struct FastqReader<R> {
    lines: LineSource<R>,
    buf: String,
}

impl<R: BufRead> FastqReader<R> {
    /// Read FASTQ from `reader`; `path` names the source in errors.
    pub fn new(reader: R, path: impl Into<String>) -> Self {
        Self {
            lines: LineSource::new(reader, path),
            buf: String::new(),
        }
    }

    fn required_line(&mut self, what: &str) -> Result<(), SeqRefError> {
        if self.lines.next_line(&mut self.buf)? {
            Ok(())
        } else {
            Err(self.lines.error(format!("truncated record: missing {}", what)))
        }
    }
}

impl<R: BufRead + Send> RecordStream for FastqReader<R> {
    fn source(&self) -> &str {
        self.lines.path()
    }

    fn read_next(&mut self) -> Result<Option<Record>, SeqRefError> {
        loop {
            if !self.lines.next_line(&mut self.buf)? {
                return Ok(None);
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        if !self.buf.starts_with('@') {
            return Err(self.lines.error("expected '@' header"));
        }
        let name = header_name(&self.buf).to_owned();
        self.lines.check_name(&name)?;

        self.required_line("sequence")?;
        let bases = self.buf.trim().as_bytes().to_vec();

        self.required_line("separator")?;
        if !self.buf.starts_with('+') {
            return Err(self.lines.error("expected '+' separator"));
        }

        self.required_line("qualities")?;
        if self.buf.trim().len() != bases.len() {
            return Err(self.lines.error("quality length differs from sequence length"));
        }

        Ok(Some(Record::segment(name, bases)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(stream: &mut dyn RecordStream) -> Vec<Record> {
        let mut records = Vec::new();
        while let Some(record) = stream.read_next().expect("read") {
            records.push(record);
        }
        records
    }

    #[test]
    fn fasta_multi_line_entries() {
        let text = ">chr1 description\nACGT\nacgt\n\n>chr2\nGG\n";
        let mut reader = FastaReader::new(text.as_bytes(), "mem.fa");
        let records = read_all(&mut reader);
        assert_eq!(
            records,
            vec![
                Record::segment("chr1", "ACGTacgt"),
                Record::segment("chr2", "GG"),
            ]
        );
    }

    #[test]
    fn fasta_empty_sequence_is_a_segment() {
        let mut reader = FastaReader::new(">a\n>b\nT\n".as_bytes(), "mem.fa");
        let records = read_all(&mut reader);
        assert_eq!(records[0], Record::segment("a", ""));
        assert_eq!(records[1], Record::segment("b", "T"));
    }

    #[test]
    fn fasta_rejects_data_before_header() {
        let mut reader = FastaReader::new("ACGT\n>a\n".as_bytes(), "bad.fa");
        let err = reader.read_next().expect_err("no header");
        assert!(matches!(err, SeqRefError::Read { line: 1, .. }));
    }

    #[test]
    fn fasta_rejects_empty_name() {
        let mut reader = FastaReader::new(">\nACGT\n".as_bytes(), "bad.fa");
        assert!(reader.read_next().is_err());
    }

    #[test]
    fn fastq_records() {
        let text = "@r1 extra\nACGT\n+\nIIII\n@r2\nGG\n+r2\nII\n";
        let mut reader = FastqReader::new(text.as_bytes(), "mem.fq");
        let records = read_all(&mut reader);
        assert_eq!(
            records,
            vec![Record::segment("r1", "ACGT"), Record::segment("r2", "GG")]
        );
    }

    #[test]
    fn fastq_rejects_truncated_record() {
        let mut reader = FastqReader::new("@r1\nACGT\n+\n".as_bytes(), "bad.fq");
        let err = reader.read_next().expect_err("truncated");
        assert!(err.to_string().contains("missing qualities"));
    }

    #[test]
    fn fastq_rejects_quality_length_mismatch() {
        let mut reader = FastqReader::new("@r1\nACGT\n+\nII\n".as_bytes(), "bad.fq");
        assert!(reader.read_next().is_err());
    }
}
