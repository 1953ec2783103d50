//! # Record Streams
//!
//! The single-pass record source that drives ingestion.
//!
//! A stream yields records until exhausted and is closed by dropping it.
//! [`open_stream`] opens a file with one of the readers in
//! [`formats`](crate::formats); [`MemoryStream`] serves records already in
//! memory (embedding callers and tests).

use crate::formats::{FastaReader, FastqReader, GfaReader};
use crate::{Record, SeqDirection, SeqRefError, SourceFormat};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// STREAM TRAIT
// =============================================================================

/// A single-pass source of typed records.
pub trait RecordStream: Send {
    /// Identifier of the underlying source (usually a path).
    fn source(&self) -> &str;

    /// Read the next record. `Ok(None)` signals the end of the stream.
    fn read_next(&mut self) -> Result<Option<Record>, SeqRefError>;
}

// =============================================================================
// FILE OPENER
// =============================================================================

fn format_from_extension(path: &Path) -> Option<SourceFormat> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    let name = name.strip_suffix(".txt").unwrap_or(&name);
    let extension = name.rsplit('.').next()?;
    match extension {
        "gfa" | "gfa1" => Some(SourceFormat::Gfa),
        "fq" | "fastq" => Some(SourceFormat::Fastq),
        "fa" | "fna" | "fasta" | "fas" => Some(SourceFormat::Fasta),
        _ => None,
    }
}

fn format_from_content<R: BufRead>(reader: &mut R) -> std::io::Result<SourceFormat> {
    let buffered = reader.fill_buf()?;
    let first = buffered.iter().find(|b| !b.is_ascii_whitespace());
    Ok(match first {
        Some(b'>') => SourceFormat::Fasta,
        Some(b'@') => SourceFormat::Fastq,
        _ => SourceFormat::Gfa,
    })
}

/// Open a record stream over the file at `source`.
///
/// `SourceFormat::Auto` looks at the extension first and falls back to the
/// first non-blank byte (`>` FASTA, `@` FASTQ, anything else GFA).
///
/// Readers emit records on the forward strand only; `direction` is recorded
/// with the stream and applied later by k-mer iteration.
pub fn open_stream(
    source: &str,
    format: SourceFormat,
    direction: SeqDirection,
) -> Result<Box<dyn RecordStream>, SeqRefError> {
    let open_error = |reason: String| SeqRefError::Open {
        path: source.to_owned(),
        reason,
    };

    let path = Path::new(source);
    let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
    if file.metadata().map_err(|e| open_error(e.to_string()))?.is_dir() {
        return Err(open_error("is a directory".to_string()));
    }
    let mut reader = BufReader::new(file);

    let format = match format {
        SourceFormat::Auto => match format_from_extension(path) {
            Some(detected) => detected,
            None => format_from_content(&mut reader).map_err(|e| open_error(e.to_string()))?,
        },
        explicit => explicit,
    };
    tracing::debug!(source, ?format, ?direction, "opened record stream");

    Ok(match format {
        SourceFormat::Fastq => Box::new(FastqReader::new(reader, source)),
        SourceFormat::Gfa => Box::new(GfaReader::new(reader, source)),
        SourceFormat::Fasta | SourceFormat::Auto => Box::new(FastaReader::new(reader, source)),
    })
}

// =============================================================================
// MEMORY STREAM
// =============================================================================

/// A record stream over records held in memory.
#[derive(Debug)]
pub struct MemoryStream {
    source: String,
    records: VecDeque<Record>,
    reads: Option<Arc<AtomicUsize>>,
}

impl MemoryStream {
    /// Serve `records` in order under the identifier `source`.
    pub fn new(source: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            source: source.into(),
            records: records.into_iter().collect(),
            reads: None,
        }
    }

    /// Count every `read_next` call in `counter`.
    #[must_use]
    pub fn with_read_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.reads = Some(counter);
        self
    }

    /// Records not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl RecordStream for MemoryStream {
    fn source(&self) -> &str {
        &self.source
    }

    fn read_next(&mut self) -> Result<Option<Record>, SeqRefError> {
        if let Some(counter) = &self.reads {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(self.records.pop_front())
    }
}

// =============================================================================
// TESTS
// =============================================================================
