//! # Core Type Definitions
//!
//! This module contains the vocabulary shared by every other module:
//! - Orientation and directionality (`Orientation`, `SeqDirection`)
//! - Source format tags (`SourceFormat`)
//! - Graph identifiers (`SegmentId`)
//! - Stream records (`Record`)
//! - Error types (`SeqRefError`)

use crate::arena::ArenaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ORIENTATION & DIRECTIONALITY
// =============================================================================

/// Orientation of a segment end, written `+` / `-` in link records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// The segment as written (`+`).
    Forward,
    /// The reverse complement of the segment (`-`).
    Reverse,
}

impl Orientation {
    /// Parse a `+` / `-` orientation field.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Forward),
            "-" => Some(Self::Reverse),
            _ => None,
        }
    }

    /// The opposite orientation.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// The `+` / `-` symbol for this orientation.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Which strands are materialized when sequences are k-mer iterated or indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqDirection {
    /// Forward strand only.
    #[default]
    ForwardOnly,
    /// Forward strand and reverse complement.
    ForwardReverse,
}

impl SeqDirection {
    /// Whether reverse-complement k-mers are produced.
    #[must_use]
    pub const fn includes_reverse(self) -> bool {
        matches!(self, Self::ForwardReverse)
    }
}

/// Source format tag handed to the record stream opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Detect from the file extension, then from the first byte.
    #[default]
    Auto,
    /// FASTA (`>name ...` followed by sequence lines).
    Fasta,
    /// FASTQ (four-line records).
    Fastq,
    /// GFA 1 (`S` / `L` lines).
    Gfa,
}

impl SourceFormat {
    /// Parse a format name as accepted on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "fasta" | "fa" | "fna" => Some(Self::Fasta),
            "fastq" | "fq" => Some(Self::Fastq),
            "gfa" => Some(Self::Gfa),
            _ => None,
        }
    }
}

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Dense identifier of a segment inside one archive, assigned in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl SegmentId {
    /// The identifier as a vector index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A typed record yielded by a record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A named contiguous sequence of bases.
    Segment {
        /// Segment name.
        name: String,
        /// Raw bases as read from the source.
        bases: Vec<u8>,
    },
    /// An oriented connection from the end of one segment to another.
    Link {
        /// Source segment name.
        from: String,
        /// Orientation of the source segment.
        from_orientation: Orientation,
        /// Target segment name.
        to: String,
        /// Orientation of the target segment.
        to_orientation: Orientation,
        /// Overlap/alignment description, if the link carries one.
        overlap: Option<String>,
    },
    /// A record kind the builder does not understand.
    Unknown {
        /// The record tag as found in the source.
        tag: String,
    },
}

impl Record {
    /// Convenience constructor for a segment record.
    #[must_use]
    pub fn segment(name: impl Into<String>, bases: impl Into<Vec<u8>>) -> Self {
        Self::Segment {
            name: name.into(),
            bases: bases.into(),
        }
    }

    /// Convenience constructor for an overlap-free link record.
    #[must_use]
    pub fn link(
        from: impl Into<String>,
        from_orientation: Orientation,
        to: impl Into<String>,
        to_orientation: Orientation,
    ) -> Self {
        Self::Link {
            from: from.into(),
            from_orientation,
            to: to.into(),
            to_orientation,
            overlap: None,
        }
    }

    /// Whether the builder can append this record.
    ///
    /// Links carrying overlap information and unknown records are not ingestible.
    #[must_use]
    pub fn is_ingestible(&self) -> bool {
        match self {
            Self::Segment { .. } => true,
            Self::Link { overlap, .. } => overlap.is_none(),
            Self::Unknown { .. } => false,
        }
    }

    /// Number of payload bytes the record needs in an arena.
    #[must_use]
    pub fn payload_bytes(&self) -> usize {
        match self {
            Self::Segment { name, bases } => name.len().saturating_add(bases.len()),
            Self::Link { from, to, .. } => from.len().saturating_add(to.len()),
            Self::Unknown { .. } => 0,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by seqref operations.
///
/// Soft truncation on an overlapping link and the end of a record stream are
/// not errors; they are reported through logging and `Ok(None)` respectively.
#[derive(Debug, Error)]
pub enum SeqRefError {
    /// The source identifier was empty.
    #[error("Empty source identifier")]
    EmptySource,

    /// The configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The record stream could not be opened.
    #[error("Cannot open '{path}': {reason}")]
    Open {
        /// The source identifier that failed to open.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// The record stream failed while reading.
    #[error("Read error in '{path}' at line {line}: {reason}")]
    Read {
        /// The source being read.
        path: String,
        /// 1-based line number where the failure was detected.
        line: u64,
        /// What went wrong.
        reason: String,
    },

    /// An arena or its allocator refused an allocation.
    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    /// A pool ran out of segment identifiers.
    #[error("Too many segments: identifiers are limited to u32")]
    TooManySegments,

    /// The index builder could not derive an index from the archive.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// The instance lost its archive after an earlier failure.
    #[error("No archive or index available")]
    Unavailable,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_symbols_round_trip() {
        assert_eq!(Orientation::from_symbol("+"), Some(Orientation::Forward));
        assert_eq!(Orientation::from_symbol("-"), Some(Orientation::Reverse));
        assert_eq!(Orientation::from_symbol("*"), None);
        assert_eq!(Orientation::Reverse.symbol(), '-');
        assert_eq!(Orientation::Forward.flip(), Orientation::Reverse);
    }

    #[test]
    fn overlapping_link_is_not_ingestible() {
        let plain = Record::link("A", Orientation::Forward, "B", Orientation::Forward);
        assert!(plain.is_ingestible());

        let overlapping = Record::Link {
            from: "A".into(),
            from_orientation: Orientation::Forward,
            to: "B".into(),
            to_orientation: Orientation::Forward,
            overlap: Some("4M".into()),
        };
        assert!(!overlapping.is_ingestible());
        assert!(!Record::Unknown { tag: "P".into() }.is_ingestible());
    }

    #[test]
    fn payload_bytes_counts_names_and_bases() {
        assert_eq!(Record::segment("seq1", "ACGT").payload_bytes(), 8);
        let link = Record::link("A", Orientation::Forward, "BB", Orientation::Reverse);
        assert_eq!(link.payload_bytes(), 3);
    }

    #[test]
    fn format_names() {
        assert_eq!(SourceFormat::from_name("GFA"), Some(SourceFormat::Gfa));
        assert_eq!(SourceFormat::from_name("fq"), Some(SourceFormat::Fastq));
        assert_eq!(SourceFormat::from_name("bam"), None);
    }
}
