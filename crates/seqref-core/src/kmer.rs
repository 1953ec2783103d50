//! # K-mer Iteration
//!
//! 2-bit k-mer encoding and the iterator that walks every k-mer of an
//! archive. Bases are packed `A=0, C=1, G=2, T=3`; any other base (after
//! normalization, only `N`) breaks the window.
//!
//! Iteration is driven by a [`KmerCursor`], a plain resumable position. The
//! borrowing [`KmerIter`] wraps a cursor together with the archive; handles
//! keep a bare cursor so they can own the archive they walk.

use crate::pool::Archive;
use crate::{Orientation, SegmentId};
use serde::Serialize;

// =============================================================================
// ENCODING
// =============================================================================

/// 2-bit code of a base, or `None` for anything outside `ACGT`.
#[inline]
#[must_use]
pub const fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

const fn mask(k: u8) -> u64 {
    if k >= 32 { u64::MAX } else { (1u64 << (2 * k as u32)) - 1 }
}

/// Pack a k-mer of at most 32 bases. Returns `None` if any base is not `ACGT`.
#[must_use]
pub fn encode_kmer(kmer: &[u8]) -> Option<u64> {
    if kmer.is_empty() || kmer.len() > 32 {
        return None;
    }
    kmer.iter()
        .try_fold(0u64, |code, &base| Some((code << 2) | encode_base(base)?))
}

/// Unpack a `k`-base code into upper-case letters.
#[must_use]
pub fn decode_kmer(code: u64, k: u8) -> String {
    (0..k)
        .rev()
        .map(|i| match (code >> (2 * u32::from(i))) & 3 {
            0 => 'A',
            1 => 'C',
            2 => 'G',
            _ => 'T',
        })
        .collect()
}

/// Reverse complement of a `k`-base code.
#[must_use]
pub fn reverse_complement(code: u64, k: u8) -> u64 {
    let mut forward = code;
    let mut reverse = 0u64;
    for _ in 0..k {
        reverse = (reverse << 2) | (3 - (forward & 3));
        forward >>= 2;
    }
    reverse & mask(k)
}

// =============================================================================
// HITS
// =============================================================================

/// One k-mer occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KmerHit {
    /// Packed k-mer.
    pub kmer: u64,
    /// Segment the k-mer was read from.
    pub segment: SegmentId,
    /// Offset of the k-mer's first base on the forward strand.
    pub pos: u32,
    /// Strand the k-mer was read on.
    pub strand: Orientation,
}

// =============================================================================
// CURSOR
// =============================================================================

/// Resumable k-mer position inside an archive.
#[derive(Debug, Clone, Default)]
pub struct KmerCursor {
    segment: u32,
    /// Segment index at which iteration stops, if limited.
    end: Option<u32>,
    offset: usize,
    filled: u8,
    forward: u64,
    reverse: u64,
    pending: Option<KmerHit>,
}

impl KmerCursor {
    /// A cursor positioned before the first k-mer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor that walks only the k-mers of `segment`.
    #[must_use]
    pub fn single(segment: SegmentId) -> Self {
        Self {
            segment: segment.0,
            end: Some(segment.0.saturating_add(1)),
            ..Self::default()
        }
    }

    fn reset_window(&mut self) {
        self.filled = 0;
        self.forward = 0;
        self.reverse = 0;
    }

    /// Advance over `archive` and return the next hit.
    ///
    /// The cursor must always be used with the same archive.
    pub fn advance(&mut self, archive: &Archive) -> Option<KmerHit> {
        let params = archive.params();
        let k = params.k;
        let both = params.direction.includes_reverse();
        let top_shift = 2 * u32::from(k.saturating_sub(1));

        loop {
            if let Some(hit) = self.pending.take() {
                return Some(hit);
            }

            if self.end.is_some_and(|end| self.segment >= end) {
                return None;
            }
            let segment = archive.segment(SegmentId(self.segment))?;
            let Some(&base) = segment.bases.get(self.offset) else {
                self.segment = self.segment.checked_add(1)?;
                self.offset = 0;
                self.reset_window();
                continue;
            };
            self.offset += 1;

            let Some(code) = encode_base(base) else {
                self.reset_window();
                continue;
            };

            self.forward = ((self.forward << 2) | code) & mask(k);
            self.reverse = (self.reverse >> 2) | ((3 - code) << top_shift);
            self.filled = self.filled.saturating_add(1).min(k);
            if self.filled < k {
                continue;
            }

            let pos = u32::try_from(self.offset - usize::from(k)).unwrap_or(u32::MAX);
            if both {
                self.pending = Some(KmerHit {
                    kmer: self.reverse,
                    segment: segment.id,
                    pos,
                    strand: Orientation::Reverse,
                });
            }
            return Some(KmerHit {
                kmer: self.forward,
                segment: segment.id,
                pos,
                strand: Orientation::Forward,
            });
        }
    }
}

/// Iterator over every k-mer of an archive.
#[derive(Debug, Clone)]
pub struct KmerIter<'a> {
    archive: &'a Archive,
    cursor: KmerCursor,
}

impl<'a> KmerIter<'a> {
    /// Start iterating `archive` from its first k-mer.
    #[must_use]
    pub fn new(archive: &'a Archive) -> Self {
        Self {
            archive,
            cursor: KmerCursor::new(),
        }
    }
}

impl Iterator for KmerIter<'_> {
    type Item = KmerHit;

    fn next(&mut self) -> Option<KmerHit> {
        self.cursor.advance(self.archive)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeqDirection;
    use crate::arena::{Arena, default_allocator};
    use crate::pool::{GraphParams, Pool};

    fn archive(k: u8, direction: SeqDirection, segments: &[(&str, &str)]) -> Archive {
        let mut pool = Pool::new(
            GraphParams { k, direction },
            Arena::growable(default_allocator()),
        );
        for (name, bases) in segments {
            pool.append_segment(name, bases.as_bytes()).expect("append");
        }
        pool.freeze()
    }

    #[test]
    fn encode_decode() {
        let code = encode_kmer(b"ACGT").expect("encode");
        assert_eq!(code, 0b00_01_10_11);
        assert_eq!(decode_kmer(code, 4), "ACGT");
        assert_eq!(encode_kmer(b"ACNT"), None);
        assert_eq!(encode_kmer(b""), None);
    }

    #[test]
    fn reverse_complement_of_known_kmer() {
        let code = encode_kmer(b"AACG").expect("encode");
        let rc = reverse_complement(code, 4);
        assert_eq!(decode_kmer(rc, 4), "CGTT");
        assert_eq!(reverse_complement(rc, 4), code);
    }

    #[test]
    fn full_width_kmer_round_trips() {
        let bases = b"ACGTACGTACGTACGTACGTACGTACGTACGT";
        let code = encode_kmer(bases).expect("encode");
        assert_eq!(decode_kmer(code, 32).as_bytes(), bases);
    }

    #[test]
    fn forward_kmers_in_order() {
        let archive = archive(3, SeqDirection::ForwardOnly, &[("A", "ACGTA")]);
        let kmers: Vec<String> = archive.kmers().map(|h| decode_kmer(h.kmer, 3)).collect();
        assert_eq!(kmers, vec!["ACG", "CGT", "GTA"]);

        let positions: Vec<u32> = archive.kmers().map(|h| h.pos).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn n_breaks_the_window() {
        let archive = archive(3, SeqDirection::ForwardOnly, &[("A", "ACGNTTAC")]);
        let kmers: Vec<String> = archive.kmers().map(|h| decode_kmer(h.kmer, 3)).collect();
        assert_eq!(kmers, vec!["ACG", "TTA", "TAC"]);
    }

    #[test]
    fn windows_do_not_span_segments() {
        let archive = archive(3, SeqDirection::ForwardOnly, &[("A", "AC"), ("B", "GTA")]);
        let hits: Vec<KmerHit> = archive.kmers().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].segment, SegmentId(1));
        assert_eq!(decode_kmer(hits[0].kmer, 3), "GTA");
    }

    #[test]
    fn both_strands_interleave_reverse_complements() {
        let archive = archive(2, SeqDirection::ForwardReverse, &[("A", "AAC")]);
        let hits: Vec<(String, Orientation)> = archive
            .kmers()
            .map(|h| (decode_kmer(h.kmer, 2), h.strand))
            .collect();
        assert_eq!(
            hits,
            vec![
                ("AA".to_string(), Orientation::Forward),
                ("TT".to_string(), Orientation::Reverse),
                ("AC".to_string(), Orientation::Forward),
                ("GT".to_string(), Orientation::Reverse),
            ]
        );
    }

    #[test]
    fn single_segment_cursor_stops_at_its_segment() {
        let archive = archive(2, SeqDirection::ForwardOnly, &[("A", "ACG"), ("B", "TTT")]);
        let mut cursor = KmerCursor::single(SegmentId(0));
        let mut hits = Vec::new();
        while let Some(hit) = cursor.advance(&archive) {
            hits.push(hit);
        }
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.segment == SegmentId(0)));
    }

    #[test]
    fn short_segments_yield_nothing() {
        let archive = archive(5, SeqDirection::ForwardOnly, &[("A", "ACG")]);
        assert_eq!(archive.kmers().count(), 0);
    }
}
