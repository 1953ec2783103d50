//! # K-mer Index
//!
//! A queryable k-mer table derived from a frozen archive.
//!
//! Building an index consumes the archive: [`IndexBuilder::build`] takes it by
//! value and, on success, the archive lives on inside the returned
//! [`KmerIndex`]. On failure the archive is gone. There is never a second
//! live owner of the same archive.

use crate::kmer::{KmerCursor, KmerHit, encode_kmer};
use crate::pool::Archive;
use crate::{SegmentId, SeqRefError};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// BUILDER TRAIT
// =============================================================================

/// Derives a [`KmerIndex`] from an archive.
///
/// The archive is moved in; it must not be used afterwards whatever the
/// outcome.
pub trait IndexBuilder: Send + Sync + fmt::Debug {
    /// Build an index. `num_threads` is a hint; `0` lets the builder decide.
    fn build(&self, archive: Archive, num_threads: u16) -> Result<KmerIndex, SeqRefError>;
}

/// The default builder: extracts k-mers per segment on a rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmerIndexBuilder;

impl IndexBuilder for KmerIndexBuilder {
    fn build(&self, archive: Archive, num_threads: u16) -> Result<KmerIndex, SeqRefError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(usize::from(num_threads))
            .thread_name(|i| format!("seqref-index-{}", i))
            .build()
            .map_err(|e| SeqRefError::IndexBuild(e.to_string()))?;

        let segment_count = u32::try_from(archive.segment_count())
            .map_err(|_| SeqRefError::TooManySegments)?;

        let per_segment: Vec<Vec<KmerHit>> = pool.install(|| {
            (0..segment_count)
                .into_par_iter()
                .map(|id| {
                    let mut cursor = KmerCursor::single(SegmentId(id));
                    std::iter::from_fn(|| cursor.advance(&archive)).collect()
                })
                .collect()
        });

        Ok(KmerIndex::from_hits(archive, per_segment.into_iter().flatten()))
    }
}

// =============================================================================
// INDEX
// =============================================================================

/// k-mer → occurrences table, owning the archive it was built from.
pub struct KmerIndex {
    archive: Archive,
    table: BTreeMap<u64, Vec<KmerHit>>,
    occurrences: usize,
}

impl KmerIndex {
    /// Assemble an index from `archive` and the hits extracted from it.
    ///
    /// Hits for the same k-mer keep the order in which they are supplied.
    #[must_use]
    pub fn from_hits(archive: Archive, hits: impl IntoIterator<Item = KmerHit>) -> Self {
        let mut table: BTreeMap<u64, Vec<KmerHit>> = BTreeMap::new();
        let mut occurrences = 0usize;
        for hit in hits {
            table.entry(hit.kmer).or_default().push(hit);
            occurrences += 1;
        }
        Self {
            archive,
            table,
            occurrences,
        }
    }

    /// Occurrences of a k-mer given as bases.
    ///
    /// Returns an empty slice if the query is not exactly `k` bases of `ACGT`.
    #[must_use]
    pub fn lookup(&self, kmer: &[u8]) -> &[KmerHit] {
        if kmer.len() != usize::from(self.k()) {
            return &[];
        }
        encode_kmer(kmer).map_or(&[], |code| self.lookup_code(code))
    }

    /// Occurrences of a packed k-mer.
    #[must_use]
    pub fn lookup_code(&self, code: u64) -> &[KmerHit] {
        self.table.get(&code).map_or(&[], Vec::as_slice)
    }

    /// Distinct k-mers in the index, in packed order.
    pub fn kmers(&self) -> impl Iterator<Item = (u64, &[KmerHit])> + '_ {
        self.table.iter().map(|(code, hits)| (*code, hits.as_slice()))
    }

    /// Number of distinct k-mers.
    #[must_use]
    pub fn kmer_count(&self) -> usize {
        self.table.len()
    }

    /// Total number of indexed occurrences.
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.occurrences
    }

    /// k-mer length.
    #[must_use]
    pub fn k(&self) -> u8 {
        self.archive.params().k
    }

    /// The archive this index was built from.
    #[must_use]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }
}

impl fmt::Debug for KmerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmerIndex")
            .field("k", &self.k())
            .field("kmers", &self.table.len())
            .field("occurrences", &self.occurrences)
            .field("segments", &self.archive.segment_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Arena, default_allocator};
    use crate::kmer::decode_kmer;
    use crate::pool::{GraphParams, Pool};
    use crate::{Orientation, SeqDirection};

    fn archive(k: u8, direction: SeqDirection) -> Archive {
        let mut pool = Pool::new(
            GraphParams { k, direction },
            Arena::growable(default_allocator()),
        );
        pool.append_segment("A", b"ACGT").expect("A");
        pool.append_segment("B", b"GGTT").expect("B");
        pool.append_segment("C", b"TACGT").expect("C");
        pool.freeze()
    }

    #[test]
    fn index_matches_archive_iteration() {
        let archive = archive(3, SeqDirection::ForwardOnly);
        let expected = archive.kmers().count();

        let index = KmerIndexBuilder.build(archive, 2).expect("build");
        assert_eq!(index.occurrence_count(), expected);
        assert_eq!(index.archive().segment_count(), 3);
    }

    #[test]
    fn lookup_returns_every_occurrence_in_segment_order() {
        let index = KmerIndexBuilder
            .build(archive(3, SeqDirection::ForwardOnly), 1)
            .expect("build");

        let hits = index.lookup(b"CGT");
        let places: Vec<(SegmentId, u32)> = hits.iter().map(|h| (h.segment, h.pos)).collect();
        assert_eq!(places, vec![(SegmentId(0), 1), (SegmentId(2), 2)]);
    }

    #[test]
    fn lookup_rejects_wrong_length_and_ambiguous_bases() {
        let index = KmerIndexBuilder
            .build(archive(3, SeqDirection::ForwardOnly), 0)
            .expect("build");
        assert!(index.lookup(b"AC").is_empty());
        assert!(index.lookup(b"ACN").is_empty());
        assert!(index.lookup(b"AAA").is_empty());
    }

    #[test]
    fn both_strands_are_indexed() {
        let index = KmerIndexBuilder
            .build(archive(3, SeqDirection::ForwardReverse), 0)
            .expect("build");

        // GGT occurs forward in B; its reverse complement ACC only reverse.
        let rc_hits = index.lookup(b"ACC");
        assert_eq!(rc_hits.len(), 1);
        assert_eq!(rc_hits[0].strand, Orientation::Reverse);
        assert_eq!(rc_hits[0].segment, SegmentId(1));
    }

    #[test]
    fn kmers_are_listed_in_packed_order() {
        let index = KmerIndexBuilder
            .build(archive(3, SeqDirection::ForwardOnly), 0)
            .expect("build");
        let listed: Vec<String> = index.kmers().map(|(code, _)| decode_kmer(code, 3)).collect();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
        assert_eq!(index.kmer_count(), listed.len());
    }

    #[test]
    fn empty_archive_builds_empty_index() {
        let pool = Pool::new(
            GraphParams {
                k: 5,
                direction: SeqDirection::ForwardOnly,
            },
            Arena::growable(default_allocator()),
        );
        let index = KmerIndexBuilder.build(pool.freeze(), 0).expect("build");
        assert_eq!(index.kmer_count(), 0);
        assert_eq!(index.occurrence_count(), 0);
    }
}
