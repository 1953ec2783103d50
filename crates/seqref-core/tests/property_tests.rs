//! # Property-Based Tests
//!
//! Invariants of k-mer extraction, indexing and streaming checked with
//! proptest over random segment sets.

use proptest::collection::vec;
use proptest::prelude::*;
use seqref_core::{
    IterMode, KmerIndexBuilder, MemoryStream, Record, SeqDirection, SeqRef, SeqRefConfig,
    decode_kmer, default_allocator, encode_kmer, reverse_complement,
};

// =============================================================================
// STRATEGIES
// =============================================================================

fn bases() -> impl Strategy<Value = Vec<u8>> {
    vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')], 0..64)
}

fn segments() -> impl Strategy<Value = Vec<Record>> {
    vec(bases(), 1..12).prop_map(|seqs| {
        seqs.into_iter()
            .enumerate()
            .map(|(i, bases)| Record::segment(format!("s{}", i), bases))
            .collect()
    })
}

fn open(records: Vec<Record>, k: u8, direction: SeqDirection, mode: IterMode) -> SeqRef {
    let config = SeqRefConfig {
        k,
        direction,
        ..SeqRefConfig::with_mode(mode)
    };
    SeqRef::from_stream(
        Box::new(MemoryStream::new("prop.fa", records)),
        config,
        default_allocator(),
        Box::new(KmerIndexBuilder),
    )
    .expect("construct")
}

fn expected_forward_kmers(records: &[Record], k: u8) -> usize {
    records
        .iter()
        .map(|record| match record {
            Record::Segment { bases, .. } => (bases.len() + 1).saturating_sub(usize::from(k)),
            _ => 0,
        })
        .sum()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Graph iteration and the index agree on the number of occurrences.
    #[test]
    fn index_counts_every_iterated_kmer(records in segments(), k in 1u8..8) {
        let expected = expected_forward_kmers(&records, k);
        let mut seqref = open(records, k, SeqDirection::ForwardOnly, IterMode::Graph);

        let iterated = seqref.iter().expect("iter").expect("handle").count();
        prop_assert_eq!(iterated, expected);

        let handle = seqref.index().expect("index");
        prop_assert_eq!(handle.index().expect("target").occurrence_count(), expected);
    }

    /// Both strands double the occurrences.
    #[test]
    fn both_strands_double_occurrences(records in segments(), k in 1u8..8) {
        let expected = expected_forward_kmers(&records, k);
        let mut seqref = open(records, k, SeqDirection::ForwardReverse, IterMode::Graph);
        let handle = seqref.index().expect("index");
        prop_assert_eq!(handle.index().expect("target").occurrence_count(), expected * 2);
    }

    /// Every hit found by lookup points at the k-mer it was filed under.
    #[test]
    fn lookup_hits_match_their_segment(records in segments(), k in 1u8..6) {
        let mut seqref = open(records, k, SeqDirection::ForwardOnly, IterMode::Graph);
        let handle = seqref.index().expect("index");
        let index = handle.index().expect("target");

        for (code, hits) in index.kmers() {
            let text = decode_kmer(code, k);
            prop_assert_eq!(index.lookup(text.as_bytes()), hits);
            for hit in hits {
                let segment = index.archive().segment(hit.segment).expect("segment");
                let start = hit.pos as usize;
                let window = &segment.bases[start..start + usize::from(k)];
                prop_assert_eq!(encode_kmer(window), Some(code));
            }
        }
    }

    /// Streaming yields exactly one fragment per record.
    #[test]
    fn streaming_yields_one_fragment_per_record(records in segments()) {
        let count = records.len();
        let mut seqref = open(records, 4, SeqDirection::ForwardOnly, IterMode::Streaming);

        let mut fragments = 0usize;
        while let Some(handle) = seqref.iter().expect("iter") {
            prop_assert_eq!(handle.archive().segment_count(), 1);
            prop_assert!(handle.release().is_none());
            fragments += 1;
        }
        prop_assert_eq!(fragments, count);
    }

    /// Reverse complement is an involution.
    #[test]
    fn reverse_complement_is_an_involution(kmer in vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')], 1..=32)) {
        let k = u8::try_from(kmer.len()).expect("k fits in u8");
        let code = encode_kmer(&kmer).expect("unambiguous");
        prop_assert_eq!(reverse_complement(reverse_complement(code, k), k), code);
    }
}
