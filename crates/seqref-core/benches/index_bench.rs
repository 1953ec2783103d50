//! # Index Benchmarks
//!
//! Performance benchmarks for seqref-core materialization and indexing.
//!
//! Run with: `cargo bench -p seqref-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use seqref_core::{
    IterMode, KmerIndexBuilder, MemoryStream, Orientation, Record, SeqDirection, SeqRef,
    SeqRefConfig, default_allocator,
};
use std::hint::black_box;

/// Deterministic pseudo-random bases (xorshift), `len` per segment.
fn synthetic_records(segments: usize, len: usize) -> Vec<Record> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut records = Vec::with_capacity(segments * 2);
    for i in 0..segments {
        let bases: Vec<u8> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                b"ACGT"[(state & 3) as usize]
            })
            .collect();
        records.push(Record::segment(format!("s{}", i), bases));
        if i > 0 {
            records.push(Record::link(
                format!("s{}", i - 1),
                Orientation::Forward,
                format!("s{}", i),
                Orientation::Forward,
            ));
        }
    }
    records
}

fn seqref(records: Vec<Record>, direction: SeqDirection, mode: IterMode) -> SeqRef {
    let config = SeqRefConfig {
        k: 15,
        direction,
        ..SeqRefConfig::with_mode(mode)
    };
    SeqRef::from_stream(
        Box::new(MemoryStream::new("bench.gfa", records)),
        config,
        default_allocator(),
        Box::new(KmerIndexBuilder),
    )
    .expect("construct")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for segments in [10, 100, 1000].iter() {
        let records = synthetic_records(*segments, 1000);
        group.bench_with_input(
            BenchmarkId::from_parameter(segments),
            &records,
            |b, records| {
                b.iter(|| {
                    let mut seqref =
                        seqref(records.clone(), SeqDirection::ForwardOnly, IterMode::Graph);
                    let kmers = seqref
                        .index()
                        .expect("index")
                        .index()
                        .map(|index| index.kmer_count());
                    black_box(kmers)
                });
            },
        );
    }

    group.finish();
}

fn bench_both_strands(c: &mut Criterion) {
    let records = synthetic_records(100, 1000);
    c.bench_function("index_build_both_strands_100", |b| {
        b.iter(|| {
            let mut seqref = seqref(
                records.clone(),
                SeqDirection::ForwardReverse,
                IterMode::Graph,
            );
            let occurrences = seqref
                .index()
                .expect("index")
                .index()
                .map(|index| index.occurrence_count());
            black_box(occurrences)
        });
    });
}

fn bench_streaming(c: &mut Criterion) {
    let records = synthetic_records(1000, 150);
    c.bench_function("streaming_fragments_1000", |b| {
        b.iter(|| {
            let mut seqref = seqref(records.clone(), SeqDirection::ForwardOnly, IterMode::Streaming);
            let mut kmers = 0usize;
            while let Some(mut handle) = seqref.iter().expect("iter") {
                kmers += handle.by_ref().count();
                black_box(handle.release());
            }
            black_box(kmers)
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    let records = synthetic_records(100, 1000);
    let query = match &records[0] {
        Record::Segment { bases, .. } => bases[100..115].to_vec(),
        _ => Vec::new(),
    };
    let mut seqref = seqref(records, SeqDirection::ForwardOnly, IterMode::Graph);
    let handle = seqref.index().expect("index");
    let index = handle.index().expect("index target");

    c.bench_function("lookup_100_segments", |b| {
        b.iter(|| black_box(index.lookup(black_box(&query)).len()));
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_both_strands,
    bench_streaming,
    bench_lookup
);
criterion_main!(benches);
