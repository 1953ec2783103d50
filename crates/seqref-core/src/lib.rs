//! # seqref-core
//!
//! The lazy sequence-graph reference builder for seqref - THE LOGIC.
//!
//! A [`SeqRef`] wraps a single-pass stream of sequence records (FASTA, FASTQ
//! or GFA) and derives graph objects from it only when they are asked for:
//!
//! - **Graph mode**: the stream is drained once into a frozen [`Archive`];
//!   the [`KmerIndex`] is built from that archive and consumes it.
//! - **Streaming mode**: every ingestible record becomes a self-contained
//!   fragment backed by its own bounded [`Arena`].
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network dependencies
//! - Every derivation happens inside the call that first needs it
//! - The record stream is read at most once
//! - Memory comes from an explicit [`Allocator`] capability supplied at
//!   construction; nothing is read from global state

// =============================================================================
// MODULES
// =============================================================================

pub mod arena;
pub mod config;
pub mod formats;
pub mod handle;
pub mod index;
pub mod kmer;
pub mod pool;
pub mod primitives;
pub mod reference;
pub mod stream;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Orientation, Record, SegmentId, SeqDirection, SeqRefError, SourceFormat};

// =============================================================================
// RE-EXPORTS: Memory
// =============================================================================

pub use arena::{
    Allocator, Arena, ArenaError, BudgetAllocator, Span, SystemAllocator, default_allocator,
};

// =============================================================================
// RE-EXPORTS: Graph Objects
// =============================================================================

pub use handle::{GraphHandle, HandleTarget};
pub use index::{IndexBuilder, KmerIndex, KmerIndexBuilder};
pub use kmer::{KmerCursor, KmerHit, KmerIter, decode_kmer, encode_kmer, reverse_complement};
pub use pool::{Append, Archive, GraphParams, LinkView, Pool, SegmentView};

// =============================================================================
// RE-EXPORTS: Builder
// =============================================================================

pub use config::{IterMode, SeqRefConfig};
pub use reference::{MaterializationState, SeqRef, teardown};
pub use stream::{MemoryStream, RecordStream, open_stream};
