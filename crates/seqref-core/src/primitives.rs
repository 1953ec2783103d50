//! # Primitives
//!
//! Hardcoded runtime constants for seqref-core.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Default k-mer length used when the configuration does not set one.
pub const DEFAULT_KMER_LENGTH: u8 = 14;

/// Largest k-mer length that still packs into a `u64` at 2 bits per base.
pub const MAX_KMER_LENGTH: u8 = 32;

/// Minimum capacity of the bounded arena backing one streaming-mode record.
///
/// Records whose payload exceeds this get an arena sized to the payload.
pub const SINGLE_RECORD_ARENA_BYTES: usize = 4096;

/// Reservation step of a growable arena.
///
/// Growable arenas back whole-graph archives and ask their allocator for
/// memory in chunks of at least this many bytes.
pub const ARENA_GROWTH_CHUNK: usize = 64 * 1024;

/// Maximum length of a segment name, in bytes.
///
/// Longer names are rejected by the record readers.
pub const MAX_NAME_LENGTH: usize = 4096;
