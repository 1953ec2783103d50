//! # Sequence Reference Builder
//!
//! [`SeqRef`] is the lazily materialized reference over one record stream.
//!
//! Nothing is derived at construction. The first call that needs a graph
//! object drains the stream into a frozen [`Archive`]; building the index
//! then consumes that archive, which lives on inside the [`KmerIndex`].
//! Each forward transition moves the previous object, so an instance holds
//! at most one primary object at any time.
//!
//! ```text
//! Empty ──drain──▶ Archived ──build──▶ Indexed
//!   │                  │
//!   └──error──▶ Failed ◀──error──┘
//! ```
//!
//! In streaming mode, iterator retrieval bypasses the state machine entirely
//! and hands out one self-contained fragment per ingestible record. Links with
//! overlap are skipped there; only graph-mode ingestion stops at them.

use crate::arena::{Allocator, Arena, default_allocator};
use crate::config::{IterMode, SeqRefConfig};
use crate::handle::GraphHandle;
use crate::index::{IndexBuilder, KmerIndex, KmerIndexBuilder};
use crate::pool::{Append, Archive, GraphParams, Pool};
use crate::primitives::SINGLE_RECORD_ARENA_BYTES;
use crate::stream::{RecordStream, open_stream};
use crate::{Record, SeqRefError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// MATERIALIZATION STATE
// =============================================================================

/// The primary object an instance currently holds.
enum Materialization {
    Empty,
    Archived(Archive),
    Indexed(KmerIndex),
    /// A drain or build failed; the archive is gone.
    Failed,
}

/// Public, data-free view of the materialization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationState {
    /// Nothing derived yet.
    Empty,
    /// The stream was drained into a frozen archive.
    Archived,
    /// The archive was consumed by a successful index build.
    Indexed,
    /// Materialization or index build failed.
    Failed,
}

impl Materialization {
    fn state(&self) -> MaterializationState {
        match self {
            Self::Empty => MaterializationState::Empty,
            Self::Archived(_) => MaterializationState::Archived,
            Self::Indexed(_) => MaterializationState::Indexed,
            Self::Failed => MaterializationState::Failed,
        }
    }
}

// =============================================================================
// SEQREF
// =============================================================================

/// Lazy, memoized reference builder over a single-pass record stream.
pub struct SeqRef {
    source: Arc<str>,
    config: SeqRefConfig,
    stream: Option<Box<dyn RecordStream>>,
    state: Materialization,
    allocator: Arc<dyn Allocator>,
    builder: Box<dyn IndexBuilder>,
    records_read: u64,
}

impl SeqRef {
    /// Open the file at `source` with the built-in allocator and index builder.
    ///
    /// # Errors
    ///
    /// `EmptySource` for an empty identifier, `InvalidConfig` for a rejected
    /// configuration, `Open` if the stream cannot be opened.
    pub fn open(source: &str, config: SeqRefConfig) -> Result<Self, SeqRefError> {
        Self::open_with(
            source,
            config,
            default_allocator(),
            Box::new(KmerIndexBuilder),
        )
    }

    /// Open the file at `source` with an explicit allocator and index builder.
    pub fn open_with(
        source: &str,
        config: SeqRefConfig,
        allocator: Arc<dyn Allocator>,
        builder: Box<dyn IndexBuilder>,
    ) -> Result<Self, SeqRefError> {
        if source.is_empty() {
            return Err(SeqRefError::EmptySource);
        }
        config.validate()?;
        let stream = open_stream(source, config.format, config.direction)?;
        Ok(Self::assemble(
            Arc::from(source),
            stream,
            config,
            allocator,
            builder,
        ))
    }

    /// Wrap an already opened record stream.
    ///
    /// The source identifier is taken from the stream.
    pub fn from_stream(
        stream: Box<dyn RecordStream>,
        config: SeqRefConfig,
        allocator: Arc<dyn Allocator>,
        builder: Box<dyn IndexBuilder>,
    ) -> Result<Self, SeqRefError> {
        if stream.source().is_empty() {
            return Err(SeqRefError::EmptySource);
        }
        config.validate()?;
        let source = Arc::from(stream.source());
        Ok(Self::assemble(source, stream, config, allocator, builder))
    }

    fn assemble(
        source: Arc<str>,
        stream: Box<dyn RecordStream>,
        config: SeqRefConfig,
        allocator: Arc<dyn Allocator>,
        builder: Box<dyn IndexBuilder>,
    ) -> Self {
        tracing::debug!(
            source = %source,
            k = config.k,
            mode = ?config.mode,
            direction = ?config.direction,
            "sequence reference opened"
        );
        Self {
            source,
            config,
            stream: Some(stream),
            state: Materialization::Empty,
            allocator,
            builder,
            records_read: 0,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Identifier of the source, as supplied at construction.
    ///
    /// Stays valid after the stream is closed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current materialization state.
    #[must_use]
    pub fn state(&self) -> MaterializationState {
        self.state.state()
    }

    /// Iteration mode fixed at construction.
    #[must_use]
    pub fn mode(&self) -> IterMode {
        self.config.mode
    }

    /// The configuration captured at construction.
    #[must_use]
    pub fn config(&self) -> &SeqRefConfig {
        &self.config
    }

    /// Whether the record stream is still open.
    #[must_use]
    pub fn is_stream_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Records read from the stream so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn params(&self) -> GraphParams {
        GraphParams {
            k: self.config.k,
            direction: self.config.direction,
        }
    }

    // =========================================================================
    // RETRIEVAL
    // =========================================================================

    /// The k-mer index, built on first use.
    ///
    /// Drains the stream if nothing has been materialized yet, then hands the
    /// archive to the index builder. Once built, the index is cached and every
    /// later call returns a handle over the same object.
    ///
    /// # Errors
    ///
    /// A failed build leaves the instance without archive or index: the build
    /// error is returned once, and later calls return `Unavailable`.
    pub fn index(&mut self) -> Result<GraphHandle<'_>, SeqRefError> {
        if !matches!(self.state, Materialization::Indexed(_)) {
            self.build_index()?;
        }
        match &self.state {
            Materialization::Indexed(index) => {
                Ok(GraphHandle::over_index(Arc::clone(&self.source), index))
            }
            _ => Err(SeqRefError::Unavailable),
        }
    }

    /// The next iterator handle.
    ///
    /// In graph mode this is a handle over the whole archive (materialized on
    /// first use) and is never `None`. In streaming mode it is a fragment
    /// built from the next ingestible record, or `None` once the stream ends;
    /// use [`SeqRef::next_fragment`] to keep fragments past the borrow.
    pub fn iter(&mut self) -> Result<Option<GraphHandle<'_>>, SeqRefError> {
        match self.config.mode {
            IterMode::Graph => self.graph_handle().map(Some),
            IterMode::Streaming => self.next_fragment(),
        }
    }

    fn graph_handle(&mut self) -> Result<GraphHandle<'_>, SeqRefError> {
        if matches!(self.state, Materialization::Empty) {
            self.materialize()?;
        }
        let source = Arc::clone(&self.source);
        match &self.state {
            Materialization::Archived(archive) => Ok(GraphHandle::over_archive(source, archive)),
            Materialization::Indexed(index) => {
                Ok(GraphHandle::over_archive(source, index.archive()))
            }
            Materialization::Empty | Materialization::Failed => Err(SeqRefError::Unavailable),
        }
    }

    /// The fragment built from the next ingestible record (streaming mode).
    ///
    /// Fragments own their arena and borrow nothing from the instance, so
    /// any number of them can be held at once. Unrecognized records and
    /// links with overlap are skipped. Returns `None` once the stream ends.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` in graph mode; read and arena errors otherwise.
    pub fn next_fragment(&mut self) -> Result<Option<GraphHandle<'static>>, SeqRefError> {
        if self.config.mode != IterMode::Streaming {
            return Err(SeqRefError::InvalidConfig(
                "record fragments require streaming mode".into(),
            ));
        }
        while let Some(record) = self.read_record()? {
            match &record {
                Record::Unknown { tag } => {
                    tracing::debug!(source = %self.source, tag = %tag, "skipping unrecognized record");
                    continue;
                }
                Record::Link {
                    overlap: Some(overlap),
                    ..
                } => {
                    tracing::warn!(
                        source = %self.source,
                        overlap = %overlap,
                        records = self.records_read,
                        "skipping link with overlap"
                    );
                    continue;
                }
                Record::Segment { .. } | Record::Link { .. } => {}
            }

            let capacity = record.payload_bytes().max(SINGLE_RECORD_ARENA_BYTES);
            let arena = Arena::bounded(Arc::clone(&self.allocator), capacity)?;
            let mut pool = Pool::new(self.params(), arena);
            pool.append(&record)?;
            tracing::trace!(source = %self.source, capacity, "built record fragment");
            return Ok(Some(GraphHandle::fragment(
                Arc::clone(&self.source),
                pool.freeze(),
            )));
        }
        Ok(None)
    }

    // =========================================================================
    // MATERIALIZATION
    // =========================================================================

    fn build_index(&mut self) -> Result<(), SeqRefError> {
        if matches!(self.state, Materialization::Empty) {
            self.materialize()?;
        }
        let archive = match std::mem::replace(&mut self.state, Materialization::Failed) {
            Materialization::Archived(archive) => archive,
            other => {
                self.state = other;
                return Err(SeqRefError::Unavailable);
            }
        };

        let segments = archive.segment_count();
        match self.builder.build(archive, self.config.num_threads) {
            Ok(index) => {
                tracing::info!(
                    source = %self.source,
                    segments,
                    kmers = index.kmer_count(),
                    occurrences = index.occurrence_count(),
                    "index built"
                );
                self.state = Materialization::Indexed(index);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(source = %self.source, error = %e, "index build failed");
                Err(e)
            }
        }
    }

    fn materialize(&mut self) -> Result<(), SeqRefError> {
        match self.drain() {
            Ok(archive) => {
                self.state = Materialization::Archived(archive);
                Ok(())
            }
            Err(e) => {
                self.close_stream("materialization failed");
                self.state = Materialization::Failed;
                Err(e)
            }
        }
    }

    /// Read every remaining record into a fresh pool and freeze it.
    fn drain(&mut self) -> Result<Archive, SeqRefError> {
        let mut pool = Pool::new(self.params(), Arena::growable(Arc::clone(&self.allocator)));
        let mut skipped = 0u64;

        while let Some(record) = self.read_record()? {
            match pool.append(&record)? {
                Append::Segment(_) | Append::Link => {}
                Append::Overlap => {
                    tracing::warn!(
                        source = %self.source,
                        records = self.records_read,
                        "link with overlap, ingestion stops here"
                    );
                    self.close_stream("overlap link");
                    break;
                }
                Append::Unknown => {
                    skipped += 1;
                    tracing::debug!(source = %self.source, "skipping unrecognized record");
                }
            }
        }

        let archive = pool.freeze();
        tracing::info!(
            source = %self.source,
            segments = archive.segment_count(),
            links = archive.link_count(),
            bases = archive.total_bases(),
            skipped,
            "archive materialized"
        );
        Ok(archive)
    }

    /// Read one record. The stream is closed at its end or on a read error.
    fn read_record(&mut self) -> Result<Option<Record>, SeqRefError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.read_next() {
            Ok(Some(record)) => {
                self.records_read += 1;
                Ok(Some(record))
            }
            Ok(None) => {
                self.close_stream("end of stream");
                Ok(None)
            }
            Err(e) => {
                self.close_stream("read error");
                Err(e)
            }
        }
    }

    fn close_stream(&mut self, reason: &str) {
        if self.stream.take().is_some() {
            tracing::debug!(source = %self.source, reason, "record stream closed");
        }
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Tear the instance down: closes the stream and releases the archive or
    /// index.
    pub fn close(self) {
        drop(self);
    }
}

/// Tear down an optional instance. `None` is a no-op.
pub fn teardown(instance: Option<SeqRef>) {
    if let Some(instance) = instance {
        instance.close();
    }
}

impl Drop for SeqRef {
    fn drop(&mut self) {
        tracing::debug!(
            source = %self.source,
            state = ?self.state.state(),
            records = self.records_read,
            "sequence reference released"
        );
    }
}

impl fmt::Debug for SeqRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqRef")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("state", &self.state.state())
            .field("stream_open", &self.stream.is_some())
            .field("records_read", &self.records_read)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
