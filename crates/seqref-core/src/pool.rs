//! # Pool and Archive
//!
//! The accumulate-then-freeze path of the graph builder.
//!
//! A [`Pool`] accepts segments and links one at a time, copying names and
//! bases into the arena it was opened on. [`Pool::freeze`] turns it into an
//! immutable [`Archive`] that owns the same arena, so the archive's memory
//! lives exactly as long as the archive (or whatever consumes it).

use crate::arena::{Arena, Span};
use crate::kmer::KmerIter;
use crate::{Orientation, Record, SegmentId, SeqDirection, SeqRefError};
use std::collections::BTreeMap;

// =============================================================================
// PARAMETERS
// =============================================================================

/// Graph parameters carried from the configuration into pools and archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphParams {
    /// k-mer length.
    pub k: u8,
    /// Strands produced by k-mer iteration.
    pub direction: SeqDirection,
}

// =============================================================================
// ENTRIES
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct SegmentEntry {
    name: Span,
    bases: Span,
}

#[derive(Debug, Clone, Copy)]
struct LinkEntry {
    from: Span,
    from_orientation: Orientation,
    to: Span,
    to_orientation: Orientation,
    from_id: Option<SegmentId>,
    to_id: Option<SegmentId>,
}

/// Outcome of appending one record to a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// A segment was appended (or already present under that name).
    Segment(SegmentId),
    /// An overlap-free link was appended.
    Link,
    /// The record is a link carrying overlap information. Nothing was appended
    /// and ingestion must stop.
    Overlap,
    /// The record kind is not understood. Nothing was appended.
    Unknown,
}

/// Normalize a base to upper-case `ACGTN`.
#[inline]
fn normalize_base(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b @ (b'A' | b'C' | b'G' | b'T') => b,
        _ => b'N',
    }
}

fn arena_str(arena: &Arena, span: Span) -> &str {
    std::str::from_utf8(arena.get(span)).unwrap_or_default()
}

// =============================================================================
// POOL
// =============================================================================

/// A mutable accumulation pool.
#[derive(Debug)]
pub struct Pool {
    params: GraphParams,
    arena: Arena,
    segments: Vec<SegmentEntry>,
    links: Vec<LinkEntry>,
    names: BTreeMap<String, SegmentId>,
}

impl Pool {
    /// Open a pool writing into `arena`.
    #[must_use]
    pub fn new(params: GraphParams, arena: Arena) -> Self {
        Self {
            params,
            arena,
            segments: Vec::new(),
            links: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    /// Append a named segment.
    ///
    /// A name that is already present keeps its first sequence; the existing
    /// identifier is returned.
    pub fn append_segment(&mut self, name: &str, bases: &[u8]) -> Result<SegmentId, SeqRefError> {
        if let Some(&existing) = self.names.get(name) {
            tracing::warn!(segment = name, "duplicate segment name, keeping the first");
            return Ok(existing);
        }

        let id = u32::try_from(self.segments.len())
            .map(SegmentId)
            .map_err(|_| SeqRefError::TooManySegments)?;

        let normalized: Vec<u8> = bases.iter().copied().map(normalize_base).collect();
        let name_span = self.arena.alloc(name.as_bytes())?;
        let bases_span = self.arena.alloc(&normalized)?;

        self.segments.push(SegmentEntry {
            name: name_span,
            bases: bases_span,
        });
        self.names.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Append an overlap-free link between two segment ends.
    ///
    /// Endpoints are resolved by name at freeze time, so links may precede
    /// the segments they reference.
    pub fn append_link(
        &mut self,
        from: &str,
        from_orientation: Orientation,
        to: &str,
        to_orientation: Orientation,
    ) -> Result<(), SeqRefError> {
        let from = self.arena.alloc(from.as_bytes())?;
        let to = self.arena.alloc(to.as_bytes())?;
        self.links.push(LinkEntry {
            from,
            from_orientation,
            to,
            to_orientation,
            from_id: None,
            to_id: None,
        });
        Ok(())
    }

    /// Append one stream record.
    pub fn append(&mut self, record: &Record) -> Result<Append, SeqRefError> {
        match record {
            Record::Segment { name, bases } => self.append_segment(name, bases).map(Append::Segment),
            Record::Link {
                overlap: Some(_), ..
            } => Ok(Append::Overlap),
            Record::Link {
                from,
                from_orientation,
                to,
                to_orientation,
                overlap: None,
            } => {
                self.append_link(from, *from_orientation, to, *to_orientation)?;
                Ok(Append::Link)
            }
            Record::Unknown { .. } => Ok(Append::Unknown),
        }
    }

    /// Number of segments appended so far.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of links appended so far.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Freeze the pool into an immutable archive.
    #[must_use]
    pub fn freeze(self) -> Archive {
        let Self {
            params,
            arena,
            segments,
            mut links,
            names,
        } = self;

        let mut dangling = 0usize;
        for link in &mut links {
            link.from_id = names.get(arena_str(&arena, link.from)).copied();
            link.to_id = names.get(arena_str(&arena, link.to)).copied();
            if link.from_id.is_none() || link.to_id.is_none() {
                dangling += 1;
            }
        }
        if dangling > 0 && !segments.is_empty() {
            tracing::warn!(dangling, "links reference segments missing from the archive");
        }

        Archive {
            params,
            arena,
            segments,
            links,
            names,
        }
    }
}

// =============================================================================
// ARCHIVE
// =============================================================================

/// An immutable, frozen collection of segments and links.
#[derive(Debug)]
pub struct Archive {
    params: GraphParams,
    arena: Arena,
    segments: Vec<SegmentEntry>,
    links: Vec<LinkEntry>,
    names: BTreeMap<String, SegmentId>,
}

/// Borrowed view of one archived segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentView<'a> {
    /// Identifier within the archive.
    pub id: SegmentId,
    /// Segment name.
    pub name: &'a str,
    /// Normalized bases (`ACGTN`).
    pub bases: &'a [u8],
}

/// Borrowed view of one archived link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkView<'a> {
    /// Source segment name.
    pub from: &'a str,
    /// Source orientation.
    pub from_orientation: Orientation,
    /// Target segment name.
    pub to: &'a str,
    /// Target orientation.
    pub to_orientation: Orientation,
    /// Resolved source segment, if it is part of the archive.
    pub from_id: Option<SegmentId>,
    /// Resolved target segment, if it is part of the archive.
    pub to_id: Option<SegmentId>,
}

impl LinkView<'_> {
    /// Whether both endpoints resolved to archived segments.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.from_id.is_some() && self.to_id.is_some()
    }
}

impl Archive {
    /// Parameters the archive was built with.
    #[must_use]
    pub fn params(&self) -> GraphParams {
        self.params
    }

    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether the archive holds neither segments nor links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.links.is_empty()
    }

    /// Total number of bases across all segments.
    #[must_use]
    pub fn total_bases(&self) -> usize {
        self.segments.iter().map(|s| s.bases.len()).sum()
    }

    /// Bytes reserved by the arena backing this archive.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.arena.capacity()
    }

    /// Look up a segment by identifier.
    #[must_use]
    pub fn segment(&self, id: SegmentId) -> Option<SegmentView<'_>> {
        let entry = self.segments.get(id.index())?;
        Some(self.view(id, entry))
    }

    /// Look up a segment identifier by name.
    #[must_use]
    pub fn segment_by_name(&self, name: &str) -> Option<SegmentId> {
        self.names.get(name).copied()
    }

    /// All segments in append order.
    pub fn segments(&self) -> impl Iterator<Item = SegmentView<'_>> + '_ {
        self.segments
            .iter()
            .zip(0u32..)
            .map(|(entry, id)| self.view(SegmentId(id), entry))
    }

    /// All links in append order.
    pub fn links(&self) -> impl Iterator<Item = LinkView<'_>> + '_ {
        self.links.iter().map(|link| LinkView {
            from: arena_str(&self.arena, link.from),
            from_orientation: link.from_orientation,
            to: arena_str(&self.arena, link.to),
            to_orientation: link.to_orientation,
            from_id: link.from_id,
            to_id: link.to_id,
        })
    }

    /// Iterate every k-mer of every segment.
    #[must_use]
    pub fn kmers(&self) -> KmerIter<'_> {
        KmerIter::new(self)
    }

    fn view<'a>(&'a self, id: SegmentId, entry: &SegmentEntry) -> SegmentView<'a> {
        SegmentView {
            id,
            name: arena_str(&self.arena, entry.name),
            bases: self.arena.get(entry.bases),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::default_allocator;

    fn params() -> GraphParams {
        GraphParams {
            k: 3,
            direction: SeqDirection::ForwardOnly,
        }
    }

    fn pool() -> Pool {
        Pool::new(params(), Arena::growable(default_allocator()))
    }

    #[test]
    fn freeze_keeps_segments_and_links() {
        let mut pool = pool();
        let a = pool.append_segment("A", b"ACGT").expect("A");
        let b = pool.append_segment("B", b"GGTT").expect("B");
        pool.append_link("A", Orientation::Forward, "B", Orientation::Forward)
            .expect("link");

        let archive = pool.freeze();
        assert_eq!(archive.segment_count(), 2);
        assert_eq!(archive.link_count(), 1);
        assert_eq!(archive.segment_by_name("B"), Some(b));

        let link = archive.links().next().expect("link");
        assert_eq!(link.from_id, Some(a));
        assert_eq!(link.to_id, Some(b));
        assert!(link.is_resolved());
    }

    #[test]
    fn bases_are_normalized() {
        let mut pool = pool();
        let id = pool.append_segment("s", b"acgtRYn").expect("append");
        let archive = pool.freeze();
        assert_eq!(archive.segment(id).expect("segment").bases, b"ACGTNNN");
    }

    #[test]
    fn duplicate_name_keeps_first_sequence() {
        let mut pool = pool();
        let first = pool.append_segment("dup", b"AAAA").expect("first");
        let second = pool.append_segment("dup", b"CCCC").expect("second");
        assert_eq!(first, second);

        let archive = pool.freeze();
        assert_eq!(archive.segment_count(), 1);
        assert_eq!(archive.segment(first).expect("segment").bases, b"AAAA");
    }

    #[test]
    fn link_may_precede_its_segments() {
        let mut pool = pool();
        pool.append_link("X", Orientation::Reverse, "Y", Orientation::Forward)
            .expect("link");
        pool.append_segment("X", b"ACG").expect("X");
        pool.append_segment("Y", b"TTA").expect("Y");

        let archive = pool.freeze();
        assert!(archive.links().all(|l| l.is_resolved()));
    }

    #[test]
    fn dangling_link_is_kept_unresolved() {
        let mut pool = pool();
        pool.append_link("P", Orientation::Forward, "Q", Orientation::Reverse)
            .expect("link");
        let archive = pool.freeze();

        let link = archive.links().next().expect("link");
        assert_eq!(link.from, "P");
        assert_eq!(link.to, "Q");
        assert_eq!(link.to_orientation, Orientation::Reverse);
        assert!(!link.is_resolved());
    }

    #[test]
    fn append_reports_overlap_without_appending() {
        let mut pool = pool();
        let overlapping = Record::Link {
            from: "A".into(),
            from_orientation: Orientation::Forward,
            to: "B".into(),
            to_orientation: Orientation::Forward,
            overlap: Some("3M".into()),
        };
        assert_eq!(pool.append(&overlapping).expect("append"), Append::Overlap);
        assert_eq!(pool.link_count(), 0);
        assert_eq!(
            pool.append(&Record::Unknown { tag: "W".into() }).expect("append"),
            Append::Unknown
        );
    }

    #[test]
    fn bounded_arena_overflow_surfaces_as_error() {
        let arena = Arena::bounded(default_allocator(), 4).expect("arena");
        let mut pool = Pool::new(params(), arena);
        let err = pool.append_segment("long", b"ACGTACGT").expect_err("overflow");
        assert!(matches!(err, SeqRefError::Arena(_)));
    }
}
