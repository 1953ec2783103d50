//! # Graph Handles
//!
//! What callers get back from index and iterator retrieval.
//!
//! A handle bundles the source identifier, the graph object it refers to, an
//! optional k-mer cursor over that object, and a reference count.
//!
//! - Whole-archive and whole-index handles borrow from the
//!   [`SeqRef`](crate::SeqRef) that produced them and never own memory:
//!   releasing them leaves the instance's objects untouched.
//! - Fragment handles (streaming mode) exclusively own a one-record archive
//!   and the bounded arena behind it. The last release drops both.

use crate::index::KmerIndex;
use crate::kmer::{KmerCursor, KmerHit};
use crate::pool::Archive;
use std::fmt;
use std::sync::Arc;

/// The graph object a handle refers to.
pub enum HandleTarget<'a> {
    /// The instance's whole frozen archive.
    Archive(&'a Archive),
    /// The instance's k-mer index.
    Index(&'a KmerIndex),
    /// A one-record archive owned by the handle.
    Fragment(Box<Archive>),
}

/// A reference-counted view of a graph object.
pub struct GraphHandle<'a> {
    source: Arc<str>,
    target: HandleTarget<'a>,
    cursor: Option<KmerCursor>,
    ref_count: u32,
}

impl<'a> GraphHandle<'a> {
    pub(crate) fn over_archive(source: Arc<str>, archive: &'a Archive) -> Self {
        Self {
            source,
            target: HandleTarget::Archive(archive),
            cursor: Some(KmerCursor::new()),
            ref_count: 1,
        }
    }

    pub(crate) fn over_index(source: Arc<str>, index: &'a KmerIndex) -> Self {
        Self {
            source,
            target: HandleTarget::Index(index),
            cursor: None,
            ref_count: 1,
        }
    }

    pub(crate) fn fragment(source: Arc<str>, archive: Archive) -> Self {
        Self {
            source,
            target: HandleTarget::Fragment(Box::new(archive)),
            cursor: Some(KmerCursor::new()),
            ref_count: 1,
        }
    }

    /// Identifier of the source the graph object was derived from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The graph object this handle refers to.
    #[must_use]
    pub fn target(&self) -> &HandleTarget<'a> {
        &self.target
    }

    /// The archive behind the handle. For an index handle this is the
    /// archive the index consumed.
    #[must_use]
    pub fn archive(&self) -> &Archive {
        match &self.target {
            HandleTarget::Archive(archive) => archive,
            HandleTarget::Index(index) => index.archive(),
            HandleTarget::Fragment(archive) => archive.as_ref(),
        }
    }

    /// The index, for handles returned by index retrieval.
    #[must_use]
    pub fn index(&self) -> Option<&KmerIndex> {
        match &self.target {
            HandleTarget::Index(index) => Some(index),
            _ => None,
        }
    }

    /// Whether releasing this handle frees memory.
    #[must_use]
    pub fn owns_memory(&self) -> bool {
        matches!(self.target, HandleTarget::Fragment(_))
    }

    /// Whether the handle carries a k-mer iterator.
    #[must_use]
    pub fn has_iterator(&self) -> bool {
        self.cursor.is_some()
    }

    /// Current reference count.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Take another reference. Returns the new count.
    pub fn retain(&mut self) -> u32 {
        self.ref_count = self.ref_count.saturating_add(1);
        self.ref_count
    }

    /// Drop one reference.
    ///
    /// Returns the handle while references remain. When the count reaches
    /// zero the handle is consumed; a fragment handle frees its arena here.
    #[must_use = "a returned handle still holds references"]
    pub fn release(mut self) -> Option<Self> {
        self.ref_count = self.ref_count.saturating_sub(1);
        if self.ref_count > 0 {
            return Some(self);
        }
        if let HandleTarget::Fragment(archive) = &self.target {
            tracing::trace!(
                source = %self.source,
                arena_bytes = archive.arena_bytes(),
                "releasing fragment arena"
            );
        }
        None
    }
}

impl Iterator for GraphHandle<'_> {
    type Item = KmerHit;

    fn next(&mut self) -> Option<KmerHit> {
        let cursor = self.cursor.as_mut()?;
        let archive: &Archive = match &self.target {
            HandleTarget::Archive(archive) => archive,
            HandleTarget::Index(index) => index.archive(),
            HandleTarget::Fragment(archive) => archive.as_ref(),
        };
        cursor.advance(archive)
    }
}

impl fmt::Debug for GraphHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.target {
            HandleTarget::Archive(_) => "archive",
            HandleTarget::Index(_) => "index",
            HandleTarget::Fragment(_) => "fragment",
        };
        f.debug_struct("GraphHandle")
            .field("source", &self.source)
            .field("target", &kind)
            .field("iterator", &self.cursor.is_some())
            .field("ref_count", &self.ref_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeqDirection;
    use crate::arena::{Arena, BudgetAllocator};
    use crate::pool::{GraphParams, Pool};

    const PARAMS: GraphParams = GraphParams {
        k: 2,
        direction: SeqDirection::ForwardOnly,
    };

    #[test]
    fn fragment_arena_freed_on_last_release() {
        let budget = Arc::new(BudgetAllocator::new(1 << 20));
        let mut pool = Pool::new(PARAMS, Arena::bounded(budget.clone(), 128).expect("arena"));
        pool.append_segment("r1", b"ACGT").expect("append");

        let mut handle = GraphHandle::fragment(Arc::from("reads.fa"), pool.freeze());
        assert!(handle.owns_memory());
        assert_eq!(handle.retain(), 2);

        let handle = handle.release().expect("one reference left");
        assert_eq!(budget.live_bytes(), 128);

        assert!(handle.release().is_none());
        assert_eq!(budget.live_bytes(), 0);
    }

    #[test]
    fn archive_handle_iterates_without_owning() {
        let mut pool = Pool::new(PARAMS, Arena::growable(crate::arena::default_allocator()));
        pool.append_segment("s", b"ACG").expect("append");
        let archive = pool.freeze();

        let handle = GraphHandle::over_archive(Arc::from("g.gfa"), &archive);
        assert!(!handle.owns_memory());
        assert!(handle.index().is_none());
        assert_eq!(handle.source(), "g.gfa");
        assert_eq!(handle.count(), 2);

        // The archive is still usable after the handle is gone.
        assert_eq!(archive.segment_count(), 1);
    }
}
