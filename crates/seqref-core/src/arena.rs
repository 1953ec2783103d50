//! # Arenas
//!
//! Byte regions whose entire contents are freed as a unit when the region is
//! dropped, and the allocator capability they draw their memory from.
//!
//! Two shapes exist:
//! - **Bounded**: fixed capacity reserved up front. Backs the one-record
//!   fragments handed out in streaming mode.
//! - **Growable**: reserves from its allocator in `ARENA_GROWTH_CHUNK` steps.
//!   Backs whole-graph archives.
//!
//! The allocator is a capability object passed explicitly by whoever creates
//! the arena. [`SystemAllocator`] grants every request; [`BudgetAllocator`]
//! enforces a ceiling on live bytes and reports what is currently held.

use crate::primitives::ARENA_GROWTH_CHUNK;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by arenas and allocators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A bounded arena has no room left for the request.
    #[error("arena capacity exceeded: requested {requested} bytes, {available} of {capacity} available")]
    CapacityExceeded {
        /// Bytes requested.
        requested: usize,
        /// Bytes still free in the arena.
        available: usize,
        /// Total capacity of the arena.
        capacity: usize,
    },

    /// The allocator refused to hand out more memory.
    #[error("allocator budget exhausted: requested {requested} bytes with {live} of {limit} live")]
    BudgetExhausted {
        /// Bytes requested.
        requested: usize,
        /// Bytes live at the time of the request.
        live: usize,
        /// The allocator's ceiling.
        limit: usize,
    },
}

// =============================================================================
// ALLOCATOR CAPABILITY
// =============================================================================

/// Source of arena memory.
///
/// Every byte an arena holds is reserved through `reserve` and handed back
/// through `release` exactly once, when the arena is dropped.
pub trait Allocator: Send + Sync + fmt::Debug {
    /// Reserve `bytes` for a new or growing arena.
    fn reserve(&self, bytes: usize) -> Result<(), ArenaError>;

    /// Return `bytes` previously reserved.
    fn release(&self, bytes: usize);
}

/// The built-in allocator: grants every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn reserve(&self, _bytes: usize) -> Result<(), ArenaError> {
        Ok(())
    }

    fn release(&self, _bytes: usize) {}
}

/// The allocator used when the caller does not supply one.
#[must_use]
pub fn default_allocator() -> Arc<dyn Allocator> {
    Arc::new(SystemAllocator)
}

/// An allocator with a ceiling on live bytes.
#[derive(Debug)]
pub struct BudgetAllocator {
    limit: usize,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl BudgetAllocator {
    /// Create an allocator that never holds more than `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Bytes currently reserved by live arenas.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Highest value `live_bytes` has reached.
    #[must_use]
    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// The configured ceiling.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Allocator for BudgetAllocator {
    fn reserve(&self, bytes: usize) -> Result<(), ArenaError> {
        let updated = self
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                live.checked_add(bytes).filter(|&next| next <= self.limit)
            });
        match updated {
            Ok(previous) => {
                self.peak
                    .fetch_max(previous.saturating_add(bytes), Ordering::AcqRel);
                Ok(())
            }
            Err(live) => Err(ArenaError::BudgetExhausted {
                requested: bytes,
                live,
                limit: self.limit,
            }),
        }
    }

    fn release(&self, bytes: usize) {
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

// =============================================================================
// ARENA
// =============================================================================

/// Location of an allocation inside the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Whether the span covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// A byte region freed as a unit on drop.
pub struct Arena {
    data: Vec<u8>,
    /// Bytes reserved from the allocator (not necessarily used).
    reserved: usize,
    /// Fixed capacity for bounded arenas.
    limit: Option<usize>,
    allocator: Arc<dyn Allocator>,
}

impl Arena {
    /// Create an arena with a fixed capacity, reserved up front.
    pub fn bounded(allocator: Arc<dyn Allocator>, capacity: usize) -> Result<Self, ArenaError> {
        allocator.reserve(capacity)?;
        Ok(Self {
            data: Vec::with_capacity(capacity),
            reserved: capacity,
            limit: Some(capacity),
            allocator,
        })
    }

    /// Create an empty arena that grows on demand.
    #[must_use]
    pub fn growable(allocator: Arc<dyn Allocator>) -> Self {
        Self {
            data: Vec::new(),
            reserved: 0,
            limit: None,
            allocator,
        }
    }

    /// Copy `bytes` into the arena and return where they landed.
    pub fn alloc(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        let start = self.data.len();
        let end = start.saturating_add(bytes.len());

        match self.limit {
            Some(capacity) => {
                if end > capacity {
                    return Err(ArenaError::CapacityExceeded {
                        requested: bytes.len(),
                        available: capacity.saturating_sub(start),
                        capacity,
                    });
                }
            }
            None => {
                if end > self.reserved {
                    let grow = (end - self.reserved).max(ARENA_GROWTH_CHUNK);
                    self.allocator.reserve(grow)?;
                    self.reserved = self.reserved.saturating_add(grow);
                    self.data.reserve(self.reserved - start);
                }
            }
        }

        self.data.extend_from_slice(bytes);
        Ok(Span {
            start,
            len: bytes.len(),
        })
    }

    /// The bytes behind a span produced by this arena.
    #[must_use]
    pub fn get(&self, span: Span) -> &[u8] {
        self.data
            .get(span.start..span.start.saturating_add(span.len))
            .unwrap_or(&[])
    }

    /// Bytes handed out so far.
    #[must_use]
    pub fn used(&self) -> usize {
        self.data.len()
    }

    /// Bytes reserved from the allocator.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.reserved
    }

    /// Whether the arena has a fixed capacity.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.allocator.release(self.reserved);
        self.reserved = 0;
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("used", &self.data.len())
            .field("reserved", &self.reserved)
            .field("bounded", &self.limit.is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
