//! # Command Reports
//!
//! Serializable results of the CLI commands, printed as text or JSON.

use seqref_core::{MaterializationState, SeqDirection};
use serde::Serialize;

/// Result of `stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub source: String,
    pub state: MaterializationState,
    pub segments: usize,
    pub links: usize,
    /// Links with at least one endpoint missing from the archive.
    pub dangling_links: usize,
    pub bases: usize,
    pub arena_bytes: usize,
    pub records_read: u64,
}

/// Result of `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub source: String,
    pub k: u8,
    pub direction: SeqDirection,
    pub segments: usize,
    pub distinct_kmers: usize,
    pub occurrences: usize,
}

/// One occurrence printed by `lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitReport {
    pub segment: String,
    pub position: u32,
    pub strand: char,
}

/// Result of `lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupReport {
    pub source: String,
    pub kmer: String,
    pub hits: Vec<HitReport>,
}

/// What a streamed fragment holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragmentContent {
    Segment { name: String, length: usize },
    Link { from: String, to: String },
}

/// One line printed by `stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentReport {
    pub ordinal: usize,
    #[serde(flatten)]
    pub content: FragmentContent,
    pub kmers: usize,
    pub arena_bytes: usize,
}

// =============================================================================
// TEXT OUTPUT
// =============================================================================

impl StatsReport {
    pub fn print_text(&self) {
        println!("seqref Graph Summary");
        println!("====================");
        println!("Source:   {}", self.source);
        println!("State:    {:?}", self.state);
        println!();
        println!("Segments:       {}", self.segments);
        println!("Links:          {}", self.links);
        println!("Dangling Links: {}", self.dangling_links);
        println!("Bases:          {}", self.bases);
        println!("Arena Bytes:    {}", self.arena_bytes);
        println!("Records Read:   {}", self.records_read);
    }
}

impl IndexReport {
    pub fn print_text(&self) {
        println!("seqref K-mer Index");
        println!("==================");
        println!("Source:    {}", self.source);
        println!("k:         {}", self.k);
        println!("Direction: {:?}", self.direction);
        println!();
        println!("Segments:       {}", self.segments);
        println!("Distinct K-mers: {}", self.distinct_kmers);
        println!("Occurrences:    {}", self.occurrences);
    }
}

impl LookupReport {
    pub fn print_text(&self) {
        if self.hits.is_empty() {
            println!("{}: no occurrences", self.kmer);
            return;
        }
        for hit in &self.hits {
            println!("{}\t{}\t{}\t{}", self.kmer, hit.segment, hit.position, hit.strand);
        }
    }
}

impl FragmentReport {
    pub fn print_text(&self) {
        match &self.content {
            FragmentContent::Segment { name, length } => println!(
                "{}\tS\t{}\t{}bp\t{} k-mers",
                self.ordinal, name, length, self.kmers
            ),
            FragmentContent::Link { from, to } => {
                println!("{}\tL\t{} -> {}", self.ordinal, from, to)
            }
        }
    }
}
