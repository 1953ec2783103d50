//! # CLI Command Implementations
//!
//! Each command has a report function that does the work and returns a
//! serializable result, and a `cmd_*` wrapper that prints it.

use super::report::{
    FragmentContent, FragmentReport, HitReport, IndexReport, LookupReport, StatsReport,
};
use seqref_core::{GraphHandle, IterMode, SeqRef, SeqRefConfig, SeqRefError, encode_kmer};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Materialize `source` in graph mode and summarize the archive.
pub fn stats(source: &str, config: SeqRefConfig) -> Result<StatsReport, SeqRefError> {
    let mut seqref = SeqRef::open(source, config)?;

    let handle = seqref.iter()?.ok_or(SeqRefError::Unavailable)?;
    let archive = handle.archive();
    let segments = archive.segment_count();
    let links = archive.link_count();
    let dangling_links = archive.links().filter(|l| !l.is_resolved()).count();
    let bases = archive.total_bases();
    let arena_bytes = archive.arena_bytes();
    drop(handle);

    Ok(StatsReport {
        source: seqref.source().to_owned(),
        state: seqref.state(),
        segments,
        links,
        dangling_links,
        bases,
        arena_bytes,
        records_read: seqref.records_read(),
    })
}

/// Show the graph summary.
pub fn cmd_stats(source: &str, config: SeqRefConfig, json: bool) -> Result<(), SeqRefError> {
    let report = stats(source, config)?;
    if json {
        print_json(&report);
    } else {
        report.print_text();
    }
    Ok(())
}

// =============================================================================
// INDEX COMMAND
// =============================================================================

/// Build the k-mer index of `source` and summarize it.
pub fn index(source: &str, config: SeqRefConfig) -> Result<IndexReport, SeqRefError> {
    let direction = config.direction;
    let mut seqref = SeqRef::open(source, config)?;
    let handle = seqref.index()?;
    let index = handle.index().ok_or(SeqRefError::Unavailable)?;

    Ok(IndexReport {
        source: handle.source().to_owned(),
        k: index.k(),
        direction,
        segments: index.archive().segment_count(),
        distinct_kmers: index.kmer_count(),
        occurrences: index.occurrence_count(),
    })
}

/// Show the index summary.
pub fn cmd_index(source: &str, config: SeqRefConfig, json: bool) -> Result<(), SeqRefError> {
    let report = index(source, config)?;
    if json {
        print_json(&report);
    } else {
        report.print_text();
    }
    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Find every occurrence of `kmer` in the index of `source`.
pub fn lookup(source: &str, kmer: &str, config: SeqRefConfig) -> Result<LookupReport, SeqRefError> {
    let query = kmer.to_ascii_uppercase();
    if query.len() != usize::from(config.k) || encode_kmer(query.as_bytes()).is_none() {
        return Err(SeqRefError::InvalidConfig(format!(
            "query '{}' must be exactly {} bases of A, C, G, T",
            kmer, config.k
        )));
    }

    let mut seqref = SeqRef::open(source, config)?;
    let handle = seqref.index()?;
    let index = handle.index().ok_or(SeqRefError::Unavailable)?;
    let archive = index.archive();

    let hits = index
        .lookup(query.as_bytes())
        .iter()
        .map(|hit| HitReport {
            segment: archive
                .segment(hit.segment)
                .map(|s| s.name.to_owned())
                .unwrap_or_default(),
            position: hit.pos,
            strand: hit.strand.symbol(),
        })
        .collect();

    Ok(LookupReport {
        source: handle.source().to_owned(),
        kmer: query,
        hits,
    })
}

/// Show the occurrences of a k-mer.
pub fn cmd_lookup(
    source: &str,
    kmer: &str,
    config: SeqRefConfig,
    json: bool,
) -> Result<(), SeqRefError> {
    let report = lookup(source, kmer, config)?;
    if json {
        print_json(&report);
    } else {
        report.print_text();
    }
    Ok(())
}

// =============================================================================
// STREAM COMMAND
// =============================================================================

fn describe(ordinal: usize, mut handle: GraphHandle<'_>) -> FragmentReport {
    let archive = handle.archive();
    let arena_bytes = archive.arena_bytes();
    let content = match (archive.segments().next(), archive.links().next()) {
        (Some(segment), _) => FragmentContent::Segment {
            name: segment.name.to_owned(),
            length: segment.bases.len(),
        },
        (None, Some(link)) => FragmentContent::Link {
            from: format!("{}{}", link.from, link.from_orientation),
            to: format!("{}{}", link.to, link.to_orientation),
        },
        (None, None) => FragmentContent::Segment {
            name: String::new(),
            length: 0,
        },
    };
    let kmers = handle.by_ref().count();
    if let Some(held) = handle.release() {
        tracing::debug!(refs = held.ref_count(), "fragment still referenced");
    }

    FragmentReport {
        ordinal,
        content,
        kmers,
        arena_bytes,
    }
}

/// Walk `source` in streaming mode, passing each fragment report to `emit`.
///
/// The configured mode is overridden. Returns the number of fragments.
pub fn stream_with<F>(
    source: &str,
    mut config: SeqRefConfig,
    limit: Option<usize>,
    mut emit: F,
) -> Result<usize, SeqRefError>
where
    F: FnMut(FragmentReport),
{
    config.mode = IterMode::Streaming;
    let mut seqref = SeqRef::open(source, config)?;
    let mut emitted = 0usize;
    while limit.is_none_or(|limit| emitted < limit) {
        let Some(handle) = seqref.next_fragment()? else {
            break;
        };
        emitted += 1;
        emit(describe(emitted, handle));
    }
    tracing::debug!(source, fragments = emitted, "stream finished");
    Ok(emitted)
}

/// Build one fragment per record of `source`, up to `limit` of them.
pub fn stream(
    source: &str,
    config: SeqRefConfig,
    limit: Option<usize>,
) -> Result<Vec<FragmentReport>, SeqRefError> {
    let mut reports = Vec::new();
    stream_with(source, config, limit, |report| reports.push(report))?;
    Ok(reports)
}

/// Show one line per record fragment.
pub fn cmd_stream(
    source: &str,
    config: SeqRefConfig,
    limit: Option<usize>,
    json: bool,
) -> Result<(), SeqRefError> {
    stream_with(source, config, limit, |report| {
        if json {
            println!("{}", serde_json::to_string(&report).unwrap_or_default());
        } else {
            report.print_text();
        }
    })?;
    Ok(())
}
