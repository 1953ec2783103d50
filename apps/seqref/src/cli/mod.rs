//! # seqref CLI Module
//!
//! This module implements the CLI interface for seqref.
//!
//! ## Available Commands
//!
//! - `stats` - Materialize the graph and summarize it
//! - `index` - Build the k-mer index and summarize it
//! - `lookup` - Find the occurrences of one k-mer
//! - `stream` - Walk the source one record fragment at a time

mod commands;
mod report;

use clap::{Parser, Subcommand};
use seqref_core::{IterMode, SeqDirection, SeqRefConfig, SeqRefError, SourceFormat};
use std::path::PathBuf;

pub use commands::*;
pub use report::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// seqref - sequence-graph reference builder
///
/// Reads FASTA, FASTQ or GFA once and derives a frozen graph archive, a k-mer
/// index, or one fragment per record.
#[derive(Parser, Debug)]
#[command(name = "seqref")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file; command-line flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// k-mer length (1-32)
    #[arg(short, long = "kmer-length", global = true)]
    pub k: Option<u8>,

    /// Also produce reverse-complement k-mers
    #[arg(long, global = true)]
    pub both_strands: bool,

    /// Input format (auto, fasta, fastq, gfa)
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Thread-count hint for index construction (0 = automatic)
    #[arg(short, long, global = true)]
    pub threads: Option<u16>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Materialize the graph and print segment, link and base counts
    Stats {
        /// Input file
        source: String,
    },

    /// Build the k-mer index and print its size
    Index {
        /// Input file
        source: String,
    },

    /// Print every occurrence of a k-mer
    Lookup {
        /// Input file
        source: String,

        /// Query k-mer (exactly k bases of A, C, G, T)
        kmer: String,
    },

    /// Print one line per record fragment
    Stream {
        /// Input file
        source: String,

        /// Stop after this many fragments
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Build the builder configuration: defaults, then the `--config` file, then
/// command-line flags. The iteration mode comes from the command.
pub fn resolve_config(cli: &Cli, mode: IterMode) -> Result<SeqRefConfig, SeqRefError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| SeqRefError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            SeqRefConfig::from_toml_str(&text)?
        }
        None => SeqRefConfig::default(),
    };

    if let Some(k) = cli.k {
        config.k = k;
    }
    if cli.both_strands {
        config.direction = SeqDirection::ForwardReverse;
    }
    if let Some(name) = &cli.format {
        config.format = SourceFormat::from_name(name).ok_or_else(|| {
            SeqRefError::InvalidConfig(format!("unknown input format '{}'", name))
        })?;
    }
    if let Some(threads) = cli.threads {
        config.num_threads = threads;
    }
    config.mode = mode;

    config.validate()?;
    Ok(config)
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SeqRefError> {
    let json = cli.json;

    match &cli.command {
        Commands::Stats { source } => {
            let config = resolve_config(&cli, IterMode::Graph)?;
            cmd_stats(source, config, json)
        }
        Commands::Index { source } => {
            let config = resolve_config(&cli, IterMode::Graph)?;
            cmd_index(source, config, json)
        }
        Commands::Lookup { source, kmer } => {
            let config = resolve_config(&cli, IterMode::Graph)?;
            cmd_lookup(source, kmer, config, json)
        }
        Commands::Stream { source, limit } => {
            let config = resolve_config(&cli, IterMode::Streaming)?;
            cmd_stream(source, config, *limit, json)
        }
    }
}
