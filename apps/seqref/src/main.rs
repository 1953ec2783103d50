//! # seqref - Sequence Reference Builder
//!
//! The command-line front end of seqref-core.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │             apps/seqref (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │    Logging     │   │
//! │   │   (clap)    │        │ (tracing-sub.) │   │
//! │   └──────┬──────┘        └────────────────┘   │
//! │          ▼                                    │
//! │   ┌───────────────┐                           │
//! │   │  seqref-core  │                           │
//! │   │  (THE LOGIC)  │                           │
//! │   └───────────────┘                           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! seqref stats graph.gfa
//! seqref -k 21 --both-strands index reads.fa
//! seqref -k 5 lookup graph.gfa ACGTA
//! seqref --json stream reads.fq -n 10
//! ```

use clap::Parser;
use seqref::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the subscriber. SEQREF_LOG_FORMAT=json enables machine-parseable
/// output; SEQREF_LOG (or RUST_LOG) overrides the filter.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("SEQREF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "seqref=debug,seqref_core=debug"
    } else {
        "seqref=info,seqref_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SEQREF_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
