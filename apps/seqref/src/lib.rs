//! # seqref
//!
//! Library side of the seqref binary: the clap command tree, configuration
//! layering and command implementations. `main.rs` only sets up logging and
//! dispatches.

pub mod cli;
