//! # Configuration
//!
//! Immutable parameters captured by a [`SeqRef`](crate::SeqRef) at construction.

use crate::primitives::{DEFAULT_KMER_LENGTH, MAX_KMER_LENGTH};
use crate::{SeqDirection, SeqRefError, SourceFormat};
use serde::{Deserialize, Serialize};

/// Iteration strategy, fixed for the lifetime of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterMode {
    /// Materialize the whole stream once and iterate the frozen archive.
    #[default]
    Graph,
    /// Build one self-contained fragment per record, on demand.
    Streaming,
}

/// Configuration of a sequence reference builder.
///
/// Copied into the instance at construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeqRefConfig {
    /// k-mer length used for iteration and indexing.
    pub k: u8,
    /// Forward-only or forward-and-reverse k-mers.
    pub direction: SeqDirection,
    /// Format tag handed to the record stream opener.
    pub format: SourceFormat,
    /// Thread-count hint forwarded to the index builder. `0` lets it decide.
    pub num_threads: u16,
    /// Graph or streaming iteration.
    pub mode: IterMode,
}

impl Default for SeqRefConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_KMER_LENGTH,
            direction: SeqDirection::ForwardOnly,
            format: SourceFormat::Auto,
            num_threads: 0,
            mode: IterMode::Graph,
        }
    }
}

impl SeqRefConfig {
    /// Default configuration with the given iteration mode.
    #[must_use]
    pub fn with_mode(mode: IterMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check the configuration.
    ///
    /// `k` must lie in `1..=MAX_KMER_LENGTH`.
    pub fn validate(&self) -> Result<(), SeqRefError> {
        if self.k == 0 || self.k > MAX_KMER_LENGTH {
            return Err(SeqRefError::InvalidConfig(format!(
                "k must be between 1 and {}, got {}",
                MAX_KMER_LENGTH, self.k
            )));
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SeqRefError> {
        let config: Self =
            toml::from_str(text).map_err(|e| SeqRefError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
