//! Examplan - training-example allocation planner
//!
//! Decides which fixed-length chunks of which utterances go into which
//! output archives, and writes the manifest files a downstream dumper
//! needs to actually extract them. Sampling is length-weighted and
//! category-balanced, and a given seed always reproduces the same plan
//! byte for byte.

pub mod allocation;
pub mod catalog;
pub mod manifest;
pub mod types;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Convenient alias for results returned by allocation modules.
pub type Result<T> = std::result::Result<T, AllocError>;

/// Error taxonomy for an allocation run.
///
/// `Invariant` means an internal contract was broken (a scheduler or
/// sampler bug), not bad user input; everything else maps to a
/// user-visible failure mode.
#[derive(Debug)]
pub enum AllocError {
    /// Invalid run parameters, caught before any sampling begins.
    Config(String),
    /// Malformed or misaligned input table.
    Format(String),
    /// Internal contract violation, e.g. a chunk longer than its utterance.
    Invariant(String),
    /// No utterance satisfied the sampling constraints within the retry cap.
    SamplingExhausted(String),
    /// Unable to create or write an output path.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AllocError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for AllocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Format(msg) => write!(f, "bad input table: {}", msg),
            Self::Invariant(msg) => write!(f, "internal invariant violated: {}", msg),
            Self::SamplingExhausted(msg) => write!(f, "sampling exhausted: {}", msg),
            Self::Io { path, source } => write!(f, "io error at {:?}: {}", path, source),
        }
    }
}

impl Error for AllocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
