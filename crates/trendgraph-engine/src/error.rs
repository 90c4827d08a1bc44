//! Engine error types

use thiserror::Error;
use trendgraph_core::{QueryError, Tag};

use crate::construct::ConstructionMode;

/// Construction and detection errors.
///
/// Capability mismatches and malformed queries are assembly defects and
/// fail loudly before any work runs; data-dependent conditions (no
/// candidates, no matches) are normal outcomes, never errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("constructor for tag '{tag}' does not support {mode} linking")]
    UnsupportedMode { tag: Tag, mode: ConstructionMode },

    #[error("parallelism must be >= 1, got {0}")]
    InvalidParallelism(usize),

    #[error("no constructor owns tag '{0}'")]
    UnknownTag(Tag),

    #[error("multiple constructors own tag '{0}'")]
    DuplicateConstructor(Tag),

    #[error("tag '{0}' is not a known schema dimension")]
    UnknownDimension(Tag),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Graph export errors. Export failures are isolated: they never abort
/// construction or detection.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to create dump directory after {attempts} attempts: {source}")]
    CreateDir {
        attempts: u32,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Event file ingestion errors.
#[derive(Debug, Error)]
pub enum EventFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: event has no \"type\" field")]
    MissingType { line: usize },
}
