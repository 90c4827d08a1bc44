//! Engine configuration
//!
//! Parallelism is explicit configuration threaded through graph
//! construction; there is no process-wide mutable state.

use std::path::PathBuf;

/// Configuration for graph construction
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Degree of parallel construction (number of worker lanes); must be >= 1.
    /// `1` degenerates parallel construction to a single lane.
    pub parallelism: usize,
    /// Optional directory for the flat-file graph dump
    pub dump_dir: Option<PathBuf>,
}

impl GraphConfig {
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism,
            dump_dir: None,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            dump_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parallelism_at_least_one() {
        assert!(GraphConfig::default().parallelism >= 1);
    }

    #[test]
    fn test_with_parallelism() {
        let config = GraphConfig::with_parallelism(4);
        assert_eq!(config.parallelism, 4);
        assert!(config.dump_dir.is_none());
    }
}
