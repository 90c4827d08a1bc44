//! Trendgraph Engine - trend graph construction and pattern detection
//!
//! This crate builds an in-memory graph over a closed batch of timestamped
//! events, indexing events by shared attribute values, and searches that
//! graph for timestamp-ordered event sequences matching a pattern query.
//!
//! The pipeline has two phases:
//!
//! 1. **Construction** ([`graph::Graph::construct`]): one [`EventVertex`]
//!    per input event, attribute buckets built by per-dimension
//!    [`construct::Constructor`]s (sequential or parallel), bidirectional
//!    event/attribute adjacency wired once every constructor has managed
//!    its index.
//! 2. **Detection** ([`detect::Detector::detect`]): prefiltered,
//!    timestamp-ordered search over the finalized adjacency, emitting or
//!    counting [`trend::EventTrend`] matches.

pub mod config;
pub mod construct;
pub mod detect;
pub mod dump;
pub mod error;
pub mod event;
pub mod event_file;
pub mod graph;
pub mod trend;

pub use config::GraphConfig;
pub use construct::{Constructor, DynamicRangeConstructor, StaticEqConstructor};
pub use dump::dump_graph;
pub use detect::{AnchorDetector, Detection, Detector, DfsDetector, OutputMode};
pub use error::{DumpError, EventFileError, GraphError};
pub use event::{Event, Schema, SharedEvent};
pub use graph::{AttributeVertex, EventVertex, Graph, GraphStats, VertexId};
pub use trend::EventTrend;
