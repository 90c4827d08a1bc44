//! Pattern detectors
//!
//! A detector consumes a constructed [`Graph`] plus its query, prefilters
//! candidate start and end vertices with one linear scan, and searches the
//! adjacency for timestamp-increasing match paths. The two strategies form
//! a closed set sharing one output contract:
//!
//! - [`DfsDetector`]: baseline prefiltered depth-first search from every
//!   start vertex.
//! - [`AnchorDetector`]: anchors on the rarer candidate set and expands
//!   outward, optionally bounding path length.

mod anchor;
mod dfs;

pub use anchor::AnchorDetector;
pub use dfs::DfsDetector;

use rustc_hash::FxHashSet;

use crate::error::GraphError;
use crate::graph::{Graph, VertexId};
use crate::trend::EventTrend;

/// Whether matches are materialized or only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Materialize,
    CountOnly,
}

/// Detection result. In [`OutputMode::CountOnly`] the trend list stays
/// empty and only the counter advances; both modes count identically.
#[derive(Debug, Default)]
pub struct Detection {
    pub trends: Vec<EventTrend>,
    pub count: u64,
}

/// Match collector shared by the strategies.
#[derive(Debug)]
pub(crate) struct Output {
    mode: OutputMode,
    detection: Detection,
}

impl Output {
    pub(crate) fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            detection: Detection::default(),
        }
    }

    pub(crate) fn emit(&mut self, trend: EventTrend) {
        self.detection.count += 1;
        if self.mode == OutputMode::Materialize {
            self.detection.trends.push(trend);
        }
    }

    pub(crate) fn into_detection(self) -> Detection {
        self.detection
    }
}

/// Candidate start and end vertex sets, computed by a single scan of the
/// vertex arena. Membership checks during traversal are O(1) instead of
/// re-evaluating predicates at every visited vertex.
#[derive(Debug)]
pub(crate) struct Prefilter {
    /// Start candidates in arrival order (drives deterministic search order)
    pub starts: Vec<VertexId>,
    pub start_set: FxHashSet<VertexId>,
    /// End candidates in arrival order
    pub ends: Vec<VertexId>,
    pub end_set: FxHashSet<VertexId>,
}

impl Prefilter {
    pub(crate) fn compute(graph: &Graph) -> Self {
        let query = graph.query();
        let schema = graph.schema();
        let start_pred = query.start_predicate();
        let end_pred = query.end_predicate();

        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for vertex in graph.vertices() {
            if start_pred
                .constraint
                .matches(schema.value_of(&vertex.event, start_pred.tag))
            {
                starts.push(vertex.id);
            }
            if end_pred
                .constraint
                .matches(schema.value_of(&vertex.event, end_pred.tag))
            {
                ends.push(vertex.id);
            }
        }
        let start_set = starts.iter().copied().collect();
        let end_set = ends.iter().copied().collect();
        Self {
            starts,
            start_set,
            ends,
            end_set,
        }
    }
}

/// Detection strategy.
pub enum Detector {
    Dfs(DfsDetector),
    Anchor(AnchorDetector),
}

impl Detector {
    /// Run the strategy over a constructed graph.
    ///
    /// Fails if the query's link tag has no owning constructor; empty
    /// candidate sets are a normal zero-match outcome, not an error.
    pub fn detect(&self, graph: &Graph) -> Result<Detection, GraphError> {
        match self {
            Detector::Dfs(d) => d.detect(graph),
            Detector::Anchor(d) => d.detect(graph),
        }
    }
}

/// Resolve the adjacency arena for the query's link tag, failing loudly
/// when the pipeline was assembled without a constructor for it.
pub(crate) fn link_attributes<'g>(
    graph: &'g Graph,
) -> Result<&'g [crate::graph::AttributeVertex], GraphError> {
    let link = graph.query().link_tag();
    graph
        .attributes_for(link)
        .ok_or(GraphError::UnknownTag(link))
}
