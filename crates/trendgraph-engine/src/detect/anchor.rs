//! Anchor-based trend search
//!
//! Instead of scanning every start vertex, anchors on whichever
//! prefiltered candidate set is rarer (weighted by the caller's
//! selectivity hint) and expands outward from there. Anchoring on starts
//! degenerates to the forward DFS; anchoring on ends runs the mirrored
//! backward walk, descending in time toward the starts and reversing each
//! completed path. The iteration bound caps how many hops a branch may
//! expand, trading completeness for bounded work on dense graphs.

use std::collections::BinaryHeap;
use rustc_hash::FxHashSet;
use tracing::debug;
use trendgraph_core::Tag;

use super::dfs::dfs_from;
use super::{link_attributes, Detection, Output, OutputMode, Prefilter};
use crate::error::GraphError;
use crate::graph::{AttributeVertex, EventVertex, Graph, VertexId};
use crate::trend::EventTrend;

pub struct AnchorDetector {
    mode: OutputMode,
    selectivity: f64,
    num_iterations: usize,
}

impl AnchorDetector {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            selectivity: 1.0,
            num_iterations: 0,
        }
    }

    /// Weight applied to the end-candidate count when choosing the anchor
    /// side. Values below 1.0 bias toward anchoring on ends.
    pub fn with_selectivity(mut self, selectivity: f64) -> Self {
        self.selectivity = selectivity;
        self
    }

    /// Maximum expansion hops per branch; `0` leaves expansion unbounded.
    pub fn with_iteration_bound(mut self, num_iterations: usize) -> Self {
        self.num_iterations = num_iterations;
        self
    }

    pub fn detect(&self, graph: &Graph) -> Result<Detection, GraphError> {
        let attrs = link_attributes(graph)?;
        let link = graph.query().link_tag();
        let prefilter = Prefilter::compute(graph);

        let weighted_ends = prefilter.ends.len() as f64 * self.selectivity.max(0.0);
        let anchor_on_ends = weighted_ends <= prefilter.starts.len() as f64;
        debug!(
            starts = prefilter.starts.len(),
            ends = prefilter.ends.len(),
            anchor_on_ends,
            "anchor selection"
        );

        let mut output = Output::new(self.mode);
        if anchor_on_ends {
            for &anchor in &prefilter.ends {
                backward_from(
                    graph,
                    attrs,
                    link,
                    &prefilter.start_set,
                    &prefilter.end_set,
                    anchor,
                    self.num_iterations,
                    &mut output,
                );
            }
        } else {
            for &start in &prefilter.starts {
                dfs_from(
                    graph,
                    attrs,
                    link,
                    &prefilter.end_set,
                    start,
                    self.num_iterations,
                    &mut output,
                );
            }
        }
        Ok(output.into_detection())
    }
}

struct Frame {
    vertex: VertexId,
    /// Path in reverse arrival order: anchor first, earliest event last
    path: EventTrend,
    queue: BinaryHeap<(i64, VertexId)>,
    visited: FxHashSet<VertexId>,
}

/// Backward candidates: bucket members strictly earlier in time, visited
/// newest-first. End vertices are excluded; the forward search never
/// carries an end vertex mid-path, so no mirrored path may either.
fn backward_candidates(
    graph: &Graph,
    attrs: &[AttributeVertex],
    link: Tag,
    ends: &FxHashSet<VertexId>,
    vertex: &EventVertex,
) -> BinaryHeap<(i64, VertexId)> {
    let vertices = graph.vertices();
    let mut queue = BinaryHeap::new();
    for &attr in vertex.edges(link) {
        for &prev in attrs[attr as usize].events() {
            let ts = vertices[prev as usize].timestamp();
            if ts < vertex.timestamp() && !ends.contains(&prev) {
                queue.push((ts, prev));
            }
        }
    }
    queue
}

/// Reverse a backward path into an arrival-ordered trend.
fn reversed(path: &EventTrend) -> EventTrend {
    let mut trend = EventTrend::new();
    for event in path.to_vec().into_iter().rev() {
        trend.append(event);
    }
    trend
}

#[allow(clippy::too_many_arguments)]
fn backward_from(
    graph: &Graph,
    attrs: &[AttributeVertex],
    link: Tag,
    starts: &FxHashSet<VertexId>,
    ends: &FxHashSet<VertexId>,
    anchor: VertexId,
    max_hops: usize,
    output: &mut Output,
) {
    let vertices = graph.vertices();
    let root = &vertices[anchor as usize];

    let mut path = EventTrend::new();
    path.append(root.event.clone());
    if starts.contains(&anchor) {
        output.emit(reversed(&path));
    }

    let mut stack = vec![Frame {
        vertex: anchor,
        path,
        queue: backward_candidates(graph, attrs, link, ends, root),
        visited: FxHashSet::default(),
    }];

    while let Some(frame) = stack.last_mut() {
        match frame.queue.pop() {
            Some((_, prev)) => {
                if frame.visited.contains(&prev) {
                    continue;
                }
                let vertex = &vertices[prev as usize];
                let mut path = frame.path.clone();
                path.append(vertex.event.clone());
                if starts.contains(&prev) {
                    output.emit(reversed(&path));
                }
                // a start may still extend to an earlier start
                if max_hops == 0 || path.len() <= max_hops {
                    let queue = backward_candidates(graph, attrs, link, ends, vertex);
                    stack.push(Frame {
                        vertex: prev,
                        path,
                        queue,
                        visited: FxHashSet::default(),
                    });
                } else if starts.contains(&prev) {
                    frame.visited.insert(prev);
                }
            }
            None => {
                let mut done = match stack.pop() {
                    Some(f) => f,
                    None => break,
                };
                done.visited.insert(done.vertex);
                if let Some(parent) = stack.last_mut() {
                    parent.visited.extend(done.visited);
                }
            }
        }
    }
}
