//! Depth-first trend search
//!
//! For each prefiltered start vertex, walks the link-tag adjacency forward
//! in time: candidates are every event reachable through one of the
//! vertex's attribute buckets with a strictly greater timestamp, visited
//! in ascending timestamp order. Reaching an end vertex emits the branch's
//! trend; a branch that exhausts its candidates is discarded.
//!
//! The recursion of the textbook formulation is replaced by an explicit
//! frame stack so long matches cannot overflow the call stack. Each frame
//! keeps the visited set of its own subtree and unions it into its parent
//! when it completes, so a subtree already explored from the same parent
//! is never re-entered.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use rustc_hash::FxHashSet;
use tracing::debug;
use trendgraph_core::Tag;

use super::{link_attributes, Detection, Output, OutputMode, Prefilter};
use crate::error::GraphError;
use crate::graph::{AttributeVertex, EventVertex, Graph, VertexId};
use crate::trend::EventTrend;

pub struct DfsDetector {
    mode: OutputMode,
}

impl DfsDetector {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn detect(&self, graph: &Graph) -> Result<Detection, GraphError> {
        let attrs = link_attributes(graph)?;
        let link = graph.query().link_tag();
        let prefilter = Prefilter::compute(graph);
        debug!(
            starts = prefilter.starts.len(),
            ends = prefilter.ends.len(),
            "prefilter complete"
        );

        let mut output = Output::new(self.mode);
        for &start in &prefilter.starts {
            dfs_from(graph, attrs, link, &prefilter.end_set, start, 0, &mut output);
        }
        Ok(output.into_detection())
    }
}

/// One suspended expansion: the branch trend up to `vertex`, the remaining
/// forward candidates, and the subtree's visited set.
struct Frame {
    vertex: VertexId,
    trend: EventTrend,
    queue: BinaryHeap<Reverse<(i64, VertexId)>>,
    visited: FxHashSet<VertexId>,
}

/// Forward candidates of a vertex: every bucket member one link-tag hop
/// away with a strictly greater timestamp, ordered ascending by timestamp.
pub(crate) fn forward_candidates(
    graph: &Graph,
    attrs: &[AttributeVertex],
    link: Tag,
    vertex: &EventVertex,
) -> BinaryHeap<Reverse<(i64, VertexId)>> {
    let vertices = graph.vertices();
    let mut queue = BinaryHeap::new();
    for &attr in vertex.edges(link) {
        for &next in attrs[attr as usize].events() {
            let ts = vertices[next as usize].timestamp();
            if ts > vertex.timestamp() {
                queue.push(Reverse((ts, next)));
            }
        }
    }
    queue
}

/// `max_hops` bounds the number of non-start events a branch may carry
/// before it stops expanding; `0` means unbounded.
pub(crate) fn dfs_from(
    graph: &Graph,
    attrs: &[AttributeVertex],
    link: Tag,
    ends: &FxHashSet<VertexId>,
    start: VertexId,
    max_hops: usize,
    output: &mut Output,
) {
    let vertices = graph.vertices();
    let root = &vertices[start as usize];

    let mut trend = EventTrend::new();
    trend.append(root.event.clone());
    if ends.contains(&start) {
        output.emit(trend);
        return;
    }

    let mut stack = vec![Frame {
        vertex: start,
        trend,
        queue: forward_candidates(graph, attrs, link, root),
        visited: FxHashSet::default(),
    }];

    while let Some(frame) = stack.last_mut() {
        match frame.queue.pop() {
            Some(Reverse((_, next))) => {
                if frame.visited.contains(&next) {
                    continue;
                }
                let vertex = &vertices[next as usize];
                let mut trend = frame.trend.clone();
                trend.append(vertex.event.clone());
                if ends.contains(&next) {
                    output.emit(trend);
                    frame.visited.insert(next);
                } else if max_hops == 0 || trend.len() <= max_hops {
                    let queue = forward_candidates(graph, attrs, link, vertex);
                    stack.push(Frame {
                        vertex: next,
                        trend,
                        queue,
                        visited: FxHashSet::default(),
                    });
                }
            }
            None => {
                // subtree exhausted: fold its visited set into the parent
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
