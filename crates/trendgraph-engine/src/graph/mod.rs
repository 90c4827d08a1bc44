//! The trend graph
//!
//! Orchestrates constructors over the full event batch: one event vertex
//! per input event, sequential constructors driven vertex-by-vertex in
//! arrival order, parallel constructors driven over interleaved lane
//! partitions, then a single-threaded finalization pass that manages every
//! index and wires the bidirectional adjacency.

mod vertex;

pub use vertex::{AttrId, AttributeVertex, EventVertex, VertexId};

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{info, warn};
use trendgraph_core::{Query, Tag};

use crate::config::GraphConfig;
use crate::construct::{ConstructionMode, Constructor};
use crate::error::GraphError;
use crate::event::{Schema, SharedEvent};

/// Summary counters reported after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub events: usize,
    pub attrs: usize,
    pub from_edges: u64,
    pub to_edges: u64,
}

pub struct Graph {
    schema: Schema,
    query: Query,
    config: GraphConfig,
    events: Vec<SharedEvent>,
    vertices: Vec<EventVertex>,
    constructors: Vec<Constructor>,
    by_tag: FxHashMap<Tag, usize>,
    stats: Option<GraphStats>,
}

impl Graph {
    /// Create a graph over a closed batch of events.
    ///
    /// Validates the configuration and the query against the schema up
    /// front; an incorrectly assembled pipeline never reaches
    /// [`construct`](Self::construct).
    pub fn new(
        events: Vec<SharedEvent>,
        schema: Schema,
        query: Query,
        constructors: Vec<Constructor>,
        config: GraphConfig,
    ) -> Result<Self, GraphError> {
        if config.parallelism < 1 {
            return Err(GraphError::InvalidParallelism(config.parallelism));
        }
        schema.validate(&query)?;
        let mut by_tag = FxHashMap::default();
        for (i, c) in constructors.iter().enumerate() {
            if by_tag.insert(c.tag(), i).is_some() {
                return Err(GraphError::DuplicateConstructor(c.tag()));
            }
        }
        Ok(Self {
            schema,
            query,
            config,
            events,
            vertices: Vec::new(),
            constructors,
            by_tag,
            stats: None,
        })
    }

    /// Build the graph: process the input stream, then manage every index.
    ///
    /// When the configuration names a dump directory the finished graph is
    /// exported there; export failure is logged and never aborts
    /// construction.
    pub fn construct(&mut self) -> Result<GraphStats, GraphError> {
        self.process_input_stream()?;
        let stats = self.manage_graph();
        if let Some(dir) = self.config.dump_dir.clone() {
            if let Err(e) = crate::dump::dump_graph(self, &dir) {
                warn!(error = %e, dir = %dir.display(), "graph export failed");
            }
        }
        Ok(stats)
    }

    /// Phase 1: create vertices in arrival order and drive every
    /// constructor over them in its declared mode.
    fn process_input_stream(&mut self) -> Result<(), GraphError> {
        let events = std::mem::take(&mut self.events);
        self.vertices.reserve(events.len());
        for event in events {
            let id = self.vertices.len() as VertexId;
            self.vertices.push(EventVertex::new(id, event));
        }
        info!(
            events = self.vertices.len(),
            parallelism = self.config.parallelism,
            "begin graph construction"
        );

        let (sequentials, parallels): (Vec<usize>, Vec<usize>) = (0..self.constructors.len())
            .partition(|&i| self.constructors[i].mode() == ConstructionMode::Sequential);

        let Self {
            vertices,
            constructors,
            schema,
            config,
            ..
        } = self;

        if !sequentials.is_empty() {
            for vertex in vertices.iter() {
                for &i in &sequentials {
                    constructors[i].link(vertex, schema)?;
                }
            }
        }
        for &i in &parallels {
            constructors[i].parallel_link(vertices, config.parallelism, schema)?;
        }
        for constructor in constructors.iter_mut() {
            constructor.invoke_events_end();
        }
        info!("finish stream");
        Ok(())
    }

    /// Phase 2: finalize every index, wire event edges, report statistics.
    fn manage_graph(&mut self) -> GraphStats {
        for i in 0..self.constructors.len() {
            self.constructors[i].manage();
            let tag = self.constructors[i].tag();
            for (vid, attr) in self.constructors[i].take_event_edges() {
                self.vertices[vid as usize].add_edge(tag, attr);
            }
        }
        let stats = GraphStats {
            events: self.vertices.len(),
            attrs: self.constructors.iter().map(|c| c.count_attr()).sum(),
            from_edges: self.constructors.iter().map(|c| c.count_from()).sum(),
            to_edges: self.constructors.iter().map(|c| c.count_to()).sum(),
        };
        info!(
            events = stats.events,
            attrs = stats.attrs,
            from_edges = stats.from_edges,
            to_edges = stats.to_edges,
            "finish manage"
        );
        self.stats = Some(stats);
        stats
    }

    pub fn vertices(&self) -> &[EventVertex] {
        &self.vertices
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Summary statistics; present once construction has run.
    pub fn stats(&self) -> Option<GraphStats> {
        self.stats
    }

    pub fn constructor_for(&self, tag: Tag) -> Option<&Constructor> {
        self.by_tag.get(&tag).map(|&i| &self.constructors[i])
    }

    /// The finalized attribute arena for one tag.
    pub fn attributes_for(&self, tag: Tag) -> Option<&[AttributeVertex]> {
        self.constructor_for(tag).map(|c| c.attributes())
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }
}
