//! Attribute-index constructors
//!
//! A constructor owns one attribute dimension's bucket arena and builds the
//! bidirectional edges between that arena and the event vertices. The two
//! construction modes form a closed set:
//!
//! - [`StaticEqConstructor`]: parallel-capable exact-value bucketing; a
//!   vertex's bucket is independent of every other vertex, so the input can
//!   be partitioned across lanes.
//! - [`DynamicRangeConstructor`]: sequential dynamic range bucketing; the
//!   bucket set evolves with each vertex seen, so vertices must arrive
//!   strictly in input order.
//!
//! Lifecycle: `link`/`parallel_link` once per vertex (or vertex set), then
//! `invoke_events_end` once, then `manage` once, after which the arena is
//! finalized and safe for concurrent read-only traversal. Calling a
//! constructor in the wrong mode is an assembly defect and surfaces as
//! [`GraphError::UnsupportedMode`].

mod dynamic_range;
mod static_eq;

pub use dynamic_range::DynamicRangeConstructor;
pub use static_eq::StaticEqConstructor;

use std::fmt;
use trendgraph_core::Tag;

use crate::error::GraphError;
use crate::event::Schema;
use crate::graph::{AttrId, AttributeVertex, EventVertex, VertexId};

/// How a constructor consumes the vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionMode {
    /// Must see vertices strictly in arrival order, single-threaded
    Sequential,
    /// Vertex assignment is order-independent; input may be partitioned
    /// across lanes
    Parallel,
}

impl fmt::Display for ConstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionMode::Sequential => write!(f, "sequential"),
            ConstructionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// A constructor for one attribute dimension.
pub enum Constructor {
    StaticEq(StaticEqConstructor),
    DynamicRange(DynamicRangeConstructor),
}

impl Constructor {
    /// The attribute tag this constructor indexes.
    pub fn tag(&self) -> Tag {
        match self {
            Constructor::StaticEq(c) => c.tag(),
            Constructor::DynamicRange(c) => c.tag(),
        }
    }

    /// The construction mode the graph must drive this constructor in.
    pub fn mode(&self) -> ConstructionMode {
        match self {
            Constructor::StaticEq(_) => ConstructionMode::Parallel,
            Constructor::DynamicRange(_) => ConstructionMode::Sequential,
        }
    }

    /// Incorporate one vertex, in arrival order. Sequential mode only.
    pub fn link(&mut self, vertex: &EventVertex, schema: &Schema) -> Result<(), GraphError> {
        match self {
            Constructor::DynamicRange(c) => {
                c.link(vertex, schema);
                Ok(())
            }
            Constructor::StaticEq(c) => Err(GraphError::UnsupportedMode {
                tag: c.tag(),
                mode: ConstructionMode::Sequential,
            }),
        }
    }

    /// Incorporate all vertices via `parallelism` interleaved lane
    /// partitions. Parallel mode only.
    pub fn parallel_link(
        &mut self,
        vertices: &[EventVertex],
        parallelism: usize,
        schema: &Schema,
    ) -> Result<(), GraphError> {
        match self {
            Constructor::StaticEq(c) => {
                c.parallel_link(vertices, parallelism, schema);
                Ok(())
            }
            Constructor::DynamicRange(c) => Err(GraphError::UnsupportedMode {
                tag: c.tag(),
                mode: ConstructionMode::Parallel,
            }),
        }
    }

    /// Flush state that depends on the end of the event stream.
    pub fn invoke_events_end(&mut self) {
        match self {
            Constructor::StaticEq(_) => {}
            Constructor::DynamicRange(c) => c.invoke_events_end(),
        }
    }

    /// Finalize the bucket arena for query-time read access.
    pub fn manage(&mut self) {
        match self {
            Constructor::StaticEq(c) => c.manage(),
            Constructor::DynamicRange(c) => c.manage(),
        }
    }

    /// The finalized bucket arena. Meaningful after `manage`.
    pub fn attributes(&self) -> &[AttributeVertex] {
        match self {
            Constructor::StaticEq(c) => c.attributes(),
            Constructor::DynamicRange(c) => c.attributes(),
        }
    }

    /// Event-to-bucket edges realized by `manage`, for the graph to wire
    /// into the event vertices. Drains the pending list.
    pub fn take_event_edges(&mut self) -> Vec<(VertexId, AttrId)> {
        match self {
            Constructor::StaticEq(c) => c.take_event_edges(),
            Constructor::DynamicRange(c) => c.take_event_edges(),
        }
    }

    /// Number of attribute buckets owned.
    pub fn count_attr(&self) -> usize {
        match self {
            Constructor::StaticEq(c) => c.count_attr(),
            Constructor::DynamicRange(c) => c.count_attr(),
        }
    }

    /// Attribute-to-event edges created so far.
    pub fn count_from(&self) -> u64 {
        match self {
            Constructor::StaticEq(c) => c.count_from(),
            Constructor::DynamicRange(c) => c.count_from(),
        }
    }

    /// Event-to-attribute edges created so far.
    pub fn count_to(&self) -> u64 {
        match self {
            Constructor::StaticEq(c) => c.count_to(),
            Constructor::DynamicRange(c) => c.count_to(),
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Constructor({} tag={} attrs={} from={} to={})",
            self.mode(),
            self.tag(),
            self.count_attr(),
            self.count_from(),
            self.count_to()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn test_wrong_mode_is_rejected() {
        let schema = Schema::new().with_dimension('k', "key");
        let vertex = EventVertex::new(0, Event::new("E", 1).with_field("key", 1i64).into_shared());

        let mut parallel_only = Constructor::StaticEq(StaticEqConstructor::new('k'));
        assert!(matches!(
            parallel_only.link(&vertex, &schema),
            Err(GraphError::UnsupportedMode {
                mode: ConstructionMode::Sequential,
                ..
            })
        ));

        let mut sequential_only = Constructor::DynamicRange(DynamicRangeConstructor::new('k'));
        assert!(matches!(
            sequential_only.parallel_link(std::slice::from_ref(&vertex), 2, &schema),
            Err(GraphError::UnsupportedMode {
                mode: ConstructionMode::Parallel,
                ..
            })
        ));
    }
}
