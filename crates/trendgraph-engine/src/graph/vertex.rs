//! Graph vertices
//!
//! Event and attribute vertices live in index-addressed arenas: events in
//! the graph's vertex arena, attribute buckets in their owning
//! constructor's arena. Edges are index lists, so there are no ownership
//! cycles and traversal stays O(1) per hop.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use trendgraph_core::{AttrKey, Tag, Value};

use crate::event::SharedEvent;

/// Index of an event vertex in the graph's vertex arena.
pub type VertexId = u32;

/// Index of an attribute vertex within its constructor's arena.
pub type AttrId = u32;

/// Graph node wrapping exactly one event.
///
/// Created once per input event in arrival order; identity and timestamp
/// never change. Edges are written once, after construction finishes, and
/// are read-only during detection.
#[derive(Debug)]
pub struct EventVertex {
    pub id: VertexId,
    pub event: SharedEvent,
    edges: FxHashMap<Tag, SmallVec<[AttrId; 4]>>,
}

impl EventVertex {
    pub fn new(id: VertexId, event: SharedEvent) -> Self {
        Self {
            id,
            event,
            edges: FxHashMap::default(),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.event.timestamp
    }

    /// Attribute buckets this vertex participates in for one tag.
    pub fn edges(&self, tag: Tag) -> &[AttrId] {
        self.edges.get(&tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|v| v.len()).sum()
    }

    pub(crate) fn add_edge(&mut self, tag: Tag, attr: AttrId) {
        self.edges.entry(tag).or_default().push(attr);
    }
}

/// Graph node grouping events that share an attribute value or fall in a
/// numeric interval. Closed over the two bucket shapes; detectors match
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeVertex {
    /// All events sharing one discrete attribute value
    Exact {
        key: AttrKey,
        events: Vec<VertexId>,
    },
    /// Events whose numeric attribute value falls in `[low, high)`
    Range {
        low: f64,
        high: f64,
        events: Vec<VertexId>,
    },
}

impl AttributeVertex {
    /// Back-edges to the linked event vertices.
    pub fn events(&self) -> &[VertexId] {
        match self {
            AttributeVertex::Exact { events, .. } => events,
            AttributeVertex::Range { events, .. } => events,
        }
    }

    /// Whether a value belongs in this bucket.
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            AttributeVertex::Exact { key, .. } => {
                AttrKey::from_value(value).as_ref() == Some(key)
            }
            AttributeVertex::Range { low, high, .. } => value
                .as_float()
                .is_some_and(|v| v >= *low && v < *high),
        }
    }

    /// Lower bound for range buckets; exact buckets have none.
    pub fn lower_bound(&self) -> Option<f64> {
        match self {
            AttributeVertex::Exact { .. } => None,
            AttributeVertex::Range { low, .. } => Some(*low),
        }
    }

    /// Short form used by the flat-file dump.
    pub fn short_string(&self) -> String {
        match self {
            AttributeVertex::Exact { key, .. } => format!("={key}"),
            AttributeVertex::Range { low, high, .. } => format!("[{low},{high})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn test_event_vertex_edges() {
        let mut v = EventVertex::new(0, Event::new("E", 5).into_shared());
        assert_eq!(v.timestamp(), 5);
        assert!(v.edges(Tag('k')).is_empty());

        v.add_edge(Tag('k'), 2);
        v.add_edge(Tag('k'), 7);
        v.add_edge(Tag('v'), 1);
        assert_eq!(v.edges(Tag('k')), &[2, 7]);
        assert_eq!(v.edges(Tag('v')), &[1]);
        assert_eq!(v.edge_count(), 3);
    }

    #[test]
    fn test_exact_bucket_contains() {
        let bucket = AttributeVertex::Exact {
            key: AttrKey::Str("x".into()),
            events: vec![],
        };
        assert!(bucket.contains(&Value::Str("x".into())));
        assert!(!bucket.contains(&Value::Str("y".into())));
        assert!(!bucket.contains(&Value::Float(1.0)));
    }

    #[test]
    fn test_range_bucket_half_open() {
        let bucket = AttributeVertex::Range {
            low: 1.0,
            high: 2.0,
            events: vec![],
        };
        assert!(bucket.contains(&Value::Float(1.0)));
        assert!(bucket.contains(&Value::Int(1)));
        assert!(!bucket.contains(&Value::Float(2.0)));
        assert!(!bucket.contains(&Value::Str("1".into())));
        assert_eq!(bucket.lower_bound(), Some(1.0));
    }

    #[test]
    fn test_short_string() {
        let eq = AttributeVertex::Exact {
            key: AttrKey::Int(3),
            events: vec![],
        };
        let range = AttributeVertex::Range {
            low: 0.0,
            high: 1.0,
            events: vec![],
        };
        assert_eq!(eq.short_string(), "=3");
        assert_eq!(range.short_string(), "[0,1)");
    }
}
