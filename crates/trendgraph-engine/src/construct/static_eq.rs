//! Parallel-capable exact-value bucketing
//!
//! Bucket assignment for a vertex depends only on that vertex's attribute
//! value, so the vertex arena is split into `P` disjoint interleaved lanes
//! (lane `i` takes indices `i, i + P, i + 2P, ...`), each lane builds a
//! private partial index, and the partials are merged single-threaded
//! after the join. The hot insertion loop never synchronizes across lanes,
//! and the finalized index is identical for every `P`.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;
use trendgraph_core::{AttrKey, Tag};

use crate::event::Schema;
use crate::graph::{AttrId, AttributeVertex, EventVertex, VertexId};

pub struct StaticEqConstructor {
    tag: Tag,
    staging: FxHashMap<AttrKey, Vec<VertexId>>,
    attrs: Vec<AttributeVertex>,
    event_edges: Vec<(VertexId, AttrId)>,
    count_from: u64,
    count_to: u64,
}

impl StaticEqConstructor {
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self {
            tag: tag.into(),
            staging: FxHashMap::default(),
            attrs: Vec::new(),
            event_edges: Vec::new(),
            count_from: 0,
            count_to: 0,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn parallel_link(&mut self, vertices: &[EventVertex], parallelism: usize, schema: &Schema) {
        let tag = self.tag;
        let partials: Vec<FxHashMap<AttrKey, Vec<VertexId>>> = (0..parallelism)
            .into_par_iter()
            .map(|lane| {
                let mut buckets: FxHashMap<AttrKey, Vec<VertexId>> = FxHashMap::default();
                let mut i = lane;
                while i < vertices.len() {
                    let vertex = &vertices[i];
                    if let Some(key) = AttrKey::from_value(schema.value_of(&vertex.event, tag)) {
                        buckets.entry(key).or_default().push(vertex.id);
                    }
                    i += parallelism;
                }
                buckets
            })
            .collect();

        // single-threaded merge after the join
        for partial in partials {
            for (key, ids) in partial {
                let links = ids.len() as u64;
                self.count_from += links;
                self.count_to += links;
                self.staging.entry(key).or_default().extend(ids);
            }
        }
        debug!(tag = %self.tag, buckets = self.staging.len(), "merged lane partials");
    }

    pub fn manage(&mut self) {
        let mut buckets: Vec<(AttrKey, Vec<VertexId>)> = self.staging.drain().collect();
        // Deterministic arena regardless of lane count: buckets ascend by
        // key, members ascend by vertex id.
        buckets.sort_by(|a, b| a.0.cmp(&b.0));
        self.attrs = Vec::with_capacity(buckets.len());
        for (key, mut events) in buckets {
            events.sort_unstable();
            let attr_id = self.attrs.len() as AttrId;
            for &vid in &events {
                self.event_edges.push((vid, attr_id));
            }
            self.attrs.push(AttributeVertex::Exact { key, events });
        }
    }

    pub fn attributes(&self) -> &[AttributeVertex] {
        &self.attrs
    }

    pub fn take_event_edges(&mut self) -> Vec<(VertexId, AttrId)> {
        std::mem::take(&mut self.event_edges)
    }

    pub fn count_attr(&self) -> usize {
        if self.attrs.is_empty() {
            self.staging.len()
        } else {
            self.attrs.len()
        }
    }

    pub fn count_from(&self) -> u64 {
        self.count_from
    }

    pub fn count_to(&self) -> u64 {
        self.count_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn vertices(values: &[&str]) -> Vec<EventVertex> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                EventVertex::new(
                    i as VertexId,
                    Event::new("E", i as i64).with_field("key", *v).into_shared(),
                )
            })
            .collect()
    }

    fn managed(values: &[&str], parallelism: usize) -> StaticEqConstructor {
        let schema = Schema::new().with_dimension('k', "key");
        let vs = vertices(values);
        let mut c = StaticEqConstructor::new('k');
        c.parallel_link(&vs, parallelism, &schema);
        c.manage();
        c
    }

    #[test]
    fn test_buckets_by_value() {
        let c = managed(&["x", "x", "y"], 1);
        assert_eq!(c.count_attr(), 2);
        assert_eq!(c.count_from(), 3);
        assert_eq!(c.count_to(), 3);
        assert_eq!(
            c.attributes()[0],
            AttributeVertex::Exact {
                key: AttrKey::Str("x".into()),
                events: vec![0, 1],
            }
        );
        assert_eq!(c.attributes()[1].events(), &[2]);
    }

    #[test]
    fn test_lane_count_does_not_change_index() {
        let values = ["a", "b", "a", "c", "b", "a", "c", "a"];
        let single = managed(&values, 1);
        for p in [2, 3, 4, 8, 13] {
            let multi = managed(&values, p);
            assert_eq!(single.attributes(), multi.attributes(), "P = {p}");
            assert_eq!(single.count_from(), multi.count_from());
            assert_eq!(single.count_to(), multi.count_to());
        }
    }

    #[test]
    fn test_vertex_without_attribute_is_skipped() {
        let schema = Schema::new().with_dimension('k', "key");
        let vs = vec![
            EventVertex::new(0, Event::new("E", 0).with_field("key", "x").into_shared()),
            EventVertex::new(1, Event::new("E", 1).into_shared()),
            EventVertex::new(2, Event::new("E", 2).with_field("key", 1.5f64).into_shared()),
        ];
        let mut c = StaticEqConstructor::new('k');
        c.parallel_link(&vs, 2, &schema);
        c.manage();
        // the float and the missing field link nowhere
        assert_eq!(c.count_attr(), 1);
        assert_eq!(c.count_from(), 1);
    }

    #[test]
    fn test_event_edges_mirror_bucket_membership() {
        let mut c = managed(&["x", "y", "x"], 2);
        let edges = c.take_event_edges();
        assert_eq!(edges.len(), 3);
        for (vid, attr) in edges {
            assert!(c.attributes()[attr as usize].events().contains(&vid));
        }
    }
}
