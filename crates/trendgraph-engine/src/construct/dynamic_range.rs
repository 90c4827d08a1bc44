//! Sequential dynamic range bucketing
//!
//! Buckets partition the numeric line and evolve as values arrive: the
//! first value opens a bucket unbounded above, and every new distinct
//! value splits the bucket containing it, the existing bucket keeping
//! `[low, v)` and the new one taking `[v, high)` along with any events
//! whose value now belongs above the boundary. Because the bucket a vertex
//! lands in depends on the boundaries created by previously seen vertices,
//! this constructor must see the stream strictly in arrival order.

use std::collections::BTreeMap;
use trendgraph_core::Tag;

use crate::event::Schema;
use crate::graph::{AttrId, AttributeVertex, EventVertex, VertexId};

/// Total-order wrapper for bucket boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Num(f64);

impl Eq for Num {}

impl Ord for Num {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
struct Bucket {
    /// Upper bound; `None` while the bucket is still open at the top
    high: Option<f64>,
    events: Vec<(VertexId, f64)>,
}

pub struct DynamicRangeConstructor {
    tag: Tag,
    buckets: BTreeMap<Num, Bucket>,
    attrs: Vec<AttributeVertex>,
    event_edges: Vec<(VertexId, AttrId)>,
    count_from: u64,
    count_to: u64,
}

impl DynamicRangeConstructor {
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self {
            tag: tag.into(),
            buckets: BTreeMap::new(),
            attrs: Vec::new(),
            event_edges: Vec::new(),
            count_from: 0,
            count_to: 0,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn link(&mut self, vertex: &EventVertex, schema: &Schema) {
        let Some(v) = schema.value_of(&vertex.event, self.tag).as_float() else {
            return;
        };
        self.count_from += 1;
        self.count_to += 1;

        if self.buckets.is_empty() {
            self.buckets.insert(
                Num(v),
                Bucket {
                    high: None,
                    events: vec![(vertex.id, v)],
                },
            );
            return;
        }

        let glb = self.buckets.range(..=Num(v)).next_back().map(|(k, _)| *k);
        match glb {
            None => {
                // value lies below every boundary; the chain above is
                // contiguous, so the gap to close ends at the first low
                let first_low = self.buckets.keys().next().map(|n| n.0).unwrap_or(v);
                self.buckets.insert(
                    Num(v),
                    Bucket {
                        high: Some(first_low),
                        events: vec![(vertex.id, v)],
                    },
                );
            }
            Some(low) if low.0 == v => {
                if let Some(bucket) = self.buckets.get_mut(&low) {
                    bucket.events.push((vertex.id, v));
                }
            }
            Some(low) => {
                // v falls inside [low, high): close the lower half at v and
                // move events at or above the new boundary up
                let mut split = None;
                if let Some(bucket) = self.buckets.get_mut(&low) {
                    let high = bucket.high.replace(v);
                    let mut upper = Vec::new();
                    bucket.events.retain(|&(id, val)| {
                        if val >= v {
                            upper.push((id, val));
                            false
                        } else {
                            true
                        }
                    });
                    upper.push((vertex.id, v));
                    split = Some(Bucket {
                        high,
                        events: upper,
                    });
                }
                if let Some(bucket) = split {
                    self.buckets.insert(Num(v), bucket);
                }
            }
        }
    }

    /// Close the trailing open bucket now that the event stream has ended.
    pub fn invoke_events_end(&mut self) {
        if let Some((_, bucket)) = self.buckets.iter_mut().next_back() {
            if bucket.high.is_none() {
                bucket.high = Some(f64::INFINITY);
            }
        }
    }

    pub fn manage(&mut self) {
        self.attrs = Vec::with_capacity(self.buckets.len());
        for (low, bucket) in std::mem::take(&mut self.buckets) {
            let mut events: Vec<VertexId> = bucket.events.iter().map(|&(id, _)| id).collect();
            events.sort_unstable();
            let attr_id = self.attrs.len() as AttrId;
            for &vid in &events {
                self.event_edges.push((vid, attr_id));
            }
            self.attrs.push(AttributeVertex::Range {
                low: low.0,
                high: bucket.high.unwrap_or(f64::INFINITY),
                events,
            });
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
            self.buckets.len()
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
