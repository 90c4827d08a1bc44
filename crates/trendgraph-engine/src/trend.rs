//! Event trends - candidate and completed match paths
//!
//! A DFS prefix may extend into many continuations, so branching must be
//! cheap: the trend is a persistent cons list sharing its prefix across
//! branches instead of deep-copying on every fork.

use std::fmt;
use std::sync::Arc;

use crate::event::SharedEvent;

struct TrendNode {
    event: SharedEvent,
    prev: Option<Arc<TrendNode>>,
}

/// An ordered sequence of matched events along one search branch.
///
/// `clone` is O(1); `append` allocates one node and never touches the
/// shared prefix.
#[derive(Clone, Default)]
pub struct EventTrend {
    head: Option<Arc<TrendNode>>,
    len: usize,
}

impl EventTrend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: SharedEvent) {
        self.head = Some(Arc::new(TrendNode {
            event,
            prev: self.head.take(),
        }));
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Materialize the trend in arrival order.
    pub fn to_vec(&self) -> Vec<SharedEvent> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            out.push(node.event.clone());
            cursor = node.prev.as_ref();
        }
        out.reverse();
        out
    }

    /// Timestamps in arrival order.
    pub fn timestamps(&self) -> Vec<i64> {
        self.to_vec().iter().map(|e| e.timestamp).collect()
    }

    /// The most recently appended event.
    pub fn last(&self) -> Option<&SharedEvent> {
        self.head.as_ref().map(|n| &n.event)
    }
}

impl fmt::Debug for EventTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTrend")
            .field("len", &self.len)
            .field("timestamps", &self.timestamps())
            .finish()
    }
}

impl fmt::Display for EventTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for event in self.to_vec() {
            if !first {
                write!(f, " -> ")?;
            }
            write!(f, "{}@{}", event.event_type, event.timestamp)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn ev(ts: i64) -> SharedEvent {
        Event::new("E", ts).into_shared()
    }

    #[test]
    fn test_empty_trend() {
        let trend = EventTrend::new();
        assert!(trend.is_empty());
        assert_eq!(trend.to_vec().len(), 0);
        assert!(trend.last().is_none());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut trend = EventTrend::new();
        trend.append(ev(1));
        trend.append(ev(2));
        trend.append(ev(3));
        assert_eq!(trend.len(), 3);
        assert_eq!(trend.timestamps(), vec![1, 2, 3]);
        assert_eq!(trend.last().unwrap().timestamp, 3);
    }

    #[test]
    fn test_branching_shares_prefix() {
        let mut trend = EventTrend::new();
        trend.append(ev(1));

        let mut left = trend.clone();
        let mut right = trend.clone();
        left.append(ev(2));
        right.append(ev(5));

        assert_eq!(trend.timestamps(), vec![1]);
        assert_eq!(left.timestamps(), vec![1, 2]);
        assert_eq!(right.timestamps(), vec![1, 5]);
    }

    #[test]
    fn test_display() {
        let mut trend = EventTrend::new();
        trend.append(ev(1));
        trend.append(ev(2));
        assert_eq!(trend.to_string(), "E@1 -> E@2");
    }
}
