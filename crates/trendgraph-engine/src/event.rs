//! Events and the attribute schema

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trendgraph_core::{Query, Tag, Value};

use crate::error::GraphError;

/// Type alias for IndexMap with FxBuildHasher for faster hashing of event fields.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A shared reference to an Event. The graph holds one vertex per event and
/// trends share event payloads across branches, so events are never deep
/// copied after ingestion.
pub type SharedEvent = Arc<Event>;

/// One timestamped input record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (Arc<str> for O(1) clone)
    pub event_type: Arc<str>,
    /// Timestamp in milliseconds; defines the total order detection relies on
    pub timestamp: i64,
    /// Attribute values by field name
    pub data: FxIndexMap<String, Value>,
}

impl Event {
    pub fn new(event_type: impl Into<Arc<str>>, timestamp: i64) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp,
            data: IndexMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_float())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_int())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    pub fn into_shared(self) -> SharedEvent {
        Arc::new(self)
    }
}

/// Maps attribute tags to event field names.
///
/// Constructors and detectors address attribute dimensions by [`Tag`];
/// the schema resolves a tag to the field carrying that dimension's value
/// and validates query tags against the known dimensions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<Tag, String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, tag: impl Into<Tag>, field: impl Into<String>) -> Self {
        self.fields.insert(tag.into(), field.into());
        self
    }

    pub fn field(&self, tag: Tag) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.fields.iter().map(|(t, f)| (*t, f.as_str()))
    }

    /// Resolve an event's value for a tag. Missing dimension or missing
    /// field both read as [`Value::Null`], which satisfies no constraint.
    pub fn value_of<'e>(&self, event: &'e Event, tag: Tag) -> &'e Value {
        static NULL: Value = Value::Null;
        self.field(tag)
            .and_then(|f| event.get(f))
            .unwrap_or(&NULL)
    }

    /// Check every tag a query references against the known dimensions.
    pub fn validate(&self, query: &Query) -> Result<(), GraphError> {
        for tag in query.tags() {
            if !self.fields.contains_key(&tag) {
                return Err(GraphError::UnknownDimension(tag));
            }
        }
        Ok(())
    }
}
