//! # Trendgraph Core
//!
//! Foundational types for the trendgraph complex-event-processing engine.
//!
//! This crate provides the data structures shared between the graph engine
//! and its callers:
//!
//! - [`value`]: runtime attribute values with type coercion
//! - [`query`]: predicates, tags and the pattern query consumed by detectors
//! - [`error`]: query validation errors

pub mod error;
pub mod query;
pub mod value;

pub use error::QueryError;
pub use query::{Constraint, Predicate, Query, Tag};
pub use value::{AttrKey, Value};
