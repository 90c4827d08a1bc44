//! Query validation errors

use crate::query::Tag;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query has no predicates")]
    NoPredicates,

    #[error("duplicate predicate tag '{0}'")]
    DuplicateTag(Tag),

    #[error("{role} tag '{tag}' does not name a registered predicate")]
    UnknownTag { role: &'static str, tag: Tag },
}
