//! Pattern queries and predicates
//!
//! A [`Query`] is the pre-parsed pattern specification a detector consumes:
//! a set of tagged [`Predicate`]s, the tags designating valid match starts
//! and ends, and the tag whose adjacency links consecutive positions.

use crate::error::QueryError;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute-dimension tag, drawn from a small fixed alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag(pub char);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<char> for Tag {
    fn from(c: char) -> Self {
        Tag(c)
    }
}

/// Value constraint a candidate event's attribute must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Attribute present with any non-null value
    Any,
    Eq(Value),
    Ne(Value),
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    /// Half-open numeric interval `[low, high)`
    InRange { low: f64, high: f64 },
}

impl Constraint {
    /// Evaluate this constraint against an attribute value.
    ///
    /// A missing attribute is represented as [`Value::Null`] and satisfies
    /// no constraint.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Constraint::Any => !value.is_null(),
            Constraint::Eq(v) => value == v,
            Constraint::Ne(v) => !value.is_null() && value != v,
            Constraint::Gt(n) => value.as_float().is_some_and(|v| v > *n),
            Constraint::Ge(n) => value.as_float().is_some_and(|v| v >= *n),
            Constraint::Lt(n) => value.as_float().is_some_and(|v| v < *n),
            Constraint::Le(n) => value.as_float().is_some_and(|v| v <= *n),
            Constraint::InRange { low, high } => value
                .as_float()
                .is_some_and(|v| v >= *low && v < *high),
        }
    }
}

/// One position of a pattern: the attribute dimension to traverse and the
/// constraint a candidate event must satisfy there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub tag: Tag,
    pub constraint: Constraint,
}

impl Predicate {
    pub fn new(tag: impl Into<Tag>, constraint: Constraint) -> Self {
        Self {
            tag: tag.into(),
            constraint,
        }
    }
}

/// The full pattern specification.
///
/// `start` and `end` name the predicates a match must begin and finish on;
/// `link` is the attribute tag whose adjacency connects consecutive
/// positions during traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    predicates: IndexMap<Tag, Predicate>,
    start: Tag,
    end: Tag,
    link: Tag,
}

impl Query {
    /// Build and validate a query.
    ///
    /// Fails if the predicate set is empty, a tag appears twice, or any of
    /// `start`/`end`/`link` does not name a registered predicate. Detectors
    /// rely on this: a malformed query never reaches the search phase.
    pub fn new(
        predicates: Vec<Predicate>,
        start: impl Into<Tag>,
        end: impl Into<Tag>,
        link: impl Into<Tag>,
    ) -> Result<Self, QueryError> {
        if predicates.is_empty() {
            return Err(QueryError::NoPredicates);
        }
        let mut map = IndexMap::with_capacity(predicates.len());
        for p in predicates {
            let tag = p.tag;
            if map.insert(tag, p).is_some() {
                return Err(QueryError::DuplicateTag(tag));
            }
        }
        let (start, end, link) = (start.into(), end.into(), link.into());
        for (role, tag) in [("start", start), ("end", end), ("link", link)] {
            if !map.contains_key(&tag) {
                return Err(QueryError::UnknownTag { role, tag });
            }
        }
        Ok(Self {
            predicates: map,
            start,
            end,
            link,
        })
    }

    pub fn predicates(&self) -> &IndexMap<Tag, Predicate> {
        &self.predicates
    }

    pub fn predicate(&self, tag: Tag) -> Option<&Predicate> {
        self.predicates.get(&tag)
    }

    pub fn start_tag(&self) -> Tag {
        self.start
    }

    pub fn end_tag(&self) -> Tag {
        self.end
    }

    pub fn link_tag(&self) -> Tag {
        self.link
    }

    /// The predicate a match must begin on.
    pub fn start_predicate(&self) -> &Predicate {
        &self.predicates[&self.start]
    }

    /// The predicate a match must finish on.
    pub fn end_predicate(&self) -> &Predicate {
        &self.predicates[&self.end]
    }

    /// All tags referenced by this query, for schema validation.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.predicates.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tag_query() -> Query {
        Query::new(
            vec![
                Predicate::new('k', Constraint::Any),
                Predicate::new('v', Constraint::Gt(10.0)),
            ],
            'k',
            'v',
            'k',
        )
        .unwrap()
    }

    #[test]
    fn test_constraint_eq() {
        let c = Constraint::Eq(Value::Str("y".into()));
        assert!(c.matches(&Value::Str("y".into())));
        assert!(!c.matches(&Value::Str("x".into())));
        assert!(!c.matches(&Value::Null));
    }

    #[test]
    fn test_constraint_numeric() {
        assert!(Constraint::Gt(5.0).matches(&Value::Int(6)));
        assert!(!Constraint::Gt(5.0).matches(&Value::Int(5)));
        assert!(Constraint::Ge(5.0).matches(&Value::Int(5)));
        assert!(Constraint::Lt(5.0).matches(&Value::Float(4.9)));
        assert!(!Constraint::Lt(5.0).matches(&Value::Str("4".into())));
    }

    #[test]
    fn test_constraint_range_half_open() {
        let c = Constraint::InRange { low: 1.0, high: 2.0 };
        assert!(c.matches(&Value::Float(1.0)));
        assert!(c.matches(&Value::Float(1.99)));
        assert!(!c.matches(&Value::Float(2.0)));
    }

    #[test]
    fn test_constraint_any_rejects_null() {
        assert!(Constraint::Any.matches(&Value::Int(0)));
        assert!(!Constraint::Any.matches(&Value::Null));
    }

    #[test]
    fn test_query_valid() {
        let q = two_tag_query();
        assert_eq!(q.start_tag(), Tag('k'));
        assert_eq!(q.end_tag(), Tag('v'));
        assert_eq!(q.link_tag(), Tag('k'));
        assert_eq!(q.predicates().len(), 2);
    }

    #[test]
    fn test_query_unknown_start_tag() {
        let err = Query::new(
            vec![Predicate::new('k', Constraint::Any)],
            'z',
            'k',
            'k',
        )
        .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownTag {
                role: "start",
                tag: Tag('z')
            }
        );
    }

    #[test]
    fn test_query_empty_predicates() {
        let err = Query::new(vec![], 'k', 'k', 'k').unwrap_err();
        assert_eq!(err, QueryError::NoPredicates);
    }

    #[test]
    fn test_query_duplicate_tag() {
        let err = Query::new(
            vec![
                Predicate::new('k', Constraint::Any),
                Predicate::new('k', Constraint::Gt(1.0)),
            ],
            'k',
            'k',
            'k',
        )
        .unwrap_err();
        assert_eq!(err, QueryError::DuplicateTag(Tag('k')));
    }
}
