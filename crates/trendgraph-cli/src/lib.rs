//! Argument parsing helpers for the trendgraph CLI

use anyhow::{bail, Context, Result};
use trendgraph_core::{Constraint, Predicate, Query, Tag, Value};
use trendgraph_engine::Schema;

/// One attribute dimension as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionSpec {
    Exact { tag: Tag, field: String },
    Range { tag: Tag, field: String },
}

impl DimensionSpec {
    pub fn tag(&self) -> Tag {
        match self {
            DimensionSpec::Exact { tag, .. } | DimensionSpec::Range { tag, .. } => *tag,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            DimensionSpec::Exact { field, .. } | DimensionSpec::Range { field, .. } => field,
        }
    }
}

/// Parse `tag=field`, e.g. `k=key`.
pub fn parse_dimension(spec: &str, range: bool) -> Result<DimensionSpec> {
    let (tag, field) = spec
        .split_once('=')
        .with_context(|| format!("dimension '{spec}' is not of the form tag=field"))?;
    let tag = single_char_tag(tag)?;
    if field.is_empty() {
        bail!("dimension '{spec}' has an empty field name");
    }
    let field = field.to_string();
    Ok(if range {
        DimensionSpec::Range { tag, field }
    } else {
        DimensionSpec::Exact { tag, field }
    })
}

/// Parse `tag:op[:value]`, e.g. `k:any`, `k:eq:x`, `p:gt:10`, `p:range:1..5`.
pub fn parse_predicate(spec: &str) -> Result<Predicate> {
    let mut parts = spec.splitn(3, ':');
    let tag = single_char_tag(parts.next().unwrap_or_default())?;
    let op = parts
        .next()
        .with_context(|| format!("predicate '{spec}' has no operator"))?;
    let arg = parts.next();

    let constraint = match (op, arg) {
        ("any", None) => Constraint::Any,
        ("eq", Some(v)) => Constraint::Eq(parse_value(v)),
        ("ne", Some(v)) => Constraint::Ne(parse_value(v)),
        ("gt", Some(v)) => Constraint::Gt(parse_number(v)?),
        ("ge", Some(v)) => Constraint::Ge(parse_number(v)?),
        ("lt", Some(v)) => Constraint::Lt(parse_number(v)?),
        ("le", Some(v)) => Constraint::Le(parse_number(v)?),
        ("range", Some(v)) => {
            let (low, high) = v
                .split_once("..")
                .with_context(|| format!("range '{v}' is not of the form low..high"))?;
            Constraint::InRange {
                low: parse_number(low)?,
                high: parse_number(high)?,
            }
        }
        _ => bail!("predicate '{spec}' has an unknown or incomplete operator"),
    };
    Ok(Predicate::new(tag, constraint))
}

pub fn build_schema(specs: &[DimensionSpec]) -> Schema {
    let mut schema = Schema::new();
    for spec in specs {
        schema = schema.with_dimension(spec.tag(), spec.field());
    }
    schema
}

pub fn build_query(predicates: Vec<Predicate>, start: char, end: char, link: char) -> Result<Query> {
    Query::new(predicates, start, end, link).context("invalid query")
}

fn single_char_tag(s: &str) -> Result<Tag> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Tag(c)),
        _ => bail!("tag '{s}' must be a single character"),
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("'{s}' is not a number"))
}

fn parse_value(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = s.parse::<f64>() {
        Value::Float(f)
    } else if let Ok(b) = s.parse::<bool>() {
        Value::Bool(b)
    } else {
        Value::Str(s.to_string())
    }
}
