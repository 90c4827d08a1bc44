//! Flat-file export tests

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use trendgraph_core::{Constraint, Predicate, Query, Value};
use trendgraph_engine::{
    dump_graph, Constructor, Event, Graph, GraphConfig, Schema, SharedEvent, StaticEqConstructor,
};

fn small_graph() -> Graph {
    let events: Vec<SharedEvent> = vec![
        Event::new("Order", 1).with_field("key", "a").into_shared(),
        Event::new("Order", 2).with_field("key", "b").into_shared(),
        Event::new("Fill", 3).with_field("key", "a").into_shared(),
    ];
    let schema = Schema::new()
        .with_dimension('k', "key")
        .with_dimension('e', "key");
    let query = Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('e', Constraint::Eq(Value::Str("a".into()))),
        ],
        'k',
        'e',
        'k',
    )
    .unwrap();
    let mut graph = Graph::new(
        events,
        schema,
        query,
        vec![Constructor::StaticEq(StaticEqConstructor::new('k'))],
        GraphConfig::with_parallelism(2),
    )
    .unwrap();
    graph.construct().unwrap();
    graph
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn test_dump_writes_four_files() {
    let graph = small_graph();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("graph");
    dump_graph(&graph, &out).unwrap();

    for name in ["events.txt", "attributes.txt", "edges_from.txt", "edges_to.txt"] {
        assert!(out.join(name).exists(), "missing {name}");
    }
}

#[test]
fn test_dump_events_one_line_per_vertex() {
    let graph = small_graph();
    let dir = TempDir::new().unwrap();
    dump_graph(&graph, dir.path()).unwrap();

    let events = lines(&dir.path().join("events.txt"));
    assert_eq!(
        events,
        vec!["0 1 Order", "1 2 Order", "2 3 Fill"]
    );
}

#[test]
fn test_dump_attributes_and_edges_agree_with_graph() {
    let graph = small_graph();
    let dir = TempDir::new().unwrap();
    dump_graph(&graph, dir.path()).unwrap();

    // buckets sort by key, so "a" before "b"
    let attrs = lines(&dir.path().join("attributes.txt"));
    assert_eq!(attrs, vec!["k0 =a", "k1 =b"]);

    let from = lines(&dir.path().join("edges_from.txt"));
    assert_eq!(from, vec!["k0 0", "k0 2", "k1 1"]);

    // every forward edge has its reverse
    let to = lines(&dir.path().join("edges_to.txt"));
    assert_eq!(to.len(), from.len());
    for line in &from {
        let (attr, vid) = line.split_once(' ').unwrap();
        assert!(
            to.contains(&format!("{vid} {attr}")),
            "no reverse edge for {line}"
        );
    }
}

#[test]
fn test_config_dump_dir_exports_during_construction() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("graph");

    let events: Vec<SharedEvent> = vec![
        Event::new("Order", 1).with_field("key", "a").into_shared(),
    ];
    let schema = Schema::new().with_dimension('k', "key");
    let query = Query::new(
        vec![Predicate::new('k', Constraint::Any)],
        'k',
        'k',
        'k',
    )
    .unwrap();
    let mut config = GraphConfig::with_parallelism(1);
    config.dump_dir = Some(out.clone());

    let mut graph = Graph::new(
        events,
        schema,
        query,
        vec![Constructor::StaticEq(StaticEqConstructor::new('k'))],
        config,
    )
    .unwrap();
    graph.construct().unwrap();

    assert_eq!(lines(&out.join("events.txt")), vec!["0 1 Order"]);
}

#[test]
fn test_dump_creates_nested_directory() {
    let graph = small_graph();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("a").join("b").join("c");
    dump_graph(&graph, &out).unwrap();
    assert!(out.join("events.txt").exists());
}
