//! Detection tests: DFS baseline, anchor strategy, output modes, and the
//! three-event reachability scenario with this engine's adjacency rule
//! (forward edges exist only through shared link-tag buckets).

use trendgraph_core::{Constraint, Predicate, Query, Value};
use trendgraph_engine::{
    AnchorDetector, Constructor, Detector, DfsDetector, Event, Graph, GraphConfig, OutputMode,
    Schema, SharedEvent, StaticEqConstructor,
};

/// Schema with two tags over the same key field (start/end constraints can
/// differ per tag) plus a done flag dimension.
fn schema() -> Schema {
    Schema::new()
        .with_dimension('k', "key")
        .with_dimension('s', "key")
        .with_dimension('e', "key")
        .with_dimension('f', "done")
}

fn graph_over(events: Vec<SharedEvent>, query: Query) -> Graph {
    let mut graph = Graph::new(
        events,
        schema(),
        query,
        vec![Constructor::StaticEq(StaticEqConstructor::new('k'))],
        GraphConfig::with_parallelism(2),
    )
    .unwrap();
    graph.construct().unwrap();
    graph
}

fn dfs(graph: &Graph) -> trendgraph_engine::Detection {
    Detector::Dfs(DfsDetector::new(OutputMode::Materialize))
        .detect(graph)
        .unwrap()
}

/// Three events A(t=1,key=x), B(t=2,key=x), C(t=3,key=y).
/// Start = key present but limited to "x", end = key "y". C shares no
/// bucket with A or B, so every branch dead-ends: zero matches.
#[test]
fn test_cross_bucket_end_is_unreachable() {
    let events = vec![
        Event::new("A", 1).with_field("key", "x").into_shared(),
        Event::new("B", 2).with_field("key", "x").into_shared(),
        Event::new("C", 3).with_field("key", "y").into_shared(),
    ];
    let query = Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('s', Constraint::Eq(Value::Str("x".into()))),
            Predicate::new('e', Constraint::Eq(Value::Str("y".into()))),
        ],
        's',
        'e',
        'k',
    )
    .unwrap();
    let graph = graph_over(events, query);

    // bucket x links {A, B}, bucket y links {C}
    let attrs = graph.attributes_for('k'.into()).unwrap();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].events().len() + attrs[1].events().len(), 3);

    let detection = dfs(&graph);
    assert_eq!(detection.count, 0);
    assert!(detection.trends.is_empty());
}

/// With an unrestricted start, C itself both starts and ends a match: the
/// single-event trend [C] is the only one.
#[test]
fn test_start_that_is_also_end_emits_singleton() {
    let events = vec![
        Event::new("A", 1).with_field("key", "x").into_shared(),
        Event::new("B", 2).with_field("key", "x").into_shared(),
        Event::new("C", 3).with_field("key", "y").into_shared(),
    ];
    let query = Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('e', Constraint::Eq(Value::Str("y".into()))),
        ],
        'k',
        'e',
        'k',
    )
    .unwrap();
    let graph = graph_over(events, query);
    let detection = dfs(&graph);
    assert_eq!(detection.count, 1);
    assert_eq!(detection.trends[0].timestamps(), vec![3]);
}

fn chain_events() -> Vec<SharedEvent> {
    vec![
        Event::new("A", 1).with_field("key", "x").into_shared(),
        Event::new("B", 2).with_field("key", "x").into_shared(),
        Event::new("C", 3)
            .with_field("key", "x")
            .with_field("done", true)
            .into_shared(),
    ]
}

fn chain_query() -> Query {
    Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('f', Constraint::Eq(Value::Bool(true))),
        ],
        'k',
        'f',
        'k',
    )
    .unwrap()
}

/// Same-bucket chain A -> B -> C(done). The DFS emits [A,B,C], [B,C] and
/// [C]; the branch A -> C is pruned because C was already explored under
/// A's earlier child B.
#[test]
fn test_chain_matches_with_subtree_pruning() {
    let graph = graph_over(chain_events(), chain_query());
    let detection = dfs(&graph);

    let mut paths: Vec<Vec<i64>> = detection.trends.iter().map(|t| t.timestamps()).collect();
    paths.sort();
    assert_eq!(paths, vec![vec![1, 2, 3], vec![2, 3], vec![3]]);
    assert_eq!(detection.count, 3);
}

#[test]
fn test_trends_strictly_increase_and_never_repeat() {
    let graph = graph_over(chain_events(), chain_query());
    let detection = dfs(&graph);
    for trend in &detection.trends {
        let ts = trend.timestamps();
        assert!(ts.windows(2).all(|w| w[0] < w[1]), "{ts:?}");
        let events = trend.to_vec();
        for i in 0..events.len() {
            for j in i + 1..events.len() {
                assert!(!SharedEvent::ptr_eq(&events[i], &events[j]));
            }
        }
    }
}

#[test]
fn test_first_and_last_events_satisfy_start_and_end() {
    let graph = graph_over(chain_events(), chain_query());
    let detection = dfs(&graph);
    for trend in &detection.trends {
        let events = trend.to_vec();
        let first = events.first().unwrap();
        let last = events.last().unwrap();
        assert!(first.get("key").is_some());
        assert_eq!(last.get("done"), Some(&Value::Bool(true)));
    }
}

#[test]
fn test_count_only_equals_materialized_count() {
    let graph = graph_over(chain_events(), chain_query());
    let materialized = dfs(&graph);
    let counted = Detector::Dfs(DfsDetector::new(OutputMode::CountOnly))
        .detect(&graph)
        .unwrap();
    assert_eq!(counted.count, materialized.count);
    assert_eq!(counted.count, materialized.trends.len() as u64);
    assert!(counted.trends.is_empty());
}

#[test]
fn test_anchor_on_ends_matches_dfs() {
    let graph = graph_over(chain_events(), chain_query());
    let baseline = dfs(&graph);
    // one end vs three starts: the anchor strategy goes backward from C
    let anchored = Detector::Anchor(AnchorDetector::new(OutputMode::Materialize))
        .detect(&graph)
        .unwrap();
    let mut expect: Vec<Vec<i64>> = baseline.trends.iter().map(|t| t.timestamps()).collect();
    let mut got: Vec<Vec<i64>> = anchored.trends.iter().map(|t| t.timestamps()).collect();
    expect.sort();
    got.sort();
    assert_eq!(expect, got);
    assert_eq!(baseline.count, anchored.count);
}

#[test]
fn test_anchor_on_starts_degenerates_to_dfs() {
    let graph = graph_over(chain_events(), chain_query());
    let baseline = dfs(&graph);
    // a huge selectivity weight forces the start side
    let anchored = Detector::Anchor(
        AnchorDetector::new(OutputMode::Materialize).with_selectivity(100.0),
    )
    .detect(&graph)
    .unwrap();
    assert_eq!(baseline.count, anchored.count);
}

#[test]
fn test_anchor_iteration_bound_limits_path_length() {
    let graph = graph_over(chain_events(), chain_query());
    let bounded = Detector::Anchor(
        AnchorDetector::new(OutputMode::Materialize).with_iteration_bound(1),
    )
    .detect(&graph)
    .unwrap();
    // only single-hop paths survive; the two-hop [A,B,C] is cut, while the
    // pruned-by-full-DFS [A,C] reappears because B's subtree never runs
    let mut got: Vec<Vec<i64>> = bounded.trends.iter().map(|t| t.timestamps()).collect();
    got.sort();
    assert_eq!(got, vec![vec![1, 3], vec![2, 3], vec![3]]);
}

#[test]
fn test_no_candidates_is_zero_matches_not_error() {
    let events = vec![Event::new("A", 1).with_field("key", "x").into_shared()];
    let query = Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('e', Constraint::Eq(Value::Str("never".into()))),
        ],
        'e',
        'e',
        'k',
    )
    .unwrap();
    let graph = graph_over(events, query);
    let detection = dfs(&graph);
    assert_eq!(detection.count, 0);
}

#[test]
fn test_link_tag_without_constructor_is_an_error() {
    // constructor indexes 'k' but the query links through 'f'
    let query = Query::new(
        vec![
            Predicate::new('k', Constraint::Any),
            Predicate::new('f', Constraint::Any),
        ],
        'k',
        'f',
        'f',
    )
    .unwrap();
    let graph = graph_over(chain_events(), query);
    let err = dfs_result(&graph);
    assert!(err.is_err());
}

fn dfs_result(
    graph: &Graph,
) -> Result<trendgraph_engine::Detection, trendgraph_engine::GraphError> {
    Detector::Dfs(DfsDetector::new(OutputMode::Materialize)).detect(graph)
}
