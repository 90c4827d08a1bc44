//! Trendgraph CLI - build a trend graph over an event file and search it

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};

use trendgraph_cli::{build_query, build_schema, parse_dimension, parse_predicate, DimensionSpec};
use trendgraph_engine::{
    dump_graph, AnchorDetector, Constructor, Detector, DfsDetector, DynamicRangeConstructor,
    Graph, GraphConfig, OutputMode, StaticEqConstructor,
};

#[derive(Parser)]
#[command(name = "trendgraph")]
#[command(version = "0.1.0")]
#[command(about = "Graph-based event trend detection", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Dfs,
    Anchor,
}

#[derive(Parser)]
struct GraphArgs {
    /// JSON-lines event file
    #[arg(short, long)]
    events: PathBuf,

    /// Exact-value dimension, as tag=field (repeatable)
    #[arg(short, long = "dimension")]
    dimensions: Vec<String>,

    /// Numeric range dimension, as tag=field (repeatable)
    #[arg(short, long = "range-dimension")]
    range_dimensions: Vec<String>,

    /// Predicate, as tag:op[:value] with op in any|eq|ne|gt|ge|lt|le|range
    #[arg(long = "predicate")]
    predicates: Vec<String>,

    /// Tag of the match-start predicate
    #[arg(long)]
    start: char,

    /// Tag of the match-end predicate
    #[arg(long)]
    end: char,

    /// Tag linking consecutive match positions
    #[arg(long)]
    link: char,

    /// Number of parallel construction lanes
    #[arg(short, long)]
    parallelism: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and run a detector
    Detect {
        #[command(flatten)]
        graph: GraphArgs,

        /// Detection strategy
        #[arg(long, value_enum, default_value = "dfs")]
        strategy: Strategy,

        /// Anchor-side selectivity hint (anchor strategy only)
        #[arg(long, default_value_t = 1.0)]
        selectivity: f64,

        /// Expansion bound in hops, 0 = unbounded (anchor strategy only)
        #[arg(long, default_value_t = 0)]
        iterations: usize,

        /// Count matches without materializing them
        #[arg(long)]
        count_only: bool,

        /// Print the result as one JSON object instead of plain text
        #[arg(long)]
        json: bool,

        /// Export the graph before detection
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Build the graph and export it as flat files
    Dump {
        #[command(flatten)]
        graph: GraphArgs,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn build_graph(args: &GraphArgs, dump_dir: Option<PathBuf>) -> Result<Graph> {
    let events = trendgraph_engine::event_file::load_events(&args.events)
        .with_context(|| format!("loading {}", args.events.display()))?;

    let mut specs = Vec::new();
    for d in &args.dimensions {
        specs.push(parse_dimension(d, false)?);
    }
    for d in &args.range_dimensions {
        specs.push(parse_dimension(d, true)?);
    }
    if specs.is_empty() {
        bail!("at least one --dimension or --range-dimension is required");
    }

    let schema = build_schema(&specs);
    let predicates = args
        .predicates
        .iter()
        .map(|p| parse_predicate(p))
        .collect::<Result<Vec<_>>>()?;
    let query = build_query(predicates, args.start, args.end, args.link)?;

    let constructors: Vec<Constructor> = specs
        .iter()
        .map(|spec| match spec {
            DimensionSpec::Exact { tag, .. } => {
                Constructor::StaticEq(StaticEqConstructor::new(*tag))
            }
            DimensionSpec::Range { tag, .. } => {
                Constructor::DynamicRange(DynamicRangeConstructor::new(*tag))
            }
        })
        .collect();

    let mut config = match args.parallelism {
        Some(p) => GraphConfig::with_parallelism(p),
        None => GraphConfig::default(),
    };
    config.dump_dir = dump_dir;

    let mut graph = Graph::new(events, schema, query, constructors, config)?;
    let stats = graph.construct()?;
    info!(
        events = stats.events,
        attrs = stats.attrs,
        from_edges = stats.from_edges,
        to_edges = stats.to_edges,
        "graph constructed"
    );
    Ok(graph)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Detect {
            graph: graph_args,
            strategy,
            selectivity,
            iterations,
            count_only,
            json,
            dump_dir,
        } => {
            // export failure is isolated inside construct; detection still runs
            let graph = build_graph(&graph_args, dump_dir)?;

            let mode = if count_only {
                OutputMode::CountOnly
            } else {
                OutputMode::Materialize
            };
            let detector = match strategy {
                Strategy::Dfs => Detector::Dfs(DfsDetector::new(mode)),
                Strategy::Anchor => Detector::Anchor(
                    AnchorDetector::new(mode)
                        .with_selectivity(selectivity)
                        .with_iteration_bound(iterations),
                ),
            };

            let detection = detector.detect(&graph)?;
            if json {
                let trends: Vec<Vec<i64>> =
                    detection.trends.iter().map(|t| t.timestamps()).collect();
                let out = serde_json::json!({
                    "matches": detection.count,
                    "trends": trends,
                });
                println!("{out}");
            } else {
                for trend in &detection.trends {
                    println!("{trend}");
                }
                println!("matches: {}", detection.count);
            }
        }
        Commands::Dump { graph: graph_args, out } => {
            let graph = build_graph(&graph_args, None)?;
            dump_graph(&graph, &out)?;
            println!("dumped to {}", out.display());
        }
    }
    Ok(())
}
