//! Flat-file graph export
//!
//! Writes the constructed graph as four newline-delimited files, one per
//! artifact kind: events, attribute buckets, forward (attribute-to-event)
//! edges and backward (event-to-attribute) edges. Export is isolated from
//! the rest of the pipeline: a failed dump never aborts construction or
//! detection.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::DumpError;
use crate::graph::Graph;

const CREATE_DIR_ATTEMPTS: u32 = 3;

/// Export every vertex, bucket and edge of a constructed graph under `dir`.
pub fn dump_graph(graph: &Graph, dir: &Path) -> Result<(), DumpError> {
    create_dir_retry(dir, CREATE_DIR_ATTEMPTS)?;

    let mut events = BufWriter::new(File::create(dir.join("events.txt"))?);
    for vertex in graph.vertices() {
        writeln!(
            events,
            "{} {} {}",
            vertex.id,
            vertex.timestamp(),
            vertex.event.event_type
        )?;
    }
    events.flush()?;

    let mut attrs = BufWriter::new(File::create(dir.join("attributes.txt"))?);
    let mut from_edges = BufWriter::new(File::create(dir.join("edges_from.txt"))?);
    for constructor in graph.constructors() {
        let tag = constructor.tag();
        for (attr_id, attr) in constructor.attributes().iter().enumerate() {
            writeln!(attrs, "{tag}{attr_id} {}", attr.short_string())?;
            for &vid in attr.events() {
                writeln!(from_edges, "{tag}{attr_id} {vid}")?;
            }
        }
    }
    attrs.flush()?;
    from_edges.flush()?;

    let mut to_edges = BufWriter::new(File::create(dir.join("edges_to.txt"))?);
    for vertex in graph.vertices() {
        for constructor in graph.constructors() {
            let tag = constructor.tag();
            for &attr_id in vertex.edges(tag) {
                writeln!(to_edges, "{} {tag}{attr_id}", vertex.id)?;
            }
        }
    }
    to_edges.flush()?;

    info!(dir = %dir.display(), "graph dumped");
    Ok(())
}

fn create_dir_retry(dir: &Path, attempts: u32) -> Result<(), DumpError> {
    let mut last = None;
    for attempt in 1..=attempts {
        match std::fs::create_dir_all(dir) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    dir = %dir.display(),
                    attempt,
                    error = %e,
                    "dump directory creation failed"
                );
                last = Some(e);
                if attempt < attempts {
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }
    }
    Err(DumpError::CreateDir {
        attempts,
        source: last.unwrap_or_else(|| std::io::Error::other("create_dir_all failed")),
    })
}
