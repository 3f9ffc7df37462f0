//! Trace report
//!
//! Reads an edge-list file (one graph per line, tokens like `AB5`), builds a
//! service graph for each line and prints the answers to the configured
//! query plan.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trace_graph::config::TraceConfig;
use trace_graph::ingest::read_edge_lists;
use trace_graph::report::{render_json, render_text, Report};
use trace_graph::telemetry::init_logging;
use trace_graph::ServiceGraph;

#[derive(Parser, Debug)]
#[command(name = "trace_report", version, about = "Latency trace queries over service graphs")]
struct Args {
    /// Edge-list file, one graph per line
    input: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Log level, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TraceConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => TraceConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    let _guard = init_logging(&config.logging)?;

    let edge_lists = read_edge_lists(&args.input)?;
    tracing::info!(
        input = %args.input.display(),
        graphs = edge_lists.len(),
        queries = config.queries.len(),
        "Processing input"
    );

    let reports = edge_lists
        .iter()
        .enumerate()
        .map(|(idx, edges)| {
            let graph = ServiceGraph::from_edges(edges, &config);
            Report::build(idx + 1, &graph, &config.queries)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if args.json {
        println!("{}", render_json(&reports)?);
    } else {
        print!("{}", render_text(&reports));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
