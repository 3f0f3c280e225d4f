// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the rate-limited feed client and the record iterator
// 3. Run the harvest until the limit, the end of the feed, or a failure
// 4. Export whatever was harvested (even after a failure)
// 5. Exit with proper code (0 = complete, 1 = stopped early, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use feedgraph::export;
use feedgraph::feed::{FeedIterator, HttpFeedClient, PageCursor};
use feedgraph::graph::DiMultiGraph;
use feedgraph::harvest::{Harvest, HarvestDriver, StopReason};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = harvest completed
//   Ok(1) = harvest stopped early (partial output was still written)
//   Err   = unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let client = HttpFeedClient::new(&cli.client_config())?;
    info!(
        endpoint = %client.endpoint(),
        limit = cli.limit,
        request_rate = cli.request_rate,
        "starting harvest"
    );

    let mut feed = FeedIterator::with_cursor(client, PageCursor::with_params(cli.seed_params()));
    let mut driver = HarvestDriver::new(cli.malformed_policy());

    let harvest = driver.run(&mut feed, cli.limit).await;
    let graph = driver.into_graph();

    write_outputs(&cli, &harvest, &graph)?;

    let summary = Summary::new(&harvest, &graph, feed.page_count());
    print_summary(&summary, &cli, cli.json)?;

    if harvest.stop.is_complete() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Writes the record table and the graph file
fn write_outputs(cli: &Cli, harvest: &Harvest, graph: &DiMultiGraph) -> Result<()> {
    let mut records_out = create(&cli.records_out)?;
    export::write_records(&mut records_out, &harvest.records)
        .with_context(|| format!("writing {}", cli.records_out.display()))?;

    let mut graph_out = create(&cli.graph_out)?;
    export::write_graph(&mut graph_out, graph)
        .with_context(|| format!("writing {}", cli.graph_out.display()))?;

    info!(
        records = %cli.records_out.display(),
        graph = %cli.graph_out.display(),
        "exports written"
    );
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

// What we tell the user at the end of a run
#[derive(Debug, Serialize)]
struct Summary {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    pages: u64,
    records: usize,
    skipped: usize,
    nodes: usize,
    edges: usize,
}

impl Summary {
    fn new(harvest: &Harvest, graph: &DiMultiGraph, pages: u64) -> Self {
        let (status, error) = match &harvest.stop {
            StopReason::Exhausted => ("exhausted", None),
            StopReason::LimitReached => ("limit_reached", None),
            StopReason::Failed(e) => ("failed", Some(e.to_string())),
            StopReason::Malformed(e) => ("malformed", Some(e.to_string())),
        };

        Self {
            status,
            error,
            pages,
            records: harvest.records.len(),
            skipped: harvest.skipped,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
        }
    }
}

fn print_summary(summary: &Summary, cli: &Cli, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("📊 Summary:");
    println!("   Status:  {}", summary.status);
    if let Some(error) = &summary.error {
        println!("   ❌ Stopped early: {}", error);
    }
    println!("   📄 Pages: {}", summary.pages);
    println!("   🧾 Records: {} ({} skipped)", summary.records, summary.skipped);
    println!("   🔵 Nodes: {}", summary.nodes);
    println!("   ➡️  Edges: {}", summary.edges);
    println!("   💾 {} / {}", cli.records_out.display(), cli.graph_out.display());
    Ok(())
}
