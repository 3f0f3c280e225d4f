// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag has a default, so running `feedgraph` with no arguments starts
// a full-size harvest against the public feed and writes out.csv/out.gexf.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct definition
// - From-style conversions: the Cli turns itself into the config structs the
//   rest of the program uses
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use feedgraph::feed::{ClientConfig, QueryParams};
use feedgraph::harvest::MalformedPolicy;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "feedgraph",
    version,
    about = "Harvest a public activity feed into an interaction graph",
    long_about = "feedgraph pages through a public transaction feed, politely rate-limited, \
                  and folds every transaction into a directed graph of who paid whom. \
                  The raw records are written as CSV and the graph as GEXF."
)]
pub struct Cli {
    /// Maximum number of records to pull from the feed
    ///
    /// At the default request rate, 100000 records take roughly 16-17 hours
    #[arg(long, default_value_t = 100_000)]
    pub limit: usize,

    /// API root; requests go to {base-url}/public
    #[arg(long, default_value = "https://venmo.com/api/v5")]
    pub base_url: String,

    /// Minimum number of seconds between two requests
    #[arg(long, default_value_t = 30)]
    pub request_rate: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Only fetch records after this point (passed through to the API)
    #[arg(long)]
    pub since: Option<String>,

    /// Only fetch records before this point (passed through to the API)
    #[arg(long)]
    pub until: Option<String>,

    /// Where to write the harvested records
    #[arg(long, default_value = "out.csv")]
    pub records_out: PathBuf,

    /// Where to write the graph
    #[arg(long, default_value = "out.gexf")]
    pub graph_out: PathBuf,

    /// Stop the harvest on the first malformed record instead of skipping it
    #[arg(long)]
    pub abort_on_malformed: bool,

    /// Print the final summary as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_rate: Duration::from_secs(self.request_rate),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    // Extra parameters for the very first request
    pub fn seed_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(since) = &self.since {
            params.insert("since".to_string(), since.clone());
        }
        if let Some(until) = &self.until {
            params.insert("until".to_string(), until.clone());
        }
        params
    }

    pub fn malformed_policy(&self) -> MalformedPolicy {
        if self.abort_on_malformed {
            MalformedPolicy::Abort
        } else {
            MalformedPolicy::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["feedgraph"]);
        assert_eq!(cli.limit, 100_000);
        assert_eq!(cli.records_out, PathBuf::from("out.csv"));
        assert_eq!(cli.graph_out, PathBuf::from("out.gexf"));
        assert_eq!(cli.malformed_policy(), MalformedPolicy::Skip);
        assert!(cli.seed_params().is_empty());

        let config = cli.client_config();
        assert_eq!(config.request_rate, Duration::from_secs(30));
        assert_eq!(config.base_url, "https://venmo.com/api/v5");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "feedgraph",
            "--limit",
            "10",
            "--since",
            "100",
            "--request-rate",
            "5",
            "--abort-on-malformed",
        ]);
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.seed_params().get("since").map(String::as_str), Some("100"));
        assert!(!cli.seed_params().contains_key("until"));
        assert_eq!(cli.client_config().request_rate, Duration::from_secs(5));
        assert_eq!(cli.malformed_policy(), MalformedPolicy::Abort);
    }
}
