// src/harvest/driver.rs
// =============================================================================
// This module drives a harvest from start to finish.
//
// How it works:
// 1. Pull records from the FeedIterator until `limit` records were pulled,
//    the feed ends, or a fetch fails
// 2. Fold each record into the graph and keep it for the tabular export
// 3. Report progress after every record
//
// A harvest that stops early is not thrown away. Whatever was ingested before
// the failure stays in the graph and in the record list, and the caller gets
// both together with the reason the loop stopped.
// =============================================================================

use serde::Serialize;
use tracing::{error, info, warn};

use super::progress::{LogProgress, Progress};
use crate::feed::{FeedIterator, FeedSource, IterError, Record};
use crate::graph::{DiMultiGraph, GraphAccumulator, RecordError};

// What to do with a record that cannot be turned into nodes and edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log it, count it, keep going
    #[default]
    Skip,
    /// Stop the harvest
    Abort,
}

/// Why the pull loop stopped.
#[derive(Debug)]
pub enum StopReason {
    /// The feed ran out of pages or data
    Exhausted,
    /// `limit` records were pulled
    LimitReached,
    /// A page fetch failed
    Failed(IterError),
    /// A malformed record was hit under MalformedPolicy::Abort
    Malformed(RecordError),
}

impl StopReason {
    // True when the harvest ended the way it was supposed to
    pub fn is_complete(&self) -> bool {
        matches!(self, StopReason::Exhausted | StopReason::LimitReached)
    }
}

/// Result of one harvest run, complete or partial.
#[derive(Debug)]
pub struct Harvest {
    /// Records that made it into the graph, in feed order
    pub records: Vec<Record>,
    /// Records pulled from the feed (ingested + skipped)
    pub pulled: usize,
    /// Malformed records that were skipped
    pub skipped: usize,
    pub stop: StopReason,
}

pub struct HarvestDriver<P = LogProgress> {
    accumulator: GraphAccumulator,
    policy: MalformedPolicy,
    progress: P,
}

impl HarvestDriver<LogProgress> {
    pub fn new(policy: MalformedPolicy) -> Self {
        Self::with_progress(policy, LogProgress::default())
    }
}

impl<P: Progress> HarvestDriver<P> {
    pub fn with_progress(policy: MalformedPolicy, progress: P) -> Self {
        Self {
            accumulator: GraphAccumulator::new(),
            policy,
            progress,
        }
    }

    pub fn graph(&self) -> &DiMultiGraph {
        self.accumulator.graph()
    }

    pub fn into_graph(self) -> DiMultiGraph {
        self.accumulator.into_graph()
    }

    // Pulls at most `limit` records from `feed` and folds them into the graph
    pub async fn run<S: FeedSource>(&mut self, feed: &mut FeedIterator<S>, limit: usize) -> Harvest {
        let mut records = Vec::new();
        let mut pulled = 0;
        let mut skipped = 0;

        let stop = loop {
            if pulled >= limit {
                break StopReason::LimitReached;
            }

            let record = match feed.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break StopReason::Exhausted,
                Err(e) => {
                    error!(error = %e, ingested = records.len(), "harvest stopped early");
                    break StopReason::Failed(e);
                }
            };
            pulled += 1;

            match self.accumulator.ingest(&record) {
                Ok(()) => records.push(record),
                Err(e) => match self.policy {
                    MalformedPolicy::Skip => {
                        warn!(error = %e, position = pulled, "skipping malformed record");
                        skipped += 1;
                    }
                    MalformedPolicy::Abort => {
                        error!(error = %e, position = pulled, "malformed record, aborting harvest");
                        break StopReason::Malformed(e);
                    }
                },
            }

            self.progress.advance(pulled, limit);
        };

        self.progress.finish(pulled, limit);
        info!(
            pulled,
            ingested = records.len(),
            skipped,
            nodes = self.graph().node_count(),
            edges = self.graph().edge_count(),
            "harvest finished"
        );

        Harvest {
            records,
            pulled,
            skipped,
            stop,
        }
    }
}
