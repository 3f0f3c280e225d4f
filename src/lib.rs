// src/lib.rs
// =============================================================================
// feedgraph: harvest a paginated public activity feed into a directed graph.
//
// Modules:
// - feed: Rate-limited HTTP client, pagination cursor, record iterator
// - graph: Record parsing, attribute flattening, the multigraph itself
// - harvest: The bounded pull loop tying feed and graph together
// - export: CSV and GEXF writers for the results
// =============================================================================

pub mod export;
pub mod feed;
pub mod graph;
pub mod harvest;
