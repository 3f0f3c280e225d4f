// src/graph/accumulator.rs
// =============================================================================
// Folds feed records into a directed multigraph.
//
// For every record:
// 1. Parse the sender, receivers and edge details (may fail, see RecordError)
// 2. Upsert the sender node with its flattened attributes
// 3. For every receiver: upsert the receiver node, then add one edge
//    sender -> receiver carrying the flattened details
//
// Nodes are deduplicated by id; repeated upserts merge attributes field by
// field (last write wins) and never remove anything. Edges are never merged:
// the same pair seen in two records gives two parallel edges.
//
// Nodes and edges keep insertion order so exports come out the same way
// every time.
// =============================================================================

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::trace;

use super::flatten::{flatten, Attributes};
use super::record::{Interaction, RecordError};
use crate::feed::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub attributes: Attributes,
}

// Borrowed view of one edge with its endpoints resolved to node ids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub attributes: &'a Attributes,
}

// Directed graph with unique node ids and parallel edges allowed.
//
// petgraph's Graph already allows parallel edges; `index` maps node ids to
// their NodeIndex. Nothing is ever removed, so indices stay stable and the
// node/edge storage order is the insertion order.
#[derive(Debug, Clone, Default)]
pub struct DiMultiGraph {
    graph: DiGraph<Node, Attributes>,
    index: HashMap<String, NodeIndex>,
}

impl DiMultiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // Inserts the node or merges `attributes` over the stored ones
    pub fn upsert_node(&mut self, id: &str, attributes: Attributes) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            self.graph[ix].attributes.extend(attributes);
            return ix;
        }
        let ix = self.graph.add_node(Node {
            id: id.to_string(),
            attributes,
        });
        self.index.insert(id.to_string(), ix);
        ix
    }

    // Adds an edge; both endpoints are created (without attributes) if they
    // do not exist yet
    pub fn add_edge(&mut self, source: &str, target: &str, attributes: Attributes) {
        let a = self.upsert_node(source, Attributes::new());
        let b = self.upsert_node(target, Attributes::new());
        self.graph.add_edge(a, b, attributes);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.graph.edge_references().map(move |e| self.view(e.source(), e.target(), e.weight()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // All parallel edges from `source` to `target`. Empty if either node is unknown.
    pub fn edges_between<'a>(&'a self, source: &str, target: &str) -> impl Iterator<Item = EdgeView<'a>> + 'a {
        let ends = self.index.get(source).copied().zip(self.index.get(target).copied());
        ends.into_iter()
            .flat_map(move |(a, b)| self.graph.edges_connecting(a, b))
            .map(move |e| self.view(e.source(), e.target(), e.weight()))
    }

    fn view<'a>(&'a self, source: NodeIndex, target: NodeIndex, attributes: &'a Attributes) -> EdgeView<'a> {
        EdgeView {
            source: &self.graph[source].id,
            target: &self.graph[target].id,
            attributes,
        }
    }
}

// Owns the graph for the duration of a harvest
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    graph: DiMultiGraph,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    // Folds one record into the graph.
    //
    // On error the graph is left exactly as it was.
    pub fn ingest(&mut self, record: &Record) -> Result<(), RecordError> {
        let interaction = Interaction::from_record(record)?;

        let sender_id = interaction.sender.id;
        self.graph
            .upsert_node(&sender_id, flatten(&interaction.sender.attributes));

        let details = flatten(&interaction.details);
        for receiver in interaction.receivers {
            trace!(from = %sender_id, to = %receiver.id, "adding edge");
            self.graph.upsert_node(&receiver.id, flatten(&receiver.attributes));
            self.graph.add_edge(&sender_id, &receiver.id, details.clone());
        }

        Ok(())
    }

    pub fn graph(&self) -> &DiMultiGraph {
        &self.graph
    }

    pub fn into_graph(self) -> DiMultiGraph {
        self.graph
    }
}
