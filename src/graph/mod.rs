// src/graph/mod.rs
// =============================================================================
// This module builds the interaction graph from feed records.
//
// Submodules:
// - flatten: Nested JSON -> flat "a.b.c" attribute maps
// - record: Splits a record into sender, receivers and edge details
// - accumulator: The graph itself and the ingest() fold
// =============================================================================

mod accumulator;
mod flatten;
mod record;

pub use accumulator::{DiMultiGraph, EdgeView, GraphAccumulator, Node};
pub use flatten::{flatten, scalar_text, Attributes};
pub use record::{Interaction, Party, RecordError, EMAIL_ID, IMESSAGE_ID, PHONE_ID};
