// src/export/mod.rs
// =============================================================================
// This module writes harvest results to disk.
//
// Submodules:
// - csv: The ingested records as a flat table
// - gexf: The interaction graph as a GEXF file
//
// Both writers take any std::io::Write so tests can render into a Vec<u8>.
// =============================================================================

mod csv;
mod gexf;

pub use csv::write_records;
pub use gexf::write_graph;
