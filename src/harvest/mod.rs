// src/harvest/mod.rs
// =============================================================================
// This module runs a harvest: feed in, graph and record list out.
//
// Submodules:
// - driver: The bounded pull loop and its outcome types
// - progress: Observer for count/total progress updates
// =============================================================================

mod driver;
mod progress;

pub use driver::{Harvest, HarvestDriver, MalformedPolicy, StopReason};
pub use progress::{LogProgress, NoProgress, Progress};
