// src/feed/mod.rs
// =============================================================================
// This module contains everything needed to read the public feed.
//
// Submodules:
// - rate: Keeps consecutive requests at least N seconds apart
// - page: Wire types (Page, Paging, Record) and query parameters
// - client: One HTTP request per page, typed failures
// - cursor: Pagination state machine driven by `paging.next`
// - iter: Composes the above into a sequence of individual records
// - testing: Scripted FeedSource for tests
// =============================================================================

mod client;
mod cursor;
mod iter;
mod page;
mod rate;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientConfig, ClientError, FeedError, FeedSource, HttpFeedClient};
pub use cursor::{CursorState, PageCursor, PAGE_LIMIT};
pub use iter::{CursorSnapshot, FeedIterator, IterError};
pub use page::{Page, Paging, QueryParams, Record};
pub use rate::{Clock, RateLimiter, TokioClock};
