// src/feed/cursor.rs
// =============================================================================
// This module tracks where we are in the paginated feed.
//
// How it works:
// 1. We start on the first page with parameters {limit: 50}
// 2. After each page, the API hands us a `paging.next` URL
// 3. The query string of that URL becomes the parameters for the next call
//    (we only re-pin `limit` to 50; the rest is the API's opaque cursor)
// 4. When a page has no next link, the cursor is exhausted for good
//
// States:
//
//   FirstPage --(page 1)--> FirstPage
//   FirstPage / Continuing --(next link)--> Continuing
//   FirstPage / Continuing --(no link)--> Exhausted   (terminal)
// =============================================================================

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::page::{Page, QueryParams};

// Page size we always ask for
pub const PAGE_LIMIT: u32 = 50;

// Relative `next` links are resolved against this before we read the query.
// Only the query component is used, so the host never matters.
const PLACEHOLDER_BASE: &str = "http://placeholder.invalid/";

/// Where the cursor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    /// Nothing parsed yet, still using the initial parameters
    FirstPage,
    /// Parameters came from the previous page's `paging.next`
    Continuing,
    /// No more pages; terminal
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct PageCursor {
    state: CursorState,
    params: QueryParams,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    // Starts at the first page with {limit: 50}
    pub fn new() -> Self {
        Self::with_params(QueryParams::new())
    }

    // Starts at the first page with extra seed parameters (e.g. since/until).
    // `limit` is always forced to 50.
    pub fn with_params(mut params: QueryParams) -> Self {
        params.insert("limit".to_string(), PAGE_LIMIT.to_string());
        Self {
            state: CursorState::FirstPage,
            params,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    // Derives the parameters for the fetch that is about to happen.
    //
    // `page_count` is the counter *after* it was incremented for this fetch,
    // so 1 means "the very first request". That first call keeps the initial
    // parameters no matter what `previous` holds.
    pub fn advance(&mut self, page_count: u64, previous: Option<&Page>) {
        if self.is_exhausted() || page_count == 1 {
            return;
        }

        let next = match previous.and_then(Page::next_link) {
            Some(next) => next,
            None => {
                debug!(page_count, "no next link, feed exhausted");
                self.state = CursorState::Exhausted;
                return;
            }
        };

        match params_from_link(next) {
            Some(params) => {
                self.params = params;
                self.state = CursorState::Continuing;
            }
            None => {
                warn!(link = next, "could not parse next link, treating feed as exhausted");
                self.state = CursorState::Exhausted;
            }
        }
    }
}

// Turns `https://host/public?before=9&limit=20` into {before: 9, limit: 50}.
//
// Pairs with an empty value are dropped and a repeated key keeps its last
// value.
fn params_from_link(link: &str) -> Option<QueryParams> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PLACEHOLDER_BASE).ok()?.join(link).ok()?
        }
        Err(_) => return None,
    };

    let mut params: QueryParams = url
        .query_pairs()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    params.insert("limit".to_string(), PAGE_LIMIT.to_string());
    Some(params)
}
