// src/feed/iter.rs
// =============================================================================
// This module turns a paginated feed into a flat sequence of records.
//
// Each time the buffer runs dry we "pull" a new page:
// 1. Bump the page counter
// 2. Let the cursor derive parameters from the previous page
// 3. If the cursor is exhausted, the sequence ends
// 4. Otherwise fetch the page; a transport failure ends the sequence with an
//    error that carries a snapshot of where we were
// 5. An absent or empty `data` field also ends the sequence (normally)
// 6. Otherwise the page's records are handed out one at a time
//
// next_record() distinguishes the two ways a sequence can end:
//   Ok(None)  -> exhausted, nothing went wrong
//   Err(e)    -> transport failure
//
// Pages are fetched strictly one after another; there is never more than one
// request in flight.
// =============================================================================

use futures::stream::{self, Stream};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info};

use super::client::{FeedError, FeedSource};
use super::cursor::{CursorState, PageCursor};
use super::page::{Page, QueryParams, Record};

/// Iterator state captured when a fetch fails, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CursorSnapshot {
    pub page_count: u64,
    pub state: CursorState,
    pub params: QueryParams,
}

impl fmt::Display for CursorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} with params {:?}", self.page_count, self.params)
    }
}

// A fetch failed mid-harvest
#[derive(Debug, Error)]
#[error("feed iteration failed at {snapshot}: {cause}")]
pub struct IterError {
    #[source]
    pub cause: FeedError,
    pub snapshot: CursorSnapshot,
}

pub struct FeedIterator<S> {
    source: S,
    cursor: PageCursor,
    page_count: u64,
    previous: Option<Page>,
    buffer: VecDeque<Record>,
    finished: bool,
}

impl<S: FeedSource> FeedIterator<S> {
    pub fn new(source: S) -> Self {
        Self::with_cursor(source, PageCursor::new())
    }

    pub fn with_cursor(source: S, cursor: PageCursor) -> Self {
        Self {
            source,
            cursor,
            page_count: 0,
            previous: None,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            page_count: self.page_count,
            state: self.cursor.state(),
            params: self.cursor.params().clone(),
        }
    }

    // Returns the next record, pulling a new page when the buffer is empty.
    //
    // Once the sequence has ended (either way) every further call returns
    // Ok(None) without touching the source.
    pub async fn next_record(&mut self) -> Result<Option<Record>, IterError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }
            self.pull_page().await?;
        }
    }

    // Fetches the next page into the buffer, or marks the sequence finished
    async fn pull_page(&mut self) -> Result<(), IterError> {
        self.page_count += 1;
        self.cursor.advance(self.page_count, self.previous.as_ref());

        if self.cursor.is_exhausted() {
            info!(pages = self.page_count - 1, "feed has no more pages");
            self.finished = true;
            return Ok(());
        }

        let mut page = match self.source.fetch(self.cursor.params()).await {
            Ok(page) => page,
            Err(cause) => {
                self.finished = true;
                let snapshot = self.snapshot();
                error!(%cause, page_count = snapshot.page_count, "page fetch failed");
                return Err(IterError { cause, snapshot });
            }
        };

        let data = page.data.take().unwrap_or_default();
        if data.is_empty() {
            info!(page_count = self.page_count, "page carried no data, feed finished");
            self.finished = true;
            return Ok(());
        }

        debug!(page_count = self.page_count, records = data.len(), "page fetched");
        self.buffer.extend(data);
        self.previous = Some(page);
        Ok(())
    }

    // Adapts the iterator into a Stream of records.
    //
    // The stream yields Err at most once, as its final item.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record, IterError>> {
        stream::unfold(Some(self), |state| async move {
            let mut iter = state?;
            match iter.next_record().await {
                Ok(Some(record)) => Some((Ok(record), Some(iter))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not implement std::iter::Iterator?
//    - Fetching a page is async, and Iterator::next() cannot await
//    - next_record() is the async equivalent; into_stream() gives you a
//      futures::Stream when you want combinators like .take() or .collect()
//
// 2. Why Result<Option<Record>, IterError>?
//    - Ok(Some(r)) = here is a record
//    - Ok(None)    = the feed is done, nothing went wrong
//    - Err(e)      = a request failed; e.snapshot says where
//    - Keeping "done" and "failed" apart means callers never mistake a
//      network error for the end of the feed
//
// 3. What is VecDeque doing here?
//    - It holds the rest of the current page
//    - pop_front() hands records out in the order the API returned them
// -----------------------------------------------------------------------------
