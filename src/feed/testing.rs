// src/feed/testing.rs
// =============================================================================
// Test helpers shared by the feed and harvest tests.
//
// ScriptedSource is a FeedSource that plays back canned responses instead of
// talking to a server, and remembers the parameters of every request.
// =============================================================================

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;

use super::client::{FeedError, FeedSource};
use super::page::{Page, QueryParams};

pub(crate) struct ScriptedSource {
    responses: VecDeque<Result<Page, FeedError>>,
    pub(crate) requests: Vec<QueryParams>,
}

impl ScriptedSource {
    pub(crate) fn new(responses: Vec<Result<Page, FeedError>>) -> Self {
        Self {
            responses: responses.into(),
            requests: Vec::new(),
        }
    }

    // Every JSON value becomes one successful page
    pub(crate) fn pages(pages: Vec<Value>) -> Self {
        Self::new(
            pages
                .into_iter()
                .map(|p| Ok(serde_json::from_value(p).unwrap()))
                .collect(),
        )
    }
}

impl FeedSource for ScriptedSource {
    fn fetch<'a>(&'a mut self, params: &'a QueryParams) -> BoxFuture<'a, Result<Page, FeedError>> {
        self.requests.push(params.clone());
        let response = self
            .responses
            .pop_front()
            .expect("source fetched more pages than scripted");
        Box::pin(async move { response })
    }
}

pub(crate) fn server_error() -> FeedError {
    FeedError::Status {
        url: "http://test/public".to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}
