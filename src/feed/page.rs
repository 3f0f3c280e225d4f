// src/feed/page.rs
// =============================================================================
// Wire types for the feed API.
//
// A response body looks like:
//
//   {
//     "data":   [ { ...transaction... }, ... ],
//     "paging": { "next": "https://.../public?before=123&limit=50", ... }
//   }
//
// Both fields are optional. Anything else in the body is ignored.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// Query parameters sent with a feed request.
//
// A BTreeMap keeps them sorted so the same parameters always produce the
// same query string (handy in logs and tests).
pub type QueryParams = BTreeMap<String, String>;

/// One page of the feed as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Option<Vec<Record>>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Pagination block of a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    // Returns the `paging.next` link if it is present and non-empty
    pub fn next_link(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// One feed item, kept exactly as the API sent it.
///
/// Records are immutable once fetched; the graph module reads the fields
/// it needs and the tabular export writes the whole thing out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_with_data_and_paging() {
        let page: Page = serde_json::from_value(json!({
            "data": [{"id": 1}, {"id": 2}],
            "paging": {"next": "https://example.com/public?before=9", "previous": "x"}
        }))
        .unwrap();

        assert_eq!(page.data.as_ref().map(Vec::len), Some(2));
        assert_eq!(page.next_link(), Some("https://example.com/public?before=9"));
    }

    #[test]
    fn test_page_without_fields() {
        let page: Page = serde_json::from_value(json!({"extra": true})).unwrap();
        assert!(page.data.is_none());
        assert_eq!(page.next_link(), None);
    }

    #[test]
    fn test_empty_next_is_no_link() {
        let page: Page = serde_json::from_value(json!({"paging": {"next": ""}})).unwrap();
        assert_eq!(page.next_link(), None);

        let page: Page = serde_json::from_value(json!({"paging": {"next": null}})).unwrap();
        assert_eq!(page.next_link(), None);
    }
}
