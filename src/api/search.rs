//! Content search: hit probes and paginated fetches

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ApiClient, ApiResult};
use crate::processor::config::{SEARCH_PAGE_SIZE, SEARCH_RESULT_WINDOW};
use crate::range::DateRange;

/// Search endpoint path
pub const SEARCH_PATH: &str = "/content/v4/search";

/// Fields always requested for wire stories
pub const WIRE_DEFAULT_FIELDS: &[&str] = &[
    "_id",
    "source.name",
    "created_date",
    "revision.published",
    "additional_properties.has_published_copy",
];

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Total hits for the query
    #[serde(default)]
    pub count: u64,
    /// Documents on this page
    #[serde(default)]
    pub content_elements: Vec<Value>,
}

/// `created_date:[start TO end]`
pub fn created_date_clause(range: &DateRange) -> String {
    format!(
        "created_date:[{} TO {}]",
        range.start_str(),
        range.end_str()
    )
}

/// Query matching redirects, optionally within a creation window
pub fn redirect_query(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!("type:redirect AND {}", created_date_clause(range)),
        None => "type:redirect".to_string(),
    }
}

/// Query matching unpublished wire stories
///
/// `extra_filters` is inserted verbatim after the published clause, so it normally
/// starts with an operator (`AND source.name:Reuters`).
pub fn wire_query(extra_filters: &str, range: Option<&DateRange>) -> String {
    let mut query = String::from("type:story AND revision.published:false");
    let extra = extra_filters.trim();
    if !extra.is_empty() {
        query.push(' ');
        query.push_str(extra);
    }
    query.push_str(" AND source.source_type:wires");
    if let Some(range) = range {
        query.push_str(" AND ");
        query.push_str(&created_date_clause(range));
    }
    query
}

/// `_sourceInclude` value for wire reports: defaults then extras, without duplicates
pub fn wire_source_include(extra_fields: &[String]) -> String {
    let mut fields: Vec<&str> = WIRE_DEFAULT_FIELDS.to_vec();
    for field in extra_fields {
        let field = field.trim();
        if !field.is_empty() && !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields.join(",")
}

/// Search client scoped to one website
#[derive(Debug, Clone)]
pub struct ContentSearch {
    client: Arc<ApiClient>,
    website: String,
}

impl ContentSearch {
    /// Create a search client for `website`
    pub fn new(client: Arc<ApiClient>, website: impl Into<String>) -> Self {
        Self {
            client,
            website: website.into(),
        }
    }

    /// Website every query is scoped to
    pub fn website(&self) -> &str {
        &self.website
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Count-only query (`size=1`)
    pub fn total_hits(&self, query: &str) -> ApiResult<u64> {
        let params = [
            ("website", self.website.clone()),
            ("track_total_hits", "true".to_string()),
            ("q", query.to_string()),
            ("size", "1".to_string()),
            ("from", "0".to_string()),
        ];
        let page: SearchPage = self.client.get_json(SEARCH_PATH, &params)?;
        debug!(query, count = page.count, "Probe complete");
        Ok(page.count)
    }

    /// Fetch one page starting at `from`
    pub fn page(&self, query: &str, source_include: Option<&str>, from: u64) -> ApiResult<SearchPage> {
        let mut params = vec![
            ("website", self.website.clone()),
            ("track_total_hits", "true".to_string()),
            ("q", query.to_string()),
            ("size", SEARCH_PAGE_SIZE.to_string()),
            ("from", from.to_string()),
        ];
        if let Some(fields) = source_include {
            params.push(("_sourceInclude", fields.to_string()));
        }
        self.client.get_json(SEARCH_PATH, &params)
    }

    /// Fetch every document the query addresses, page by page
    ///
    /// Stops on an empty page, when the offset reaches the reported count, or when the
    /// next offset would leave the result window. A failure on the first page is
    /// returned; a failure on a later page ends pagination and keeps what was fetched.
    pub fn fetch_all(&self, query: &str, source_include: Option<&str>) -> ApiResult<Vec<Value>> {
        let mut documents = Vec::new();
        let mut from = 0u64;

        loop {
            let page = match self.page(query, source_include, from) {
                Ok(page) => page,
                Err(e) if from == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        query,
                        from,
                        fetched = documents.len(),
                        error = %e,
                        "Page fetch failed, keeping documents fetched so far"
                    );
                    break;
                }
            };

            if page.content_elements.is_empty() {
                debug!(from, "Empty page, pagination complete");
                break;
            }

            documents.extend(page.content_elements);
            from += SEARCH_PAGE_SIZE;

            if from >= page.count || from >= SEARCH_RESULT_WINDOW {
                debug!(from, count = page.count, "Reached end of results");
                break;
            }
        }

        info!(
            website = %self.website,
            documents = documents.len(),
            "Fetched search results"
        );
        Ok(documents)
    }
}
