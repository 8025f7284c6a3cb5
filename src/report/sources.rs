//! Search-backed report sources

use tracing::{debug, warn};

use super::record::{RedirectRow, WireRow};
use super::ReportSource;
use crate::api::search::{redirect_query, wire_query, wire_source_include};
use crate::api::{ApiResult, ArcEnvironment, ContentSearch};
use crate::range::DateRange;

/// Redirect documents of one website
#[derive(Debug, Clone)]
pub struct RedirectReport {
    search: ContentSearch,
    environment: ArcEnvironment,
}

impl RedirectReport {
    /// Report over `search`'s website
    pub fn new(search: ContentSearch, environment: ArcEnvironment) -> Self {
        Self { search, environment }
    }
}

impl ReportSource for RedirectReport {
    type Row = RedirectRow;

    fn name(&self) -> &str {
        "redirects"
    }

    fn website(&self) -> &str {
        self.search.website()
    }

    fn probe(&self, range: &DateRange) -> ApiResult<u64> {
        self.search.total_hits(&redirect_query(Some(range)))
    }

    fn fetch(&self, range: Option<&DateRange>) -> ApiResult<Vec<RedirectRow>> {
        let documents = self.search.fetch_all(&redirect_query(range), None)?;
        let rows: Vec<RedirectRow> = documents
            .iter()
            .filter_map(|doc| {
                let row = RedirectRow::from_document(doc, self.search.website(), self.environment);
                if row.is_none() {
                    warn!("Skipping redirect document without _id");
                }
                row
            })
            .collect();
        debug!(range = ?range.map(|r| r.to_string()), rows = rows.len(), "Fetched redirects");
        Ok(rows)
    }
}

/// Unpublished wire stories of one website
#[derive(Debug, Clone)]
pub struct WireReport {
    search: ContentSearch,
    environment: ArcEnvironment,
    extra_filters: String,
    extra_fields: Vec<String>,
    source_include: String,
}

impl WireReport {
    /// Report over `search`'s website
    pub fn new(search: ContentSearch, environment: ArcEnvironment) -> Self {
        Self {
            search,
            environment,
            extra_filters: String::new(),
            extra_fields: Vec::new(),
            source_include: wire_source_include(&[]),
        }
    }

    /// Query clause appended after the published filter (`AND source.name:AP`)
    pub fn with_extra_filters(mut self, filters: impl Into<String>) -> Self {
        self.extra_filters = filters.into();
        self
    }

    /// Extra dotted-path fields to request and export
    pub fn with_extra_fields(mut self, fields: Vec<String>) -> Self {
        let mut extra: Vec<String> = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.trim().to_string();
            if !field.is_empty() && !extra.contains(&field) {
                extra.push(field);
            }
        }
        self.source_include = wire_source_include(&extra);
        self.extra_fields = extra;
        self
    }

    /// Extra query filters
    pub fn extra_filters(&self) -> &str {
        &self.extra_filters
    }
}

impl ReportSource for WireReport {
    type Row = WireRow;

    fn name(&self) -> &str {
        "wires"
    }

    fn website(&self) -> &str {
        self.search.website()
    }

    // The probe carries the same filters as the fetch so splits follow the real hit count.
    fn probe(&self, range: &DateRange) -> ApiResult<u64> {
        self.search
            .total_hits(&wire_query(&self.extra_filters, Some(range)))
    }

    fn fetch(&self, range: Option<&DateRange>) -> ApiResult<Vec<WireRow>> {
        let query = wire_query(&self.extra_filters, range);
        let documents = self.search.fetch_all(&query, Some(&self.source_include))?;
        Ok(documents
            .iter()
            .filter_map(|doc| {
                WireRow::from_document(
                    doc,
                    self.search.website(),
                    self.environment,
                    &self.extra_fields,
                )
            })
            .collect())
    }
}
