//! Report rows built from search documents

use serde_json::Value;

use crate::api::ArcEnvironment;
use crate::output::CsvRecord;
use crate::status::{CheckStatus, StatusTarget};

/// Value at a dotted path (`source.name`) inside a document
pub fn value_at<'a>(doc: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(doc, |current, key| current.get(key))
}

/// CSV cell for a JSON value: strings verbatim, null/missing empty, anything else as JSON
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn field(doc: &Value, dotted: &str) -> String {
    cell(value_at(doc, dotted))
}

/// One redirect document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRow {
    /// Document id
    pub identifier: String,
    /// Redirect source path
    pub canonical_url: String,
    /// Redirect target
    pub redirect_url: String,
    /// Creation timestamp as returned by the API
    pub created_date: String,
    /// Website searched
    pub website: String,
    /// Environment searched
    pub environment: ArcEnvironment,
    /// Status of `canonical_url`, when checked
    pub status: Option<CheckStatus>,
}

impl RedirectRow {
    /// Build from a search document; `None` without an `_id`
    pub fn from_document(doc: &Value, website: &str, environment: ArcEnvironment) -> Option<Self> {
        let identifier = doc.get("_id")?.as_str()?.to_string();
        Some(Self {
            identifier,
            canonical_url: field(doc, "canonical_url"),
            redirect_url: field(doc, "redirect_url"),
            created_date: field(doc, "created_date"),
            website: website.to_string(),
            environment,
            status: None,
        })
    }
}

impl CsvRecord for RedirectRow {
    fn header(&self) -> Vec<String> {
        [
            "identifier",
            "canonical_url",
            "redirect_url",
            "created_date",
            "website",
            "environment",
            "check_404_or_200",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect()
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.identifier.clone(),
            self.canonical_url.clone(),
            self.redirect_url.clone(),
            self.created_date.clone(),
            self.website.clone(),
            self.environment.to_string(),
            self.status.map(|s| s.to_string()).unwrap_or_default(),
        ]
    }
}

impl StatusTarget for RedirectRow {
    fn status_url(&self) -> Option<&str> {
        (!self.canonical_url.is_empty()).then_some(self.canonical_url.as_str())
    }

    fn set_status(&mut self, status: Option<CheckStatus>) {
        self.status = status;
    }
}

/// One unpublished wire story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRow {
    /// Story id
    pub ans_id: String,
    /// `source.name`
    pub source_name: String,
    /// `source.system`
    pub source_system: String,
    /// `additional_properties.has_published_copy`
    pub published_copy: String,
    /// Creation timestamp as returned by the API
    pub created_date: String,
    /// Website searched
    pub website: String,
    /// Environment searched
    pub environment: ArcEnvironment,
    /// Requested extra fields as `(dotted path, value)`
    pub extra: Vec<(String, String)>,
}

impl WireRow {
    /// Build from a search document; `None` without an `_id`
    pub fn from_document(
        doc: &Value,
        website: &str,
        environment: ArcEnvironment,
        extra_fields: &[String],
    ) -> Option<Self> {
        let ans_id = doc.get("_id")?.as_str()?.to_string();
        Some(Self {
            ans_id,
            source_name: field(doc, "source.name"),
            source_system: field(doc, "source.system"),
            published_copy: field(doc, "additional_properties.has_published_copy"),
            created_date: field(doc, "created_date"),
            website: website.to_string(),
            environment,
            extra: extra_fields
                .iter()
                .map(|path| (path.clone(), field(doc, path)))
                .collect(),
        })
    }
}

impl CsvRecord for WireRow {
    fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = [
            "ans_id",
            "source_name",
            "source_system",
            "published_copy",
            "created_date",
            "website",
            "environment",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        header.extend(self.extra.iter().map(|(path, _)| path.clone()));
        header
    }

    fn values(&self) -> Vec<String> {
        let mut values = vec![
            self.ans_id.clone(),
            self.source_name.clone(),
            self.source_system.clone(),
            self.published_copy.clone(),
            self.created_date.clone(),
            self.website.clone(),
            self.environment.to_string(),
        ];
        values.extend(self.extra.iter().map(|(_, value)| value.clone()));
        values
    }
}

// Wire reports never check URLs.
impl StatusTarget for WireRow {
    fn status_url(&self) -> Option<&str> {
        None
    }

    fn set_status(&mut self, _status: Option<CheckStatus>) {}
}
