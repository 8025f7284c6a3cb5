//! Report file naming
//!
//! - [`ReportPathBuilder`] names search reports:
//!   `{prefix_}{start}_to_{end}_{website}.csv`, or
//!   `{start}_{end}_{filters}_{website}.csv` when extra query filters were used
//! - [`PhotoReportPaths`] names the photo analysis pair
//!   (`{org}_photo_ids_to_delete_{suffix}` / `{org}_preserved_photo_ids_{suffix}`)

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::OutputError;

/// Marker in photo delete-list filenames
pub const TO_DELETE_MARKER: &str = "photo_ids_to_delete_";

/// Marker in photo preserved-list filenames
pub const PRESERVED_MARKER: &str = "preserved_photo_ids_";

/// Label used in filenames when no date window was given
pub const ALL_DATES_LABEL: &str = "all_dates";

/// Replace every character that is not ASCII alphanumeric, `-` or `.` with `_`
///
/// Keeps user-supplied names (websites, filters) from escaping the report folder.
pub fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.replace("..", "_")
}

/// Builder for search report paths
#[derive(Debug, Clone)]
pub struct ReportPathBuilder {
    root_dir: PathBuf,
    website: String,
    prefix: Option<String>,
    window: Option<(String, String)>,
    filters: Option<String>,
}

impl ReportPathBuilder {
    /// Report for `website` under `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>, website: &str) -> Self {
        Self {
            root_dir: root_dir.into(),
            website: sanitize_component(website),
            prefix: None,
            window: None,
            filters: None,
        }
    }

    /// Filename prefix (ignored when empty)
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim();
        self.prefix = (!prefix.is_empty()).then(|| sanitize_component(prefix));
        self
    }

    /// Date window labels as the user typed them
    pub fn with_window(mut self, start: &str, end: &str) -> Self {
        self.window = Some((sanitize_component(start), sanitize_component(end)));
        self
    }

    /// Extra query filters; every non-alphanumeric character becomes `_`
    pub fn with_filters(mut self, filters: &str) -> Self {
        let filters = filters.trim();
        self.filters = (!filters.is_empty()).then(|| {
            filters
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect()
        });
        self
    }

    /// Filename without directory
    pub fn filename(&self) -> String {
        let (start, end) = match &self.window {
            Some((start, end)) => (start.as_str(), end.as_str()),
            None => (ALL_DATES_LABEL, ALL_DATES_LABEL),
        };
        let date_part = if self.window.is_some() {
            format!("{start}_to_{end}")
        } else {
            ALL_DATES_LABEL.to_string()
        };

        let name = match &self.filters {
            Some(filters) if self.window.is_some() => {
                format!("{start}_{end}_{filters}_{}.csv", self.website)
            }
            Some(filters) => format!("{date_part}_{filters}_{}.csv", self.website),
            None => format!("{date_part}_{}.csv", self.website),
        };

        match &self.prefix {
            Some(prefix) => format!("{prefix}_{name}"),
            None => name,
        }
    }

    /// Full report path
    pub fn build(&self) -> Result<PathBuf, OutputError> {
        if self.website.is_empty() {
            return Err(OutputError::InvalidPath("website must not be empty".to_string()));
        }
        Ok(self.root_dir.join(self.filename()))
    }
}

/// Paths of the two photo analysis outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReportPaths {
    /// Ids safe to delete, one per row, no header
    pub to_delete: PathBuf,
    /// Ids in use, with location columns
    pub preserved: PathBuf,
}

impl PhotoReportPaths {
    /// Build both paths
    ///
    /// The suffix is `{start}-{end}.csv` for an upload window, `{date}.csv` for a single-id
    /// run, else `all_dates.csv`; sandbox runs prefix it with `sandbox_`.
    pub fn new(
        root_dir: &Path,
        org: &str,
        sandbox: bool,
        upload_window: Option<(i64, i64)>,
        single_id_date: Option<NaiveDate>,
    ) -> Self {
        let mut suffix = match (single_id_date, upload_window) {
            (Some(date), _) => format!("{}.csv", date.format("%Y-%m-%d")),
            (None, Some((start, end))) => format!("{start}-{end}.csv"),
            (None, None) => format!("{ALL_DATES_LABEL}.csv"),
        };
        if sandbox {
            suffix = format!("sandbox_{suffix}");
        }
        let org = sanitize_component(org);

        Self {
            to_delete: root_dir.join(format!("{org}_{TO_DELETE_MARKER}{suffix}")),
            preserved: root_dir.join(format!("{org}_{PRESERVED_MARKER}{suffix}")),
        }
    }
}

/// Sibling preserved-list path of a delete-list path, if the name follows the convention
pub fn preserved_sibling(to_delete: &Path) -> Option<PathBuf> {
    let name = to_delete.file_name()?.to_str()?;
    if !name.contains(TO_DELETE_MARKER) {
        return None;
    }
    Some(to_delete.with_file_name(name.replacen(TO_DELETE_MARKER, PRESERVED_MARKER, 1)))
}
