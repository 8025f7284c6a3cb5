//! CSV inputs for cleanup commands

use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use super::{CleanupError, CleanupResult};
use crate::output::preserved_sibling;

/// One redirect to delete
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RedirectTarget {
    /// Redirect path as stored (`/old/path`)
    pub url: String,
    /// Website the redirect belongs to
    pub website: String,
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.website, self.url)
    }
}

fn open_headerless(path: &Path) -> CleanupResult<csv::Reader<File>> {
    if !path.is_file() {
        return Err(CleanupError::InputError(format!(
            "Path {} is not to a valid file",
            path.display()
        )));
    }
    let file = File::open(path).map_err(|e| CleanupError::InputError(e.to_string()))?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file))
}

/// `url,website` rows, no header
pub fn read_redirect_targets(path: &Path) -> CleanupResult<Vec<RedirectTarget>> {
    let mut reader = open_headerless(path)?;
    let mut targets = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CleanupError::InputError(e.to_string()))?;
        match (record.get(0), record.get(1)) {
            (Some(url), Some(website)) if !url.trim().is_empty() && !website.trim().is_empty() => {
                targets.push(RedirectTarget {
                    url: url.trim().to_string(),
                    website: website.trim().to_string(),
                });
            }
            _ => warn!(line = line + 1, "Skipping redirect row without url and website"),
        }
    }

    info!(count = targets.len(), path = %path.display(), "Loaded redirects from CSV");
    Ok(targets)
}

/// First column of every row, no header
pub fn read_ids(path: &Path) -> CleanupResult<Vec<String>> {
    let mut reader = open_headerless(path)?;
    let mut ids = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| CleanupError::InputError(e.to_string()))?;
        if let Some(id) = record.get(0).map(str::trim).filter(|id| !id.is_empty()) {
            ids.push(id.to_string());
        }
    }

    info!(count = ids.len(), path = %path.display(), "Loaded ids from CSV");
    Ok(ids)
}

/// `ans_id` column of a preserved-photos file
pub fn read_preserved_ids(path: &Path) -> CleanupResult<HashSet<String>> {
    let file = File::open(path).map_err(|e| CleanupError::InputError(e.to_string()))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| CleanupError::InputError(e.to_string()))?
        .clone();
    let column = headers
        .iter()
        .position(|h| h == "ans_id")
        .ok_or_else(|| CleanupError::InputError(format!("{} has no ans_id column", path.display())))?;

    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| CleanupError::InputError(e.to_string()))?;
        if let Some(id) = record.get(column).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Preserved ids belonging to a `photo_ids_to_delete_` input, empty when there are none
///
/// An unreadable preserved file is logged and treated as empty.
pub fn preserved_ids_for(to_delete: &Path) -> HashSet<String> {
    let Some(sibling) = preserved_sibling(to_delete) else {
        warn!(path = %to_delete.display(), "Could not determine preserved CSV path from filename");
        return HashSet::new();
    };
    if !sibling.is_file() {
        info!(path = %sibling.display(), "Preserved photo ids file not found");
        return HashSet::new();
    }

    match read_preserved_ids(&sibling) {
        Ok(ids) => {
            info!(count = ids.len(), path = %sibling.display(), "Loaded preserved photo ids");
            ids
        }
        Err(e) => {
            warn!(path = %sibling.display(), error = %e, "Could not read preserved photo ids");
            HashSet::new()
        }
    }
}

/// Split `ids` into `(to_process, skipped)` by membership in `preserved`
pub fn filter_preserved(ids: Vec<String>, preserved: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    ids.into_iter().partition(|id| !preserved.contains(id))
}
