//! Argument value parsers and cross-flag checks
//!
//! Everything here runs before the first remote call, so a bad flag never leaves a
//! half-finished run behind.

use std::path::{Path, PathBuf};

use super::CliError;
use crate::processor::config::MAX_WORKERS;
use crate::range::{parse_timestamp, DateRange};

/// Parse and validate a worker count (1..=MAX_WORKERS)
pub fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("worker count must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!(
            "worker count {value} exceeds maximum of {MAX_WORKERS}"
        ));
    }
    Ok(value)
}

/// Parse a strictly positive integer (batch sizes, rates)
pub fn parse_positive(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

/// Parse a date or datetime flag, keeping the original text for file names
pub fn parse_date_arg(s: &str) -> Result<String, String> {
    parse_timestamp(s).map_err(|e| e.to_string())?;
    Ok(s.trim().to_string())
}

/// Parse an epoch-milliseconds flag
pub fn parse_epoch_ms(s: &str) -> Result<i64, String> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid epoch timestamp in milliseconds"))?;
    if value < 0 {
        return Err("epoch timestamp must not be negative".to_string());
    }
    Ok(value)
}

/// Combine optional start and end flags into a window
///
/// Both or neither must be given.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<DateRange>, CliError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(DateRange::parse(start, end)?)),
        (None, None) => Ok(None),
        _ => Err(CliError::InvalidArgument(
            "--start-date and --end-date must be given together".to_string(),
        )),
    }
}

/// Same as [`resolve_window`] for epoch-millisecond bounds
pub fn resolve_epoch_window(
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Option<(i64, i64)>, CliError> {
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(Some((start, end))),
        (Some(start), Some(end)) => Err(CliError::InvalidArgument(format!(
            "start date {start} must be before end date {end}"
        ))),
        (None, None) => Ok(None),
        _ => Err(CliError::InvalidArgument(
            "--start-date and --end-date must be given together".to_string(),
        )),
    }
}

/// Exactly one of a single item and an input file
pub fn single_or_file<'a, T>(
    single: Option<T>,
    file: Option<&'a PathBuf>,
    single_flag: &str,
    file_flag: &str,
) -> Result<Source<'a, T>, CliError> {
    match (single, file) {
        (Some(item), None) => Ok(Source::Single(item)),
        (None, Some(path)) => {
            if !path.is_file() {
                return Err(CliError::InvalidArgument(format!(
                    "input file {} does not exist",
                    path.display()
                )));
            }
            Ok(Source::File(path.as_path()))
        }
        (Some(_), Some(_)) => Err(CliError::InvalidArgument(format!(
            "{single_flag} and {file_flag} are mutually exclusive"
        ))),
        (None, None) => Err(CliError::InvalidArgument(format!(
            "one of {single_flag} or {file_flag} is required"
        ))),
    }
}

/// Where the items of a cleanup run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<'a, T> {
    /// One item given on the command line
    Single(T),
    /// A CSV input file
    File(&'a Path),
}
