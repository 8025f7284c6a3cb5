//! Processing configuration constants

use std::time::Duration;

/// Maximum total hits a single paginated search may address.
/// The search API refuses offsets past this window, so every date range handed to a
/// paginated fetch should probe at or below it.
pub const MAX_RECORDS_PER_RANGE: u64 = 10_000;

/// Default recursion depth for date range bisection.
/// 10 levels yield at most 1,024 leaf ranges, which bounds the probe traffic
/// for pathological windows.
pub const MAX_RECURSION_DEPTH: u32 = 10;

/// Search page size (`size` parameter).
pub const SEARCH_PAGE_SIZE: u64 = 100;

/// Offset ceiling for paginated search (`from` parameter).
pub const SEARCH_RESULT_WINDOW: u64 = 10_000;

/// Photo listing page size (`limit` parameter).
pub const PHOTO_PAGE_SIZE: u64 = 100;

/// Hard stop for photo listing pagination.
pub const PHOTO_MAX_PAGES: usize = 1_000;

/// Default chunk size for item-level work (deletes, photo checks).
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default chunk size for range-level work (one fetch per date range).
pub const DEFAULT_RANGE_CHUNK_SIZE: usize = 50;

/// Default worker count for report generation.
pub const DEFAULT_REPORT_WORKERS: usize = 5;

/// Default worker count for bulk delete and photo analysis.
pub const DEFAULT_CLEANUP_WORKERS: usize = 8;

/// Upper bound accepted for any worker count flag.
pub const MAX_WORKERS: usize = 64;

/// Search API budget: calls per minute shared by probes and page fetches.
pub const DEFAULT_SEARCH_CALLS_PER_MINUTE: u32 = 20;

/// Draft API budget (redirect and story deletes), requests per second.
pub const DEFAULT_DRAFT_RATE_PER_SECOND: u32 = 4;

/// Photo API budget, requests per second.
pub const DEFAULT_PHOTO_RATE_PER_SECOND: u32 = 10;

/// Concurrent in-flight status checks.
pub const DEFAULT_STATUS_CONCURRENCY: usize = 100;

/// URLs per status-check batch.
pub const DEFAULT_STATUS_BATCH_SIZE: usize = 100;

/// Per-request timeout for status checks, in seconds.
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 30;

/// Per-request timeout for CRUD and search calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP connect timeout for CRUD and search calls.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between unpublishing a story and deleting it.
/// The draft API rejects deletes of stories whose unpublish is still in flight.
pub const STORY_UNPUBLISH_SETTLE: Duration = Duration::from_secs(5);

/// Worker counts probed when optimizing item-level work.
pub const ITEM_OPTIMIZER_CANDIDATES: &[usize] = &[1, 2, 4, 8, 12, 16];

/// Worker counts probed when optimizing range-level work.
pub const RANGE_OPTIMIZER_CANDIDATES: &[usize] = &[1, 3, 5, 8, 10];

/// Sample size for item-level optimization.
pub const ITEM_OPTIMIZER_SAMPLE: usize = 10;

/// Sample size for range-level optimization.
pub const RANGE_OPTIMIZER_SAMPLE: usize = 3;

/// Default folder for generated CSV reports.
pub const DEFAULT_REPORT_FOLDER: &str = "spreadsheets";

/// Number of chunks needed to cover `total` items.
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    total.div_ceil(chunk_size)
}
