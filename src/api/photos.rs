//! Photo API: listing, usage checks, expire/delete and lightboxes

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::search::SEARCH_PATH;
use super::{ApiClient, ApiResult, RawResponse};
use crate::processor::config::{PHOTO_MAX_PAGES, PHOTO_PAGE_SIZE};

/// Photo listing endpoint
pub const PHOTOS_PATH: &str = "/photo/api/v2/photos";

/// Lightbox listing endpoint
pub const LIGHTBOXES_PATH: &str = "/photo/api/v2/lightboxes";

/// Header carrying the total result count of a listing
pub const RESULTS_TOTAL_HEADER: &str = "x-results-total";

/// Fields requested by the gallery usage search
const GALLERY_SOURCE_INCLUDE: &str =
    "type,promo_items.lead_art.url,promo_items.basic.url,content_elements.url,related_content";

/// Filters applied when listing published photos
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoFilter {
    /// Upload window as epoch milliseconds
    pub uploaded_between: Option<(i64, i64)>,
    /// Restrict to one source id
    pub source: Option<String>,
    /// Restrict to wire photos
    pub published_wires: bool,
}

impl PhotoFilter {
    /// Query parameters for the listing call, excluding paging
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("published", "true".to_string())];
        if self.published_wires {
            params.push(("sourceType", "wires".to_string()));
        } else if let Some(source) = &self.source {
            params.push(("source", source.clone()));
        }
        if let Some((start, end)) = self.uploaded_between {
            params.push(("startDateUploaded", start.to_string()));
            params.push(("endDateUploaded", end.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReferencesResponse {
    #[serde(default)]
    references: Vec<Reference>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    #[serde(default)]
    published: bool,
    #[serde(default)]
    reference_type: Option<String>,
    #[serde(default)]
    website_id: Option<String>,
}

/// Published references to one image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoReferences {
    /// Reference types of all references (`story`, `gallery`, ...)
    pub reference_types: BTreeSet<String>,
    /// Websites of all references
    pub websites: BTreeSet<String>,
    /// Whether any reference is published
    pub any_published: bool,
}

/// Summary entry of a lightbox listing
#[derive(Debug, Clone, Deserialize)]
pub struct LightboxSummary {
    /// Lightbox id
    pub id: String,
    /// Last photo added, used to fingerprint changes
    #[serde(default)]
    pub last_photo_added: Option<Value>,
}

/// Photo API wrapper
#[derive(Debug, Clone)]
pub struct PhotoApi {
    client: Arc<ApiClient>,
}

impl PhotoApi {
    /// Wrap a client pointed at the organization's API host
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// One listing page: photo ids and the reported total
    pub fn published_page(&self, filter: &PhotoFilter, offset: u64) -> ApiResult<(Vec<String>, u64)> {
        let mut params = filter.params();
        params.push(("limit", PHOTO_PAGE_SIZE.to_string()));
        params.push(("offset", offset.to_string()));

        let (photos, headers): (Vec<IdOnly>, _) =
            self.client.get_json_with_headers(PHOTOS_PATH, &params)?;
        let total = header_total(&headers);
        Ok((photos.into_iter().map(|p| p.id).collect(), total))
    }

    /// Every published photo id matching `filter`, starting at `offset`
    ///
    /// Stops on an empty page, once the reported total is reached, after
    /// [`PHOTO_MAX_PAGES`] pages, or on the first failed page (keeping what was fetched).
    pub fn list_published(&self, filter: &PhotoFilter, offset: u64) -> ApiResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut current = offset;
        let mut pages = 0usize;

        loop {
            let (page, total) = match self.published_page(filter, current) {
                Ok(result) => result,
                Err(e) if pages == 0 => return Err(e),
                Err(e) => {
                    warn!(offset = current, error = %e, "Photo listing failed, keeping photos fetched so far");
                    break;
                }
            };

            if page.is_empty() {
                info!("No more photos found, ending pagination");
                break;
            }

            let page_len = page.len() as u64;
            ids.extend(page);
            pages += 1;
            debug!(page = pages, fetched = ids.len(), total, "Retrieved photo page");

            if current + page_len >= total {
                info!(photos = ids.len(), "Reached end of photo listing");
                break;
            }
            current += PHOTO_PAGE_SIZE;

            if pages >= PHOTO_MAX_PAGES {
                warn!(pages, "Reached maximum page limit, stopping pagination");
                break;
            }
        }

        Ok(ids)
    }

    /// Fetch one photo document
    pub fn get_photo(&self, id: &str) -> ApiResult<Value> {
        self.client.get_json(&photo_path(id), &[])
    }

    /// Replace one photo document
    pub fn put_photo(&self, id: &str, photo: &Value) -> ApiResult<RawResponse> {
        self.client.put_json(&photo_path(id), photo)
    }

    /// Hard delete one photo
    pub fn delete_photo(&self, id: &str) -> ApiResult<RawResponse> {
        self.client.delete(&photo_path(id))
    }

    /// Content referencing the image
    pub fn references(&self, id: &str) -> ApiResult<PhotoReferences> {
        let response: ReferencesResponse = self.client.get_json(
            &format!("/content/v4/referenced-content/image/{id}/references"),
            &[],
        )?;

        let mut summary = PhotoReferences::default();
        for reference in response.references {
            summary.any_published |= reference.published;
            if let Some(kind) = reference.reference_type {
                summary.reference_types.insert(kind);
            }
            if let Some(website) = reference.website_id {
                summary.websites.insert(website);
            }
        }
        Ok(summary)
    }

    /// Whether a published gallery on `website` mentions the image id
    pub fn used_in_gallery(&self, website: &str, id: &str) -> ApiResult<bool> {
        let params = [
            ("website", website.to_string()),
            ("published", "true".to_string()),
            ("_sourceInclude", GALLERY_SOURCE_INCLUDE.to_string()),
            ("q", id.to_string()),
        ];
        let page: super::SearchPage = self.client.get_json(SEARCH_PATH, &params)?;
        Ok(page.count > 0
            && page
                .content_elements
                .iter()
                .any(|doc| doc.get("type").and_then(Value::as_str) == Some("gallery")))
    }

    /// One page of lightboxes and the reported total
    pub fn lightboxes_page(&self, offset: u64) -> ApiResult<(Vec<LightboxSummary>, u64)> {
        let params = [
            ("limit", PHOTO_PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ];
        let (lightboxes, headers): (Vec<LightboxSummary>, _) =
            self.client.get_json_with_headers(LIGHTBOXES_PATH, &params)?;
        Ok((lightboxes, header_total(&headers)))
    }

    /// One lightbox by id
    pub fn lightbox(&self, id: &str) -> ApiResult<LightboxSummary> {
        self.client.get_json(&format!("{LIGHTBOXES_PATH}/{id}"), &[])
    }

    /// Photo ids contained in a lightbox
    pub fn lightbox_photos(&self, id: &str) -> ApiResult<Vec<String>> {
        let photos: Vec<IdOnly> = self
            .client
            .get_json(&format!("{LIGHTBOXES_PATH}/{id}/photos"), &[])?;
        Ok(photos.into_iter().map(|p| p.id).collect())
    }
}

/// Path of one photo document (trailing slash required by the API)
pub fn photo_path(id: &str) -> String {
    format!("{PHOTOS_PATH}/{id}/")
}

fn header_total(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(RESULTS_TOTAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
