//! Bulk delete and expire actions

use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::input::RedirectTarget;
use super::CleanupAction;
use crate::api::{ApiClient, ApiError, ApiResult, DraftApi, PhotoApi, RawResponse};
use crate::processor::config::STORY_UNPUBLISH_SETTLE;
use crate::processor::WorkAction;

/// Expiration date written to expired photos
pub const EXPIRATION_DATE: &str = "2000-01-01T00:00:00Z";

/// Hard delete of redirects
#[derive(Debug, Clone)]
pub struct RedirectDeletion {
    draft: DraftApi,
}

impl RedirectDeletion {
    /// Delete through `draft`
    pub fn new(draft: DraftApi) -> Self {
        Self { draft }
    }
}

impl CleanupAction for RedirectDeletion {
    type Item = RedirectTarget;

    fn kind(&self) -> WorkAction {
        WorkAction::Delete
    }

    fn client(&self) -> &ApiClient {
        self.draft.client()
    }

    fn apply(&self, item: &RedirectTarget) -> ApiResult<RawResponse> {
        self.draft.delete_redirect(&item.website, &item.url)
    }
}

/// Unpublish then delete stories
#[derive(Debug, Clone)]
pub struct StoryDeletion {
    draft: DraftApi,
    settle: Duration,
}

impl StoryDeletion {
    /// Delete through `draft`, waiting the default settle time after unpublishing
    pub fn new(draft: DraftApi) -> Self {
        Self {
            draft,
            settle: STORY_UNPUBLISH_SETTLE,
        }
    }

    /// Wait between unpublish and delete
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

impl CleanupAction for StoryDeletion {
    type Item = String;

    fn kind(&self) -> WorkAction {
        WorkAction::Delete
    }

    fn client(&self) -> &ApiClient {
        self.draft.client()
    }

    // Unpublish failures are not fatal: stories that were never published answer 404.
    fn apply(&self, id: &String) -> ApiResult<RawResponse> {
        match self.draft.unpublish_story(id) {
            Ok(response) if !response.is_success() => {
                debug!(story = %id, status = response.status, "Unpublish did not succeed");
            }
            Ok(_) => {}
            Err(e) => warn!(story = %id, error = %e, "Unpublish request failed"),
        }

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        self.draft.delete_story(id)
    }
}

/// How a photo is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalMode {
    /// Set an expiration date in the past and unpublish
    #[default]
    Expire,
    /// Delete the photo document
    HardDelete,
}

/// Expire or hard delete photos
#[derive(Debug, Clone)]
pub struct PhotoRemoval {
    photos: PhotoApi,
    mode: RemovalMode,
}

impl PhotoRemoval {
    /// Remove through `photos` using `mode`
    pub fn new(photos: PhotoApi, mode: RemovalMode) -> Self {
        Self { photos, mode }
    }

    fn expire(&self, id: &str) -> ApiResult<RawResponse> {
        let mut photo = self.photos.get_photo(id)?;
        mark_expired(&mut photo)?;
        self.photos.put_photo(id, &photo)
    }
}

/// Set `additional_properties.expiration_date` and `additional_properties.published = false`
pub fn mark_expired(photo: &mut Value) -> ApiResult<()> {
    let document = photo
        .as_object_mut()
        .ok_or_else(|| ApiError::ParseError("photo document is not an object".to_string()))?;
    let properties = document
        .entry("additional_properties")
        .or_insert_with(|| json!({}));
    let properties = properties
        .as_object_mut()
        .ok_or_else(|| ApiError::ParseError("additional_properties is not an object".to_string()))?;

    properties.insert("expiration_date".to_string(), json!(EXPIRATION_DATE));
    properties.insert("published".to_string(), json!(false));
    Ok(())
}

impl CleanupAction for PhotoRemoval {
    type Item = String;

    fn kind(&self) -> WorkAction {
        match self.mode {
            RemovalMode::Expire => WorkAction::Expire,
            RemovalMode::HardDelete => WorkAction::Delete,
        }
    }

    fn client(&self) -> &ApiClient {
        self.photos.client()
    }

    fn apply(&self, id: &String) -> ApiResult<RawResponse> {
        match self.mode {
            RemovalMode::Expire => self.expire(id),
            RemovalMode::HardDelete => self.photos.delete_photo(id),
        }
    }
}
