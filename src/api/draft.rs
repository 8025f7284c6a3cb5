//! Draft API: redirect and story removal

use std::sync::Arc;

use super::{ApiClient, ApiResult, RawResponse};

/// Draft API wrapper
#[derive(Debug, Clone)]
pub struct DraftApi {
    client: Arc<ApiClient>,
}

impl DraftApi {
    /// Wrap a client pointed at the organization's API host
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Delete the redirect `url` on `website`
    pub fn delete_redirect(&self, website: &str, url: &str) -> ApiResult<RawResponse> {
        self.client.delete(&redirect_path(website, url))
    }

    /// Remove the published revision of a story
    pub fn unpublish_story(&self, id: &str) -> ApiResult<RawResponse> {
        self.client
            .delete(&format!("/draft/v1/story/{id}/revision/published"))
    }

    /// Delete a story document
    pub fn delete_story(&self, id: &str) -> ApiResult<RawResponse> {
        self.client.delete(&format!("/draft/v1/story/{id}"))
    }
}

/// Path of a redirect document; `url` is appended as-is
pub fn redirect_path(website: &str, url: &str) -> String {
    format!("/draft/v1/redirect/{website}/{url}")
}
