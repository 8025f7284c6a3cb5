//! Blocking HTTP client bound to one API host
//!
//! Provides:
//! - Bearer authentication and a fixed user agent
//! - Request and connect timeouts
//! - Optional pacing through a shared [`RateGovernor`]
//! - A running count of issued calls

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ApiError, ApiResult};
use crate::processor::config::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::processor::RateGovernor;

/// Longest response body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Status and body of a response whose status the caller interprets itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, possibly truncated
    pub body: String,
}

impl RawResponse {
    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking client for one API host
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer_token: String,
    governor: Option<Arc<RateGovernor>>,
    api_calls: AtomicU64,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("paced", &self.governor.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. "https://api.acme.arcpublishing.com")
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("content-audit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
            governor: None,
            api_calls: AtomicU64::new(0),
        })
    }

    /// Pace every request through `governor`
    pub fn with_governor(mut self, governor: Arc<RateGovernor>) -> Self {
        self.governor = Some(governor);
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests issued so far
    pub fn calls_made(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    /// GET `path` and deserialize a 2xx JSON body
    pub fn get_json<T>(&self, path: &str, params: &[(&str, String)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.get_json_with_headers(path, params).map(|(body, _)| body)
    }

    /// GET `path`, returning the deserialized body and the response headers
    pub fn get_json_with_headers<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<(T, HeaderMap)>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("Making GET request to: {} with {} params", url, params.len());

        let response = self.send(self.client.get(&url).query(params))?;
        let status = response.status();
        if !status.is_success() {
            let body = truncate(response.text().unwrap_or_default());
            warn!(url = %url, status = status.as_u16(), "GET request failed");
            return Err(ApiError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        let body = response
            .json::<T>()
            .map_err(|e| ApiError::ParseError(format!("{url}: {e}")))?;
        Ok((body, headers))
    }

    /// PUT a JSON body; any HTTP status is returned to the caller
    pub fn put_json<B>(&self, path: &str, body: &B) -> ApiResult<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("Making PUT request to: {}", url);
        let response = self.send(self.client.put(&url).json(body))?;
        Ok(into_raw(response))
    }

    /// DELETE `path`; any HTTP status is returned to the caller
    pub fn delete(&self, path: &str) -> ApiResult<RawResponse> {
        let url = self.url(path);
        debug!("Making DELETE request to: {}", url);
        let response = self.send(self.client.delete(&url))?;
        Ok(into_raw(response))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        if let Some(governor) = &self.governor {
            governor.acquire();
        }
        self.api_calls.fetch_add(1, Ordering::Relaxed);

        request
            .bearer_auth(&self.bearer_token)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(e.to_string())
                } else {
                    ApiError::NetworkError(e.to_string())
                }
            })
    }
}

fn into_raw(response: Response) -> RawResponse {
    let status = response.status().as_u16();
    let body = truncate(response.text().unwrap_or_default());
    RawResponse { status, body }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
