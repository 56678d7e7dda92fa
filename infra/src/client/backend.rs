//! Shared HTTP plumbing for the enrollment backend
//!
//! Every call is classified into one of three outcomes: the request never got
//! a response (`ApiError::Network`), the backend answered with a non-success
//! status (`ApiError::Rejected`), or a success body could not be decoded
//! (`ApiError::Decode`).

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use enroll_core::errors::ApiError;
use enroll_shared::utils::mask_email;
use enroll_shared::{BackendConfig, RejectionBody};

use crate::InfrastructureError;

/// Longest raw body echoed back as a rejection message
const MAX_RAW_MESSAGE_LEN: usize = 200;

/// Client for the enrollment REST backend
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `config` - Backend location, timeouts and optional admin token
    pub fn new(config: &BackendConfig) -> Result<Self, InfrastructureError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let base_url = config.normalized_base_url().to_string();
        info!(
            base_url = %base_url,
            timeout_secs = config.timeout_seconds,
            "Backend client initialized"
        );

        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for `path` with `segment` appended as one escaped path segment
    pub(crate) fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ApiError::Network(format!("Invalid backend URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network("Backend URL cannot carry a path".to_string()))?
            .push(segment);
        Ok(url)
    }

    pub(crate) fn get(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub(crate) fn post(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    pub(crate) fn put(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.authorize(self.http.put(url))
    }

    pub(crate) fn delete(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.authorize(self.http.delete(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send `request` and decode a JSON success body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send_bytes(request).await?;
        decode_body(&body)
    }

    /// Send `request` and discard the success body
    pub(crate) async fn send_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send_bytes(request).await.map(|_| ())
    }

    /// Send `request` and return the raw success body
    pub(crate) async fn send_bytes(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(network_error)?;
        let response = check_status(response).await?;
        let body = response.bytes().await.map_err(network_error)?;
        Ok(body.to_vec())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), path = %loggable_path(response.url()), "Backend response");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let error = rejection_from_body(status.as_u16(), &body, status.canonical_reason());
    warn!(status = status.as_u16(), error = %error, "Backend rejected request");
    Err(error)
}

/// Request path with any email segment masked
fn loggable_path(url: &Url) -> String {
    match url.path_segments() {
        Some(segments) => segments
            .map(|segment| {
                let decoded = segment.replace("%40", "@");
                if decoded.contains('@') {
                    mask_email(&decoded)
                } else {
                    segment.to_string()
                }
            })
            .fold(String::new(), |path, segment| path + "/" + &segment),
        None => url.path().to_string(),
    }
}

/// Build the rejection for a non-success response body
pub(crate) fn rejection_from_body(status: u16, body: &[u8], reason: Option<&str>) -> ApiError {
    let parsed: RejectionBody = serde_json::from_slice(body).unwrap_or_default();

    let message = match parsed.text() {
        Some(text) => text.to_string(),
        None => {
            let raw = String::from_utf8_lossy(body).trim().to_string();
            if !raw.is_empty() && raw.len() <= MAX_RAW_MESSAGE_LEN && !raw.starts_with('<') {
                raw
            } else {
                reason.unwrap_or("Request failed").to_string()
            }
        }
    };

    ApiError::Rejected {
        status,
        message,
        attempts_left: parsed.attempts_left,
    }
}

/// Decode a success body; an empty body decodes as `{}`
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn network_error(error: reqwest::Error) -> ApiError {
    if error.is_decode() {
        return ApiError::Decode(error.to_string());
    }
    ApiError::Network(error.to_string())
}
