//! GitHub API client
//!
//! Minimal client for the handful of read-only calls the harvester needs: listing a
//! repository's root directory, downloading a file through its direct link, and querying
//! the rate-limit status.

use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;

const LOG_TARGET: &str = "   hosting";
const USER_AGENT: &str = "repo-harvest";

/// Pause after a secondary rate limit that names no `Retry-After`.
pub const DEFAULT_SECONDARY_LIMIT_WAIT: Duration = Duration::from_mins(1);

/// One entry of a repository directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Inline body, only present when the API chose to embed it
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimitCore,
}

#[derive(Debug, Deserialize)]
struct RateLimitCore {
    remaining: u64,
    reset: i64,
}

/// Rate limit information from response headers or the rate-limit endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Quota exhausted - retry once the window resets
    RateLimited(Option<RateLimitInfo>),

    /// The requested resource was not found (404)
    NotFound(Option<RateLimitInfo>),

    /// The repository exists but is in a state the API cannot serve (e.g. empty, 409)
    Unusable(ohno::AppError, Option<RateLimitInfo>),

    /// Timeout, connection failure or server-side error - worth a short retry
    Transient(ohno::AppError),

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

impl<T> HostingApiResult<T> {
    /// Rate limit info carried by this result, if any.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitInfo> {
        match self {
            Self::Success(_, rl) | Self::RateLimited(rl) | Self::NotFound(rl) | Self::Unusable(_, rl) | Self::Failed(_, rl) => *rl,
            Self::Transient(_) => None,
        }
    }
}

/// Source of live quota information, queried when a response did not say enough.
pub trait QuotaSource {
    fn query_quota(&self) -> impl Future<Output = Result<RateLimitInfo>> + Send;
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    download_timeout: Duration,
    secondary_limit_wait: Duration,
}

impl Client {
    /// Create a new hosting API client with optional authentication token and base URL
    pub fn new(
        token: Option<&str>,
        base_url: impl Into<String>,
        request_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut client_builder = reqwest::Client::builder().user_agent(USER_AGENT).timeout(request_timeout);

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            client_builder = client_builder.default_headers(headers);
        }

        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            download_timeout,
            secondary_limit_wait: DEFAULT_SECONDARY_LIMIT_WAIT,
        })
    }

    /// Set how long to back off after a 403 that leaves the primary quota untouched.
    #[must_use]
    pub fn with_secondary_limit_wait(mut self, wait: Duration) -> Self {
        self.secondary_limit_wait = wait;
        self
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str) -> HostingApiResult<reqwest::Response> {
        self.send(self.client.get(url)).await
    }

    /// List the entries at the root of a repository.
    pub async fn list_root_contents(&self, owner: &str, repo: &str) -> HostingApiResult<Vec<ContentEntry>> {
        let url = format!("{}/repos/{owner}/{repo}/contents/", self.base_url);

        let (resp, rate_limit) = match self.api_call(&url).await {
            HostingApiResult::Success(resp, rate_limit) => (resp, rate_limit),
            other => return other.map_never(),
        };

        match resp.json().await {
            Ok(entries) => HostingApiResult::Success(entries, rate_limit),
            Err(e) => classify_transport_error(e, rate_limit),
        }
    }

    /// Download a file through its direct link, bounded by the download timeout.
    pub async fn download_text(&self, url: &str) -> HostingApiResult<String> {
        let (resp, rate_limit) = match self.send(self.client.get(url).timeout(self.download_timeout)).await {
            HostingApiResult::Success(resp, rate_limit) => (resp, rate_limit),
            other => return other.map_never(),
        };

        match resp.bytes().await {
            Ok(bytes) => HostingApiResult::Success(String::from_utf8_lossy(&bytes).into_owned(), rate_limit),
            Err(e) => classify_transport_error(e, rate_limit),
        }
    }

    /// Synthetic quota snapshot that holds requests off for the secondary limit wait.
    fn secondary_limit(&self, now: DateTime<Utc>) -> RateLimitInfo {
        let wait = chrono::Duration::from_std(self.secondary_limit_wait).unwrap_or(chrono::Duration::MAX);
        RateLimitInfo {
            remaining: 0,
            reset_at: now.checked_add_signed(wait).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> HostingApiResult<reqwest::Response> {
        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => return classify_transport_error(e, None),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp, rate_limit);
        }

        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                // Secondary rate limits announce themselves with Retry-After
                if let Some(secs) = parse_retry_after(resp.headers()) {
                    return HostingApiResult::RateLimited(Some(RateLimitInfo {
                        remaining: 0,
                        reset_at: Utc::now() + chrono::Duration::seconds(secs.cast_signed()),
                    }));
                }

                // Quota left means a secondary (abuse) limit, which GitHub asks callers to back off from
                if rate_limit.is_some_and(|rl| rl.remaining > 0) {
                    log::debug!(target: LOG_TARGET, "{status} from {} with primary quota left, treating as a secondary rate limit", resp.url());
                    return HostingApiResult::RateLimited(Some(self.secondary_limit(Utc::now())));
                }

                HostingApiResult::RateLimited(rate_limit)
            }
            StatusCode::NOT_FOUND => HostingApiResult::NotFound(rate_limit),
            StatusCode::CONFLICT => {
                let body = resp.text().await.unwrap_or_default();
                HostingApiResult::Unusable(ohno::app_err!("repository is in an unusable state: {}", body.trim()), rate_limit)
            }
            s if s.is_server_error() => HostingApiResult::Transient(ohno::app_err!("server error {s} from {}", resp.url())),
            _ => {
                let error = resp.error_for_status().map_or_else(ohno::AppError::from, |_| ohno::app_err!("unexpected status {status}"));
                HostingApiResult::Failed(error, rate_limit)
            }
        }
    }
}

impl QuotaSource for Client {
    async fn query_quota(&self) -> Result<RateLimitInfo> {
        let url = format!("{}/rate_limit", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .into_app_err("querying rate limit status")?
            .error_for_status()
            .into_app_err("querying rate limit status")?;

        let body: RateLimitResponse = resp.json().await.into_app_err("parsing rate limit status")?;
        let reset_at = DateTime::from_timestamp(body.resources.core.reset, 0)
            .into_app_err_with(|| format!("invalid rate limit reset time {}", body.resources.core.reset))?;

        Ok(RateLimitInfo {
            remaining: body.resources.core.remaining,
            reset_at,
        })
    }
}

impl HostingApiResult<reqwest::Response> {
    /// Re-type a non-success result.
    fn map_never<U>(self) -> HostingApiResult<U> {
        match self {
            Self::Success(_, rate_limit) => HostingApiResult::Failed(ohno::app_err!("unexpected success"), rate_limit),
            Self::RateLimited(rate_limit) => HostingApiResult::RateLimited(rate_limit),
            Self::NotFound(rate_limit) => HostingApiResult::NotFound(rate_limit),
            Self::Unusable(e, rate_limit) => HostingApiResult::Unusable(e, rate_limit),
            Self::Transient(e) => HostingApiResult::Transient(e),
            Self::Failed(e, rate_limit) => HostingApiResult::Failed(e, rate_limit),
        }
    }
}

/// Timeouts and connection failures are transient, everything else is permanent.
fn classify_transport_error<T>(error: reqwest::Error, rate_limit: Option<RateLimitInfo>) -> HostingApiResult<T> {
    if error.is_timeout() {
        HostingApiResult::Transient(ohno::AppError::from(error).enrich("request timed out".to_string()))
    } else if error.is_connect() || error.is_request() || error.is_body() {
        HostingApiResult::Transient(ohno::AppError::from(error).enrich("connection failed".to_string()))
    } else {
        HostingApiResult::Failed(error.into(), rate_limit)
    }
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let s = headers.get(reqwest::header::RETRY_AFTER).and_then(|h| h.to_str().ok())?;
    s.trim().parse::<u64>().ok()
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<u64>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
