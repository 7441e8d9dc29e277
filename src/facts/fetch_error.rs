use super::hosting::{HostingApiResult, RateLimitInfo};
use super::rate_limiter::RateLimiter;

/// Host-side phrases that mean the repository cannot be served and never will be.
///
/// Matched against error text from capabilities that report failures only as messages.
/// Hosts may reword these at any time, so structured status codes take precedence wherever
/// the API exposes them.
const UNUSABLE_REPOSITORY_PHRASES: &[&str] = &[
    "Something went wrong asking the repo for its default branch",
    "Git Repository is empty",
];

/// Phrases that identify a network timeout in error text.
const TIMEOUT_PHRASES: &[&str] = &["TimeoutError", "timed out", "Read timed out", "ConnectTimeout"];

/// Phrases that identify quota exhaustion in error text.
const RATE_LIMIT_PHRASES: &[&str] = &["API rate limit exceeded", "secondary rate limit", "rate limit"];

/// Why a single fetch attempt failed, as far as the retry layer is concerned.
#[derive(Debug)]
pub enum FetchError {
    /// The content does not exist (no README, repository gone). Never retried.
    NotFound(String),

    /// The host reports the repository is in an unusable state. Never retried.
    RepositoryUnusable(ohno::AppError),

    /// The host refused the request for a reason waiting will not fix. Never retried.
    Rejected(ohno::AppError),

    /// Timeout or connection failure. Retried after a short fixed delay.
    Transient(ohno::AppError),

    /// The quota is exhausted. Retried once the limiter says so.
    RateLimited(Option<RateLimitInfo>),

    /// Anything else. Retried on the quota-wait path.
    Other(ohno::AppError),
}

impl FetchError {
    /// Classify a failure known only by its message text.
    #[must_use]
    pub fn from_message(error: ohno::AppError) -> Self {
        let text = format!("{error:#}");
        let lowered = text.to_lowercase();

        if UNUSABLE_REPOSITORY_PHRASES.iter().any(|p| text.contains(p)) {
            Self::RepositoryUnusable(error)
        } else if TIMEOUT_PHRASES.iter().any(|p| text.contains(p)) {
            Self::Transient(error)
        } else if RATE_LIMIT_PHRASES.iter().any(|p| lowered.contains(&p.to_lowercase())) {
            Self::RateLimited(None)
        } else {
            Self::Other(error)
        }
    }

    /// Short label used in log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not found",
            Self::RepositoryUnusable(_) => "repository unusable",
            Self::Rejected(_) => "rejected",
            Self::Transient(_) => "transient",
            Self::RateLimited(_) => "rate limited",
            Self::Other(_) => "unknown",
        }
    }
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound(reason) => write!(f, "{reason}"),
            Self::RepositoryUnusable(e) | Self::Rejected(e) | Self::Transient(e) | Self::Other(e) => write!(f, "{e:#}"),
            Self::RateLimited(Some(info)) => write!(f, "rate limited until {}", info.reset_at),
            Self::RateLimited(None) => write!(f, "rate limited"),
        }
    }
}

impl<T> HostingApiResult<T> {
    /// Record the response's quota information and turn the result into a fetch result.
    pub fn into_fetch_result(self, limiter: &mut RateLimiter, what: &str) -> Result<T, FetchError> {
        limiter.record(self.rate_limit());

        match self {
            Self::Success(data, _) => Ok(data),
            Self::RateLimited(info) => Err(FetchError::RateLimited(info)),
            Self::NotFound(_) => Err(FetchError::NotFound(format!("{what} not found"))),
            Self::Unusable(e, _) => Err(FetchError::RepositoryUnusable(e)),
            Self::Transient(e) => Err(FetchError::Transient(e)),
            Self::Failed(e, _) => Err(FetchError::Rejected(e)),
        }
    }
}
