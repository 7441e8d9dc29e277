use super::checker::{CheckError, ComplianceChecker, ComplianceIndicators};
use crate::facts::{FetchError, Fetcher, HostKind, RateLimiter, RepoSpec};
use url::Url;

/// Compliance indicators for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceReport {
    pub url: Url,
    pub indicators: ComplianceIndicators,
}

/// Adapts a [`ComplianceChecker`] to the retry layer.
///
/// The checker only reports failures as text, so they are classified by message.
#[derive(Debug, Clone)]
pub struct ComplianceFetcher<C> {
    checker: C,
}

impl<C: ComplianceChecker> ComplianceFetcher<C> {
    #[must_use]
    pub const fn new(checker: C) -> Self {
        Self { checker }
    }
}

impl<C: ComplianceChecker> Fetcher for ComplianceFetcher<C> {
    type Payload = ComplianceReport;

    fn supports(&self, host: HostKind) -> bool {
        matches!(host, HostKind::GitHub | HostKind::GitLab)
    }

    async fn fetch(&self, spec: &RepoSpec, _limiter: &mut RateLimiter) -> Result<ComplianceReport, FetchError> {
        match self.checker.check(spec.url()).await {
            Ok(indicators) => Ok(ComplianceReport {
                url: spec.url().clone(),
                indicators,
            }),
            Err(CheckError::Unavailable(e)) => Err(FetchError::Rejected(e)),
            Err(CheckError::Reported(e)) => Err(FetchError::from_message(e)),
        }
    }
}
