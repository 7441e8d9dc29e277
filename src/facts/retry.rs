//! Per-row retry loop.
//!
//! Wraps one fetch operation in an explicit state machine:
//!
//! ```text
//! Attempting --ok--------------------------------> Succeeded
//! Attempting --not found / unusable--------------> SkippedPermanently
//! Attempting --rejected / attempts exhausted-----> GivingUp
//! Attempting --transient--(fixed delay)----------> Attempting
//! Attempting --rate limited / unknown------------> WaitingOnQuota --(limiter wait)--> Attempting
//! ```
//!
//! The quota is consulted before every attempt as well, so a response that drained the quota
//! delays the next request even when it succeeded.

use super::fetch_error::FetchError;
use super::fetch_outcome::FetchOutcome;
use super::hosting::QuotaSource;
use super::progress::Progress;
use super::rate_limiter::RateLimiter;
use super::repo_spec::{HostKind, RepoSpec};
use chrono::Utc;
use core::time::Duration;
use ohno::{EnrichableExt, app_err};

const LOG_TARGET: &str = "     retry";

/// A single fetch operation the orchestrator can retry.
pub trait Fetcher {
    type Payload;

    /// Whether this fetcher knows how to talk to the given platform.
    fn supports(&self, host: HostKind) -> bool;

    /// Perform one attempt, recording any quota information observed along the way.
    fn fetch(&self, spec: &RepoSpec, limiter: &mut RateLimiter) -> impl Future<Output = Result<Self::Payload, FetchError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on attempts per row, across all retryable failure kinds.
    pub max_attempts: u32,

    /// Pause after a timeout or connection failure.
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            transient_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RetryState {
    Attempting,
    WaitingOnQuota,
    Succeeded,
    SkippedPermanently,
    GivingUp,
}

/// Runs fetches with retries, owning the quota bookkeeping for the whole run.
#[derive(Debug)]
pub struct RetryOrchestrator<Q> {
    limiter: RateLimiter,
    quota_source: Q,
    policy: RetryPolicy,
}

impl<Q: QuotaSource> RetryOrchestrator<Q> {
    #[must_use]
    pub const fn new(limiter: RateLimiter, quota_source: Q, policy: RetryPolicy) -> Self {
        Self {
            limiter,
            quota_source,
            policy,
        }
    }

    #[must_use]
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetch data for one repository, retrying as the failure kind allows.
    pub async fn execute<F: Fetcher>(&mut self, fetcher: &F, spec: &RepoSpec, progress: &dyn Progress) -> FetchOutcome<F::Payload> {
        let mut state = RetryState::Attempting;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.wait_for_quota(spec, progress).await;

            log::debug!(target: LOG_TARGET, "Attempt {attempt}/{} for '{spec}'", self.policy.max_attempts);

            let error = match fetcher.fetch(spec, &mut self.limiter).await {
                Ok(payload) => {
                    transition(spec, &mut state, RetryState::Succeeded);
                    return FetchOutcome::Success(payload);
                }
                Err(e) => e,
            };

            log::debug!(target: LOG_TARGET, "Attempt {attempt} for '{spec}' failed ({}): {error}", error.kind());

            match error {
                FetchError::NotFound(reason) => {
                    transition(spec, &mut state, RetryState::SkippedPermanently);
                    log::warn!(target: LOG_TARGET, "Skipping '{spec}': {reason}");
                    return FetchOutcome::skipped(reason);
                }

                FetchError::RepositoryUnusable(e) => {
                    transition(spec, &mut state, RetryState::SkippedPermanently);
                    log::warn!(target: LOG_TARGET, "Skipping '{spec}', repository is unusable: {e:#}");
                    return FetchOutcome::skipped(format!("repository unusable: {e:#}"));
                }

                FetchError::Rejected(e) => {
                    transition(spec, &mut state, RetryState::GivingUp);
                    log::error!(target: LOG_TARGET, "Could not fetch '{spec}': {e:#}");
                    return FetchOutcome::failed(e.enrich_with(|| format!("fetching '{spec}'")));
                }

                _ if attempt >= self.policy.max_attempts => {
                    transition(spec, &mut state, RetryState::GivingUp);
                    log::warn!(target: LOG_TARGET, "Giving up on '{spec}' after {attempt} attempt(s): {error}");
                    return FetchOutcome::failed(app_err!("giving up on '{spec}' after {attempt} attempt(s): {error}"));
                }

                FetchError::Transient(e) => {
                    log::warn!(
                        target: LOG_TARGET,
                        "Network problem for '{spec}', retrying in {}s: {e:#}",
                        self.policy.transient_delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.transient_delay).await;
                    transition(spec, &mut state, RetryState::Attempting);
                }

                FetchError::RateLimited(info) => {
                    if info.is_some() {
                        self.limiter.record(info);
                    } else {
                        self.limiter.refresh(&self.quota_source, Utc::now()).await;
                    }

                    transition(spec, &mut state, RetryState::WaitingOnQuota);
                    self.wait_for_quota(spec, progress).await;
                    transition(spec, &mut state, RetryState::Attempting);
                }

                FetchError::Other(e) => {
                    log::warn!(target: LOG_TARGET, "Error for '{spec}' (most likely caused by API limits): {e:#}");
                    self.limiter.refresh(&self.quota_source, Utc::now()).await;

                    transition(spec, &mut state, RetryState::WaitingOnQuota);
                    self.wait_for_quota(spec, progress).await;
                    transition(spec, &mut state, RetryState::Attempting);
                }
            }
        }
    }

    /// Sleep for as long as the limiter asks, then let it forget the served wait.
    async fn wait_for_quota(&mut self, spec: &RepoSpec, progress: &dyn Progress) {
        let now = Utc::now();
        let wait = self.limiter.wait_duration(now);
        if wait.is_zero() {
            return;
        }

        let resume_at = chrono::Duration::from_std(wait)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        let formatted_time = resume_at.with_timezone(&chrono::Local).format("%T");
        log::warn!(target: LOG_TARGET, "Rate limit reached while processing '{spec}', waiting {}s until {formatted_time}", wait.as_secs());
        if !log::log_enabled!(log::Level::Warn) {
            progress.println(&format!("Rate limit exceeded: waiting until {formatted_time}..."));
        }

        tokio::time::sleep(wait).await;
        self.limiter.mark_waited();

        log::info!(target: LOG_TARGET, "Rate limit wait over, resuming requests");
    }
}

fn transition(spec: &RepoSpec, state: &mut RetryState, next: RetryState) {
    log::debug!(target: LOG_TARGET, "'{spec}': {state} -> {next}");
    *state = next;
}
