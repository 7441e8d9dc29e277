//! Quota bookkeeping for the hosting API.
//!
//! The limiter holds the most recent view of the API quota and answers one question before
//! every request: how long must the caller sleep first? It is owned by a single processing
//! task, so it needs no interior synchronization.

use super::hosting::{QuotaSource, RateLimitInfo};
use chrono::{DateTime, Utc};
use core::time::Duration;

const LOG_TARGET: &str = "     quota";

/// Snapshot of the API quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl From<RateLimitInfo> for QuotaState {
    fn from(info: RateLimitInfo) -> Self {
        Self {
            remaining: info.remaining,
            reset_at: info.reset_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Option<QuotaState>,
    cooldown_until: Option<DateTime<Utc>>,
    safety_margin: Duration,
    fallback_cooldown: Duration,
}

impl RateLimiter {
    /// Create a limiter with no quota knowledge yet.
    ///
    /// `safety_margin` is added to every wait computed from a reset time, and
    /// `fallback_cooldown` is used when the quota cannot be queried at all.
    #[must_use]
    pub const fn new(safety_margin: Duration, fallback_cooldown: Duration) -> Self {
        Self {
            state: None,
            cooldown_until: None,
            safety_margin,
            fallback_cooldown,
        }
    }

    /// Current quota snapshot, if one has been observed.
    #[must_use]
    pub const fn state(&self) -> Option<QuotaState> {
        self.state
    }

    /// How long the caller must pause before issuing the next request.
    ///
    /// Zero while quota remains. With the quota exhausted, the time left until the reset plus
    /// the safety margin; this never grows as `now` advances towards the reset.
    #[must_use]
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        let cooldown = self
            .cooldown_until
            .map_or(Duration::ZERO, |until| until_or_zero(until, now));

        let quota_wait = match self.state {
            Some(state) if state.remaining == 0 => until_or_zero(state.reset_at, now) + self.safety_margin,
            _ => Duration::ZERO,
        };

        cooldown.max(quota_wait)
    }

    /// Fold in rate-limit information observed on a response.
    pub fn record(&mut self, info: Option<RateLimitInfo>) {
        let Some(info) = info else {
            return;
        };

        log::trace!(target: LOG_TARGET, "{} request(s) remaining, window resets at {}", info.remaining, info.reset_at);
        self.state = Some(info.into());
    }

    /// Ask the API for the live quota.
    ///
    /// If the quota query itself fails, arm the fallback cooldown instead of retrying straight
    /// away, so an unreachable status endpoint does not turn into a tight retry loop.
    pub async fn refresh<Q: QuotaSource>(&mut self, source: &Q, now: DateTime<Utc>) {
        match source.query_quota().await {
            Ok(info) => {
                log::debug!(target: LOG_TARGET, "Quota status: {} remaining, resets at {}", info.remaining, info.reset_at);
                self.state = Some(info.into());
            }
            Err(e) => {
                log::warn!(
                    target: LOG_TARGET,
                    "Could not check rate limit: {e:#}. Cooling down for {} minute(s)",
                    self.fallback_cooldown.as_secs() / 60
                );
                let cooldown = chrono::Duration::from_std(self.fallback_cooldown).unwrap_or(chrono::Duration::MAX);
                self.cooldown_until = Some(now.checked_add_signed(cooldown).unwrap_or(DateTime::<Utc>::MAX_UTC));
            }
        }
    }

    /// Forget the snapshot once the caller has served the wait it implied.
    ///
    /// The next response's headers re-establish the quota state.
    pub fn mark_waited(&mut self) {
        self.state = None;
        self.cooldown_until = None;
    }
}

fn until_or_zero(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (deadline - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use ohno::app_err;

    const MARGIN: Duration = Duration::from_secs(2);
    const COOLDOWN: Duration = Duration::from_mins(20);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200 + secs, 0).unwrap()
    }

    fn info(remaining: u64, reset_at: DateTime<Utc>) -> RateLimitInfo {
        RateLimitInfo { remaining, reset_at }
    }

    struct FixedQuota(RateLimitInfo);

    impl QuotaSource for FixedQuota {
        async fn query_quota(&self) -> Result<RateLimitInfo> {
            Ok(self.0)
        }
    }

    struct BrokenQuota;

    impl QuotaSource for BrokenQuota {
        async fn query_quota(&self) -> Result<RateLimitInfo> {
            Err(app_err!("connection refused"))
        }
    }

    #[test]
    fn test_no_wait_without_state() {
        let limiter = RateLimiter::new(MARGIN, COOLDOWN);
        assert_eq!(limiter.wait_duration(at(0)), Duration::ZERO);
    }

    #[test]
    fn test_no_wait_while_quota_remains() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(1, at(600))));

        assert_eq!(limiter.wait_duration(at(0)), Duration::ZERO);
    }

    #[test]
    fn test_wait_until_reset_when_exhausted() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(0, at(600))));

        let wait = limiter.wait_duration(at(0));
        assert!(wait >= Duration::from_secs(600));
        assert_eq!(wait, Duration::from_secs(602));
    }

    #[test]
    fn test_wait_is_non_increasing_as_time_advances() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(0, at(120))));

        let mut previous = Duration::MAX;
        for t in (0..200).step_by(7) {
            let wait = limiter.wait_duration(at(t));
            assert!(wait <= previous, "wait grew from {previous:?} to {wait:?} at t={t}");
            assert!(wait > Duration::ZERO);
            previous = wait;
        }
    }

    #[test]
    fn test_wait_after_reset_is_margin_only() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(0, at(10))));

        assert_eq!(limiter.wait_duration(at(50)), MARGIN);
    }

    #[test]
    fn test_record_none_keeps_state() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(7, at(10))));
        limiter.record(None);

        assert_eq!(limiter.state().map(|s| s.remaining), Some(7));
    }

    #[test]
    fn test_mark_waited_clears_state() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.record(Some(info(0, at(600))));
        limiter.mark_waited();

        assert!(limiter.state().is_none());
        assert_eq!(limiter.wait_duration(at(0)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_refresh_updates_state() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.refresh(&FixedQuota(info(0, at(30))), at(0)).await;

        assert_eq!(limiter.wait_duration(at(0)), Duration::from_secs(32));
    }

    #[tokio::test]
    async fn test_refresh_failure_arms_fallback_cooldown() {
        let mut limiter = RateLimiter::new(MARGIN, COOLDOWN);
        limiter.refresh(&BrokenQuota, at(0)).await;

        assert_eq!(limiter.wait_duration(at(0)), COOLDOWN);
        assert_eq!(limiter.wait_duration(at(60)), COOLDOWN - Duration::from_secs(60));
        assert_eq!(limiter.wait_duration(at(20 * 60)), Duration::ZERO);
    }
}
