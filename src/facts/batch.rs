//! Sequential batch driver.

use super::fetch_outcome::FetchOutcome;
use super::hosting::QuotaSource;
use super::progress::Progress;
use super::repo_spec::{HostKind, RepoSpec};
use super::retry::{Fetcher, RetryOrchestrator};
use core::time::Duration;
use tokio::time::Instant;

const LOG_TARGET: &str = "     batch";

/// Knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Rows between progress checkpoints.
    pub progress_interval: u64,

    /// Pause after every successful fetch.
    pub pacing_delay: Duration,

    /// Stop taking new rows once this much time has passed.
    pub max_run_time: Option<Duration>,

    /// Hosts a row's address may point at.
    pub allowed_hosts: Vec<HostKind>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            progress_interval: 10,
            pacing_delay: Duration::from_secs(1),
            max_run_time: None,
            allowed_hosts: vec![HostKind::GitHub, HostKind::GitLab],
        }
    }
}

/// Row counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,

    /// Rows never looked at because the run deadline passed.
    pub unvisited: usize,
}

/// Successful payloads in input order, each tagged with the index of the row it came from.
#[derive(Debug, Clone)]
pub struct ResultSet<T> {
    entries: Vec<(usize, T)>,
    summary: BatchSummary,
}

impl<T> ResultSet<T> {
    fn new(total: usize) -> Self {
        Self {
            entries: Vec::new(),
            summary: BatchSummary {
                total,
                ..BatchSummary::default()
            },
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// `(row index, payload)` pairs in the order the rows were processed.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries.iter().map(|(index, payload)| (*index, payload))
    }

    /// Payload for the given input row, if that row succeeded.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.entries
            .binary_search_by_key(&row, |(index, _)| *index)
            .ok()
            .map(|pos| &self.entries[pos].1)
    }
}

impl<T> FromIterator<(usize, T)> for ResultSet<T> {
    fn from_iter<I: IntoIterator<Item = (usize, T)>>(iter: I) -> Self {
        let mut entries: Vec<(usize, T)> = iter.into_iter().collect();
        entries.sort_by_key(|(index, _)| *index);
        let count = entries.len();

        Self {
            entries,
            summary: BatchSummary {
                total: count,
                succeeded: count,
                ..BatchSummary::default()
            },
        }
    }
}

impl<T> IntoIterator for ResultSet<T> {
    type Item = (usize, T);
    type IntoIter = std::vec::IntoIter<(usize, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Drives a fetcher over an ordered list of repository addresses, one row at a time.
#[derive(Debug)]
pub struct BatchRunner<Q> {
    orchestrator: RetryOrchestrator<Q>,
    settings: BatchSettings,
}

impl<Q: QuotaSource> BatchRunner<Q> {
    #[must_use]
    pub const fn new(orchestrator: RetryOrchestrator<Q>, settings: BatchSettings) -> Self {
        Self { orchestrator, settings }
    }

    /// Process every row in order and collect the successful payloads.
    ///
    /// No row failure aborts the run. Invalid addresses and hosts the fetcher cannot handle
    /// are skipped without touching the network.
    pub async fn run<F, S>(&mut self, fetcher: &F, urls: &[S], progress: &dyn Progress) -> ResultSet<F::Payload>
    where
        F: Fetcher,
        S: AsRef<str>,
    {
        let total = urls.len();
        let total_u64 = total as u64;
        let interval = self.settings.progress_interval.max(1);
        let started = Instant::now();
        let mut results = ResultSet::new(total);

        for (index, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            let position = index as u64;

            if let Some(limit) = self.settings.max_run_time
                && started.elapsed() >= limit
            {
                results.summary.unvisited = total - index;
                log::warn!(
                    target: LOG_TARGET,
                    "Run time limit of {}s reached, stopping with {} of {total} row(s) not visited",
                    limit.as_secs(),
                    results.summary.unvisited
                );
                break;
            }

            if position % interval == 0 {
                log::info!(target: LOG_TARGET, "Processed {index} out of {total} repositories");
                progress.checkpoint(position, total_u64);
            }
            progress.advance(position, total_u64);

            let spec = match RepoSpec::parse(url, &self.settings.allowed_hosts) {
                Ok(spec) => spec,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Skipping row {index}: {e:#}");
                    results.summary.skipped += 1;
                    continue;
                }
            };

            if !fetcher.supports(spec.host()) {
                log::warn!(target: LOG_TARGET, "Skipping '{url}': {} repositories are not supported by this operation", spec.host());
                results.summary.skipped += 1;
                continue;
            }

            log::info!(target: LOG_TARGET, "Processing repository: {spec} ({url})");

            match self.orchestrator.execute(fetcher, &spec, progress).await {
                FetchOutcome::Success(payload) => {
                    results.entries.push((index, payload));
                    results.summary.succeeded += 1;
                    tokio::time::sleep(self.settings.pacing_delay).await;
                }
                FetchOutcome::Skipped(_) => results.summary.skipped += 1,
                FetchOutcome::Failed(_) => results.summary.failed += 1,
            }
        }

        progress.advance(total_u64, total_u64);

        let summary = results.summary;
        log::info!(
            target: LOG_TARGET,
            "Finished: {} succeeded, {} skipped, {} failed, {} not visited, out of {total}",
            summary.succeeded,
            summary.skipped,
            summary.failed,
            summary.unvisited
        );

        results
    }
}
