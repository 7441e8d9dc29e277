//! Per-repository data collection
//!
//! This module fetches data about individual repositories from a code-hosting API while
//! staying inside the API's request quota. It is organized leaves first:
//!
//! - [`RepoSpec`] validates and decomposes a repository address.
//! - [`RateLimiter`] tracks the remaining quota and decides how long to pause.
//! - [`readme::ContentFetcher`] retrieves a repository's README text.
//! - [`compliance::ComplianceFetcher`] asks an external checker for FAIR indicators.
//! - [`RetryOrchestrator`] wraps a single fetch in a retry state machine.
//! - [`BatchRunner`] drives the orchestrator over an ordered list of rows.
//!
//! Rows are processed strictly one at a time. The quota state is owned by the orchestrator
//! and never shared, so no locking is involved.
//!
//! Row-level failures never abort a batch. Each row ends up as a [`FetchOutcome`], and only
//! successful payloads land in the [`ResultSet`].

mod batch;
pub mod compliance;
pub mod downloads;
mod fetch_error;
mod fetch_outcome;
pub mod hosting;
mod progress;
mod rate_limiter;
pub mod readme;
mod repo_spec;
mod retry;

pub use batch::{BatchRunner, BatchSettings, BatchSummary, ResultSet};
pub use fetch_error::FetchError;
pub use fetch_outcome::FetchOutcome;
pub use progress::{NoProgress, Progress};
pub use rate_limiter::{QuotaState, RateLimiter};
pub use repo_spec::{HostKind, RepoSpec};
pub use retry::{Fetcher, RetryOrchestrator, RetryPolicy, RetryState};
