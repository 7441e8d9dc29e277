//! Package registry download statistics
//!
//! Install instructions in a README hint at where a project is published. [`detect_packages`]
//! looks for `pip install`, `install.packages(...)` and `npm install` lines, and
//! [`DownloadStatsClient`] asks the matching registry's statistics service for last month's
//! download count.
//!
//! The detection is a plain text heuristic, not a parser for any installer's syntax.

mod detect;
mod provider;

pub use detect::{PackageRef, Registry, detect_packages};
pub use provider::{DownloadRecord, DownloadStatsClient, RegistryEndpoints};
