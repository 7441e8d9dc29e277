//! Harvest repository metadata from code-hosting platforms.
//!
//! # Quick Start
//!
//! Fetch the README of every repository listed in a `;`-delimited CSV file:
//!
//! ```bash
//! repo-harvest readme --input repositories.csv --output readme.csv
//! ```
//!
//! Retrieve the five fair-software.eu recommendations for the same list
//! (requires the `howfairis` command to be installed):
//!
//! ```bash
//! repo-harvest howfairis --input repositories.csv --output howfairis.csv
//! ```
//!
//! Look up package registry download counts for repositories whose README
//! mentions an install command:
//!
//! ```bash
//! repo-harvest downloads --input readme.csv --output download_stats.csv
//! ```
//!
//! # Credentials
//!
//! A GitHub token raises the API quota considerably. Supply it with `--github-token` or the
//! `GITHUB_TOKEN` environment variable. Without a token the harvest still runs, only slower.
//!
//! # Configuration
//!
//! Retry and pacing behavior is read from `harvest.toml` in the current directory when present.
//! Run `repo-harvest init` to write a commented default file.

use repo_harvest::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that talks to the real process streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }
}

#[tokio::main]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
