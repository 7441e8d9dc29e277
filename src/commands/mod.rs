//! Command-line interface and orchestration for repo-harvest
//!
//! The `run` function parses the command line with clap and routes to one handler per
//! subcommand:
//!
//! - **readme**: fetch README text for every repository in a delimited input file
//! - **howfairis**: collect FAIR-compliance indicators through the external `howfairis` tool
//! - **downloads**: look up registry download counts for packages named in harvested READMEs
//! - **init**: write a commented default configuration file
//!
//! The harvesting commands share their setup through `common::Session`: logging, the
//! optional `harvest.toml` configuration, credentials, the hosting API client and the
//! progress display. Each then loads its input, drives a batch, and writes one CSV file.

mod common;
mod config;
mod downloads;
mod host;
mod howfairis;
mod init;
mod progress_reporter;
mod readme;
mod run;

pub use common::{ColorMode, CommonArgs, LogLevel};
pub use config::Config;
pub use downloads::{DownloadsArgs, collect_download_stats};
pub use host::Host;
pub use howfairis::{HowfairisArgs, harvest_compliance};
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use readme::{ReadmeArgs, harvest_readmes};
pub use run::run;
