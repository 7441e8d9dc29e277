//! Command dispatch logic for repo-harvest

use super::{
    DownloadsArgs, HowfairisArgs, InitArgs, ReadmeArgs, collect_download_stats, harvest_compliance, harvest_readmes, init_config,
};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-harvest", author, version, long_about = None)]
#[command(about = "Harvest README text and FAIR-compliance indicators for lists of repositories")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: HarvestSubcommand,
}

#[derive(Subcommand, Debug)]
enum HarvestSubcommand {
    /// Fetch the README of every listed repository
    Readme(Box<ReadmeArgs>),
    /// Collect howfairis compliance indicators for every listed repository
    Howfairis(Box<HowfairisArgs>),
    /// Look up package registry download counts from harvested READMEs
    Downloads(Box<DownloadsArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        HarvestSubcommand::Readme(readme_args) => harvest_readmes(host, readme_args).await,
        HarvestSubcommand::Howfairis(howfairis_args) => harvest_compliance(host, howfairis_args).await,
        HarvestSubcommand::Downloads(downloads_args) => collect_download_stats(host, downloads_args).await,
        HarvestSubcommand::Init(init_args) => init_config(host, init_args),
    }
}
