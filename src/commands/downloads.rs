use super::Host;
use super::common::{CommonArgs, Session};
use crate::Result;
use crate::facts::downloads::DownloadStatsClient;
use crate::facts::{Progress, RepoSpec};
use crate::reports::{InputTable, write_downloads};
use camino::Utf8PathBuf;
use chrono::Local;
use clap::Parser;
use ohno::{IntoAppError, bail};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};

const LOG_TARGET: &str = " downloads";

#[derive(Parser, Debug)]
pub struct DownloadsArgs {
    /// README file produced by the `readme` command
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Utf8PathBuf,

    /// Where to write the download statistics
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Look up registry download counts for repositories whose README shows how to install them.
pub async fn collect_download_stats<H: Host>(host: &mut H, args: &DownloadsArgs) -> Result<()> {
    let session = Session::new(host, &args.common)?;
    let table = InputTable::load(&args.input, b',')?;
    let Some(readme_column) = table.column("readme") else {
        bail!("no 'readme' column in '{}', expected the output of the readme command", args.input);
    };

    let mut repos = Vec::new();
    for (row, url) in table.urls().into_iter().enumerate() {
        let readme = table.value(row, readme_column);
        if readme.is_empty() {
            continue;
        }

        match RepoSpec::parse(url, &session.config.allowed_hosts) {
            Ok(spec) => repos.push((spec, readme)),
            Err(e) => log::warn!(target: LOG_TARGET, "Skipping row {row}: {e:#}"),
        }
    }

    let client = DownloadStatsClient::new(session.config.registry_endpoints(), session.config.download_timeout)?;
    session.progress.set_phase("Looking up");
    let records = client.collect(&repos, &session.progress).await;
    session.progress.done();

    let file = File::create(&args.output).into_app_err_with(|| format!("creating output file '{}'", args.output))?;
    let mut writer = BufWriter::new(file);
    write_downloads(&records, Local::now().date_naive(), &mut writer)?;
    writer.flush().into_app_err_with(|| format!("writing output file '{}'", args.output))?;

    let found: HashSet<(&str, &str)> = records.iter().map(|r| (r.owner.as_str(), r.repository_name.as_str())).collect();
    let _ = writeln!(
        host.output(),
        "Successfully retrieved download statistics for {} out of {} repositories. Saved result to {}.",
        found.len(),
        table.len(),
        args.output
    );

    Ok(())
}
