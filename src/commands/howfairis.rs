use super::Host;
use super::common::{CommonArgs, Session};
use crate::Result;
use crate::facts::Progress;
use crate::facts::compliance::{ComplianceFetcher, HowfairisCommand};
use crate::reports::{InputTable, write_compliance};
use camino::Utf8PathBuf;
use chrono::Local;
use clap::Parser;
use ohno::IntoAppError;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Parser, Debug)]
pub struct HowfairisArgs {
    /// Delimited file listing repositories in an `html_url` column
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Utf8PathBuf,

    /// Where to write the compliance indicators
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Collect the five fair-software.eu recommendations for every repository in the input file.
pub async fn harvest_compliance<H: Host>(host: &mut H, args: &HowfairisArgs) -> Result<()> {
    let session = Session::new(host, &args.common)?;
    let table = InputTable::load(&args.input, session.config.delimiter()?)?;

    let checker = HowfairisCommand::new(&session.config.compliance_command, session.github_user(), session.github_token())?;
    let fetcher = ComplianceFetcher::new(checker);
    let mut runner = session.batch_runner(session.hosting_client()?);

    let urls = table.urls();
    session.progress.set_phase("Checking");
    let reports = runner.run(&fetcher, &urls, &session.progress).await;
    session.progress.done();

    let file = File::create(&args.output).into_app_err_with(|| format!("creating output file '{}'", args.output))?;
    let mut writer = BufWriter::new(file);
    write_compliance(&reports, Local::now().date_naive(), &mut writer)?;
    writer.flush().into_app_err_with(|| format!("writing output file '{}'", args.output))?;

    let _ = writeln!(
        host.output(),
        "Successfully retrieved howfairis variables for {} out of {} repositories. Saved result to {}.",
        reports.len(),
        table.len(),
        args.output
    );

    Ok(())
}
