use super::Host;
use super::common::{CommonArgs, Session};
use crate::Result;
use crate::facts::Progress;
use crate::facts::readme::ContentFetcher;
use crate::reports::{InputTable, write_readme};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Parser, Debug)]
pub struct ReadmeArgs {
    /// Delimited file listing repositories in an `html_url` column
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Utf8PathBuf,

    /// Where to write the input rows with an added `readme` column
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Fetch the README of every repository in the input file.
pub async fn harvest_readmes<H: Host>(host: &mut H, args: &ReadmeArgs) -> Result<()> {
    let session = Session::new(host, &args.common)?;
    let table = InputTable::load(&args.input, session.config.delimiter()?)?;

    let client = session.hosting_client()?;
    let fetcher = ContentFetcher::new(client.clone());
    let mut runner = session.batch_runner(client);

    let urls = table.urls();
    session.progress.set_phase("Fetching");
    let readmes = runner.run(&fetcher, &urls, &session.progress).await;
    session.progress.done();

    let file = File::create(&args.output).into_app_err_with(|| format!("creating output file '{}'", args.output))?;
    let mut writer = BufWriter::new(file);
    write_readme(&table, &readmes, &mut writer)?;
    writer.flush().into_app_err_with(|| format!("writing output file '{}'", args.output))?;

    let _ = writeln!(
        host.output(),
        "Successfully retrieved READMEs for {} out of {} repositories. Saved result to {}.",
        readmes.len(),
        table.len(),
        args.output
    );

    Ok(())
}
