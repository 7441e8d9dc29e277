use core::fmt::Write as _;
use ohno::{AppError, IntoAppError, app_err};
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use url::Url;

const LOG_TARGET: &str = "howfairis";

/// Matches a recommendation header such as `(3/5) registry`.
static SECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\(([1-5])/5\)\s*(\w+)").expect("invalid regex"));

const CHECK_PASSED: char = '\u{2713}';

/// The five FAIR-software recommendations, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplianceIndicators {
    /// Publicly accessible with version control
    pub repository: bool,
    pub license: bool,
    /// Published in a community registry
    pub registry: bool,
    /// Citation metadata present
    pub citation: bool,
    /// Uses a software quality checklist
    pub checklist: bool,
}

/// How a compliance check failed.
#[derive(Debug)]
pub enum CheckError {
    /// The checker could not be run at all.
    Unavailable(AppError),

    /// The checker ran and reported an error; its message is passed through as-is.
    Reported(AppError),
}

/// External capability that evaluates a repository against the FAIR recommendations.
pub trait ComplianceChecker {
    fn check(&self, url: &Url) -> impl Future<Output = Result<ComplianceIndicators, CheckError>> + Send;
}

/// Runs the `howfairis` command for each repository.
#[derive(Debug, Clone)]
pub struct HowfairisCommand {
    program: String,
    args: Vec<String>,
    api_key: Option<String>,
}

impl HowfairisCommand {
    /// Create a checker from a command line; the repository URL is appended as the last argument.
    ///
    /// When both GitHub credential parts are supplied they are handed to the tool through
    /// `APIKEY_GITHUB`, which lifts it from the anonymous quota.
    pub fn new(command: &[String], github_user: Option<&str>, github_token: Option<&str>) -> crate::Result<Self> {
        let (program, args) = command.split_first().into_app_err("the compliance command is empty")?;

        let api_key = match (github_user, github_token) {
            (Some(user), Some(token)) => Some(format!("{user}:{token}")),
            _ => None,
        };

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            api_key,
        })
    }
}

impl ComplianceChecker for HowfairisCommand {
    async fn check(&self, url: &Url) -> Result<ComplianceIndicators, CheckError> {
        let mut command = tokio::process::Command::new(&self.program);
        let _ = command
            .args(&self.args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(key) = &self.api_key {
            let _ = command.env("APIKEY_GITHUB", key);
        }

        log::debug!(target: LOG_TARGET, "Running '{}' for {url}", self.program);

        let output = command
            .output()
            .await
            .into_app_err_with(|| format!("running '{}'", self.program))
            .map_err(CheckError::Unavailable)?;

        // The tool exits non-zero whenever a recommendation is unmet, so a complete report wins over the status.
        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_howfairis_output(&stdout) {
            Ok(indicators) => {
                if !output.status.success() {
                    log::debug!(target: LOG_TARGET, "'{}' exited with {} after a complete report for {url}", self.program, output.status);
                }
                Ok(indicators)
            }
            Err(e) if output.status.success() => Err(CheckError::Reported(e)),
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
                Err(CheckError::Reported(app_err!("{message}")))
            }
        }
    }
}

/// Read the five recommendation sections out of a `howfairis` report.
///
/// A recommendation counts as met when any check listed under its section header passed.
pub fn parse_howfairis_output(output: &str) -> crate::Result<ComplianceIndicators> {
    let mut seen = [false; 5];
    let mut met = [false; 5];
    let mut current: Option<usize> = None;

    for line in output.lines() {
        if let Some(captures) = SECTION_REGEX.captures(line) {
            let index = captures[1].parse::<usize>().map_or(0, |n| n - 1);
            seen[index] = true;
            current = Some(index);
            continue;
        }

        if let Some(index) = current
            && line.contains(CHECK_PASSED)
        {
            met[index] = true;
        }
    }

    if !seen.iter().all(|s| *s) {
        let mut missing = String::new();
        for (i, _) in seen.iter().enumerate().filter(|(_, s)| !**s) {
            let _ = write!(missing, " ({}/5)", i + 1);
        }
        return Err(app_err!("howfairis report is missing section(s){missing}: {}", output.trim()));
    }

    let [repository, license, registry, citation, checklist] = met;
    Ok(ComplianceIndicators {
        repository,
        license,
        registry,
        citation,
        checklist,
    })
}
