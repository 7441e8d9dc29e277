//! Setup shared by the harvesting commands.

use super::config::Config;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::facts::hosting::Client;
use crate::facts::{BatchRunner, BatchSettings, RateLimiter, RetryOrchestrator, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use std::io::Write;

const LOG_TARGET: &str = "   harvest";

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by the harvesting commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub user name, passed to the compliance checker together with the token
    #[arg(long, value_name = "USER", env = "GITHUB_USER")]
    pub github_user: Option<String>,

    /// Path to configuration file (default is `harvest.toml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

/// Everything a harvesting command needs, built once per run.
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub progress: ProgressReporter,
    github_token: Option<String>,
    github_user: Option<String>,
}

impl Session {
    /// Initialize logging, load the configuration and prepare the progress display.
    pub fn new<H: Host>(host: &mut H, args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;

        let github_token = args.github_token.clone().filter(|t| !t.trim().is_empty());
        if github_token.is_none() {
            log::warn!(target: LOG_TARGET, "No GitHub token supplied, running with the anonymous API quota");
            if args.log_level == LogLevel::None {
                let _ = writeln!(
                    host.error(),
                    "warning: no GitHub token supplied (--github-token or GITHUB_TOKEN), requests will be heavily rate limited"
                );
            }
        }

        let use_colors = match args.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stderr};
                stderr().is_terminal()
            }
        };

        Ok(Self {
            config,
            progress: ProgressReporter::new(args.log_level == LogLevel::None, use_colors),
            github_token,
            github_user: args.github_user.clone(),
        })
    }

    #[must_use]
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    #[must_use]
    pub fn github_user(&self) -> Option<&str> {
        self.github_user.as_deref()
    }

    /// GitHub API client built from the configured endpoint and timeouts.
    pub fn hosting_client(&self) -> Result<Client> {
        Ok(Client::new(
            self.github_token(),
            self.config.github_api_url.as_str(),
            self.config.request_timeout,
            self.config.download_timeout,
        )?
        .with_secondary_limit_wait(self.config.secondary_rate_limit_wait))
    }

    /// Batch runner whose quota bookkeeping is backed by `client`.
    #[must_use]
    pub fn batch_runner(&self, client: Client) -> BatchRunner<Client> {
        let config = &self.config;

        let orchestrator = RetryOrchestrator::new(
            RateLimiter::new(config.quota_safety_margin, config.quota_fallback_cooldown),
            client,
            RetryPolicy {
                max_attempts: config.max_attempts,
                transient_delay: config.transient_retry_delay,
            },
        );

        BatchRunner::new(
            orchestrator,
            BatchSettings {
                progress_interval: config.progress_interval,
                pacing_delay: config.pacing_delay,
                max_run_time: config.max_run_time,
                allowed_hosts: config.allowed_hosts.clone(),
            },
        )
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when several commands run in one process.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
