use crate::Result;
use crate::facts::HostKind;
use crate::facts::downloads::RegistryEndpoints;
use crate::facts::hosting::DEFAULT_SECONDARY_LIMIT_WAIT;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Attempts per repository before giving up on it
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after a timeout or connection failure
    #[serde(default = "default_transient_retry_delay", with = "humantime_serde")]
    pub transient_retry_delay: Duration,

    /// Pause after every successful fetch
    #[serde(default = "default_pacing_delay", with = "humantime_serde")]
    pub pacing_delay: Duration,

    /// Extra time added to every quota reset wait
    #[serde(default = "default_quota_safety_margin", with = "humantime_serde")]
    pub quota_safety_margin: Duration,

    /// Back-off after a 403 that leaves the primary quota untouched
    #[serde(default = "default_secondary_rate_limit_wait", with = "humantime_serde")]
    pub secondary_rate_limit_wait: Duration,

    /// Wait used when the quota cannot be queried
    #[serde(default = "default_quota_fallback_cooldown", with = "humantime_serde")]
    pub quota_fallback_cooldown: Duration,

    /// Timeout for README downloads and registry lookups
    #[serde(default = "default_download_timeout", with = "humantime_serde")]
    pub download_timeout: Duration,

    /// Timeout for other API requests
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Rows between progress checkpoints
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Overall time budget of a run
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub max_run_time: Option<Duration>,

    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Code-hosting domains repository addresses may point at
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<HostKind>,

    /// Field delimiter of the input file
    #[serde(default = "default_input_delimiter")]
    pub input_delimiter: String,

    #[serde(default = "default_pypi_stats_url")]
    pub pypi_stats_url: String,

    #[serde(default = "default_cran_stats_url")]
    pub cran_stats_url: String,

    #[serde(default = "default_npm_stats_url")]
    pub npm_stats_url: String,

    /// Compliance checker command line; the repository URL is appended
    #[serde(default = "default_compliance_command")]
    pub compliance_command: Vec<String>,
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_transient_retry_delay() -> Duration {
    Duration::from_secs(5)
}

const fn default_pacing_delay() -> Duration {
    Duration::from_secs(1)
}

const fn default_quota_safety_margin() -> Duration {
    Duration::from_secs(2)
}

const fn default_secondary_rate_limit_wait() -> Duration {
    DEFAULT_SECONDARY_LIMIT_WAIT
}

const fn default_quota_fallback_cooldown() -> Duration {
    Duration::from_mins(20)
}

const fn default_download_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_progress_interval() -> u64 {
    10
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_allowed_hosts() -> Vec<HostKind> {
    vec![HostKind::GitHub, HostKind::GitLab]
}

fn default_input_delimiter() -> String {
    ";".to_string()
}

fn default_pypi_stats_url() -> String {
    RegistryEndpoints::default().pypi
}

fn default_cran_stats_url() -> String {
    RegistryEndpoints::default().cran
}

fn default_npm_stats_url() -> String {
    RegistryEndpoints::default().npm
}

fn default_compliance_command() -> Vec<String> {
    vec!["howfairis".to_string()]
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `harvest.toml` in `base_dir` is used when it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("No '{path}' found, using the default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config
            .validate()
            .map_err(|e| e.enrich_with(|| format!("validating configuration file '{final_path}'")))?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// The input delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        match self.input_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => bail!("input_delimiter must be a single ASCII character, got '{}'", self.input_delimiter),
        }
    }

    #[must_use]
    pub fn registry_endpoints(&self) -> RegistryEndpoints {
        RegistryEndpoints {
            pypi: self.pypi_stats_url.clone(),
            cran: self.cran_stats_url.clone(),
            npm: self.npm_stats_url.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }

        if self.progress_interval == 0 {
            bail!("progress_interval must be at least 1");
        }

        if self.allowed_hosts.is_empty() {
            bail!("allowed_hosts must name at least one host");
        }

        let _ = self.delimiter()?;

        if self.compliance_command.first().is_none_or(|program| program.trim().is_empty()) {
            bail!("compliance_command must name a program");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            transient_retry_delay: default_transient_retry_delay(),
            pacing_delay: default_pacing_delay(),
            quota_safety_margin: default_quota_safety_margin(),
            secondary_rate_limit_wait: default_secondary_rate_limit_wait(),
            quota_fallback_cooldown: default_quota_fallback_cooldown(),
            download_timeout: default_download_timeout(),
            request_timeout: default_request_timeout(),
            progress_interval: default_progress_interval(),
            max_run_time: None,
            github_api_url: default_github_api_url(),
            allowed_hosts: default_allowed_hosts(),
            input_delimiter: default_input_delimiter(),
            pypi_stats_url: default_pypi_stats_url(),
            cran_stats_url: default_cran_stats_url(),
            npm_stats_url: default_npm_stats_url(),
            compliance_command: default_compliance_command(),
        }
    }
}
