use super::detect::{PackageRef, Registry, detect_packages};
use crate::Result;
use crate::facts::{Progress, RepoSpec};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = " downloads";

/// Base URLs of the registry statistics services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoints {
    pub pypi: String,
    pub cran: String,
    pub npm: String,
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            pypi: "https://pypistats.org".to_string(),
            cran: "https://cranlogs.r-pkg.org".to_string(),
            npm: "https://api.npmjs.org".to_string(),
        }
    }
}

/// Last month's downloads of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRecord {
    pub repository_name: String,
    pub owner: String,
    pub registry: Registry,
    pub last_month: u64,
}

#[derive(Debug, Deserialize)]
struct PypiRecent {
    data: PypiRecentData,
}

#[derive(Debug, Deserialize)]
struct PypiRecentData {
    last_month: u64,
}

#[derive(Debug, Deserialize)]
struct CranTotal {
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct NpmPoint {
    downloads: u64,
}

/// Queries registry statistics services for packages mentioned in READMEs.
#[derive(Debug, Clone)]
pub struct DownloadStatsClient {
    client: reqwest::Client,
    endpoints: RegistryEndpoints,
}

impl DownloadStatsClient {
    pub fn new(endpoints: RegistryEndpoints, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("repo-harvest")
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoints })
    }

    /// Look up every package the READMEs point at.
    ///
    /// Lookups that fail are logged and left out. The records come back sorted by owner, then
    /// repository name.
    pub async fn collect<S: AsRef<str>>(&self, repos: &[(RepoSpec, S)], progress: &dyn Progress) -> Vec<DownloadRecord> {
        let mut records = Vec::new();
        let total = repos.len() as u64;

        for (index, (spec, readme)) in repos.iter().enumerate() {
            progress.advance(index as u64, total);

            for package in detect_packages(readme.as_ref(), spec.repo()) {
                log::info!(target: LOG_TARGET, "Download stats for {} package '{}' of '{spec}'", package.registry, package.package);

                match self.last_month(&package).await {
                    Ok(last_month) => records.push(DownloadRecord {
                        repository_name: spec.repo().to_string(),
                        owner: spec.owner().to_string(),
                        registry: package.registry,
                        last_month,
                    }),
                    Err(e) => log::warn!(target: LOG_TARGET, "Could not get download stats for '{}': {e:#}", package.package),
                }
            }
        }

        progress.advance(total, total);

        records.sort_by(|a, b| a.owner.cmp(&b.owner).then_with(|| a.repository_name.cmp(&b.repository_name)));
        records
    }

    /// Downloads over the last month for one package.
    pub async fn last_month(&self, package: &PackageRef) -> Result<u64> {
        let name = &package.package;

        match package.registry {
            Registry::PyPi => {
                let url = format!("{}/api/packages/{name}/recent", self.endpoints.pypi.trim_end_matches('/'));
                let body: PypiRecent = self.get_json(&url).await?;
                Ok(body.data.last_month)
            }
            Registry::Cran => {
                let url = format!("{}/downloads/total/last-month/{name}", self.endpoints.cran.trim_end_matches('/'));
                let body: Vec<CranTotal> = self.get_json(&url).await?;
                let Some(first) = body.first() else {
                    bail!("no download statistics for CRAN package '{name}'");
                };
                Ok(first.downloads)
            }
            Registry::Npm => {
                let url = format!("{}/downloads/point/last-month/{name}", self.endpoints.npm.trim_end_matches('/'));
                let body: NpmPoint = self.get_json(&url).await?;
                Ok(body.downloads)
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.client
            .get(url)
            .send()
            .await
            .into_app_err_with(|| format!("requesting '{url}'"))?
            .error_for_status()
            .into_app_err_with(|| format!("requesting '{url}'"))?
            .json()
            .await
            .into_app_err_with(|| format!("parsing response from '{url}'"))
    }
}
