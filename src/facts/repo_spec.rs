use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display as StrumDisplay, EnumIter, IntoEnumIterator};
use url::Url;

/// Code-hosting platforms a repository address may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumIter)]
pub enum HostKind {
    #[serde(rename = "github.com")]
    #[strum(to_string = "GitHub")]
    GitHub,
    #[serde(rename = "gitlab.com")]
    #[strum(to_string = "GitLab")]
    GitLab,
}

impl HostKind {
    /// Domain the platform serves repositories from.
    #[must_use]
    pub const fn domain(self) -> &'static str {
        match self {
            Self::GitHub => "github.com",
            Self::GitLab => "gitlab.com",
        }
    }

    /// Map a host name to a platform, ignoring case and a leading `www.`.
    #[must_use]
    pub fn from_domain(domain: &str) -> Option<Self> {
        let domain = domain.to_ascii_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain);
        Self::iter().find(|kind| kind.domain() == domain)
    }
}

/// A validated repository address: platform, owner and repository name.
///
/// Computed once per input row and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    url: Arc<Url>,
    host: HostKind,
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse a repository URL, accepting only hosts in `allowed_hosts`.
    ///
    /// The whole address is percent-decoded before the path is split, and the owner and
    /// repository name are the first two non-empty path segments.
    pub fn parse(raw: &str, allowed_hosts: &[HostKind]) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("empty repository URL");
        }

        let decoded = percent_decode_str(raw).decode_utf8_lossy();
        let url = Url::parse(&decoded).into_app_err_with(|| format!("malformed repository URL '{raw}'"))?;

        let domain = url.host_str().unwrap_or_default();
        let Some(host) = HostKind::from_domain(domain) else {
            bail!("unsupported repository host '{domain}' in '{raw}'");
        };

        if !allowed_hosts.contains(&host) {
            bail!("repository host '{domain}' is not in the allowed host list: {raw}");
        }

        // Url::parse re-encodes characters the decoding step exposed; undo that per segment.
        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let [owner, repo, ..] = segments.as_slice() else {
            bail!("invalid repository URL format, expected owner and repository name: {raw}");
        };

        let scheme = url.scheme();
        let clean_url = Url::parse(&format!("{scheme}://{}/{owner}/{repo}", host.domain()))
            .into_app_err("reconstructing repository URL")?;

        Ok(Self {
            url: Arc::new(clean_url),
            host,
            owner: Arc::from(owner.as_str()),
            repo: Arc::from(repo.as_str()),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn host(&self) -> HostKind {
        self.host
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
