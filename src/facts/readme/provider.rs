use crate::facts::hosting::{Client, ContentEntry, HostingApiResult};
use crate::facts::{FetchError, Fetcher, HostKind, RateLimiter, RepoSpec};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const LOG_TARGET: &str = "    readme";

pub const README_START: &str = "README_start";
pub const README_END: &str = "README_end";

/// Fetches README text through the GitHub contents API.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Retrieve the body of one directory entry, preferring inline content over a download.
    async fn entry_text(&self, spec: &RepoSpec, entry: &ContentEntry, limiter: &mut RateLimiter) -> Result<Option<String>, FetchError> {
        if let Some(text) = entry.content.as_deref().and_then(|content| decode_inline(content, entry.encoding.as_deref())) {
            return Ok(Some(text));
        }

        let Some(download_url) = entry.download_url.as_deref() else {
            log::debug!(target: LOG_TARGET, "'{}' in '{spec}' has neither inline content nor a download link", entry.name);
            return Ok(None);
        };

        match self.client.download_text(download_url).await {
            HostingApiResult::Transient(e) => {
                log::warn!(target: LOG_TARGET, "Could not download '{download_url}': {e:#}");
                Ok(None)
            }
            HostingApiResult::NotFound(rate_limit) => {
                limiter.record(rate_limit);
                log::warn!(target: LOG_TARGET, "Download link '{download_url}' for '{spec}' no longer exists");
                Ok(None)
            }
            other => other.into_fetch_result(limiter, "README download").map(Some),
        }
    }
}

impl Fetcher for ContentFetcher {
    type Payload = String;

    fn supports(&self, host: HostKind) -> bool {
        host == HostKind::GitHub
    }

    async fn fetch(&self, spec: &RepoSpec, limiter: &mut RateLimiter) -> Result<String, FetchError> {
        let entries = self
            .client
            .list_root_contents(spec.owner(), spec.repo())
            .await
            .into_fetch_result(limiter, "repository contents")?;

        let candidates = entries.iter().filter(|entry| is_readme_name(&entry.name));
        let mut matched = false;

        for entry in candidates {
            matched = true;
            log::debug!(target: LOG_TARGET, "Found '{}' in '{spec}'", entry.path);

            if let Some(text) = self.entry_text(spec, entry, limiter).await? {
                return Ok(sanitize_readme(&text));
            }
        }

        if matched {
            Err(FetchError::NotFound(format!("README of '{spec}' could not be retrieved")))
        } else {
            Err(FetchError::NotFound(format!("no README in '{spec}'")))
        }
    }
}

fn is_readme_name(name: &str) -> bool {
    name.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("readme"))
}

/// Decode an inline base64 body. The API wraps the encoded text every 60 columns.
fn decode_inline(content: &str, encoding: Option<&str>) -> Option<String> {
    if encoding.is_some_and(|e| !e.eq_ignore_ascii_case("base64")) {
        return None;
    }

    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            log::debug!(target: LOG_TARGET, "Inline README content is not valid base64: {e}");
            None
        }
    }
}

/// Replace field delimiters with spaces and wrap the text in sentinel markers.
#[must_use]
pub fn sanitize_readme(text: &str) -> String {
    let cleaned = text.replace([',', ';'], " ");
    format!("{README_START}\n{cleaned}\n{README_END}")
}
