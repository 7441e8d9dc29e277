use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use strum::Display;

static PIP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"pip install( -+.*)* (.*?)[\\\s]").expect("invalid regex"));
static CRAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"install\.packages\(["'](.*?)["']\)"#).expect("invalid regex"));
static NPM_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"npm (i|install)( -+.*)* (.*)").expect("invalid regex"));

/// Registries with a public download statistics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
pub enum Registry {
    #[strum(to_string = "pypi")]
    #[serde(rename = "pypi")]
    PyPi,
    #[strum(to_string = "cran")]
    #[serde(rename = "cran")]
    Cran,
    #[strum(to_string = "npm")]
    #[serde(rename = "npm")]
    Npm,
}

/// A package a README says the repository is published as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub registry: Registry,
    pub package: String,
}

/// Find the packages a README's install instructions point at.
///
/// PyPI and CRAN instructions must name the repository exactly. An npm instruction only has
/// to mention the repository name; if the instruction names a scoped package (anything with
/// an `@`) that name is used verbatim, otherwise the repository name is. Only the first
/// qualifying instruction per registry is used.
#[must_use]
pub fn detect_packages(readme: &str, repo_name: &str) -> Vec<PackageRef> {
    let mut found = Vec::new();

    if PIP_REGEX.captures_iter(readme).any(|c| c.get(2).is_some_and(|m| m.as_str() == repo_name)) {
        found.push(PackageRef {
            registry: Registry::PyPi,
            package: repo_name.to_string(),
        });
    }

    if CRAN_REGEX.captures_iter(readme).any(|c| c.get(1).is_some_and(|m| m.as_str() == repo_name)) {
        found.push(PackageRef {
            registry: Registry::Cran,
            package: repo_name.to_string(),
        });
    }

    let npm_target = NPM_REGEX
        .captures_iter(readme)
        .filter_map(|c| c.get(3).map(|m| m.as_str()))
        .find(|target| target.contains(repo_name));

    if let Some(target) = npm_target {
        let package = if target.contains('@') { target.trim() } else { repo_name };
        found.push(PackageRef {
            registry: Registry::Npm,
            package: package.to_string(),
        });
    }

    found
}
