//! GitHub repository references found in resume text, and README retrieval for
//! project analysis.

use std::collections::BTreeSet;

use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// Top-level GitHub paths that look like `<owner>/<repo>` but are not repositories.
const RESERVED_OWNERS: &[&str] = &[
    "orgs",
    "settings",
    "features",
    "topics",
    "marketplace",
    "sponsors",
];

#[derive(Debug, Error)]
pub enum ReadmeError {
    #[error("not a GitHub repository URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no README found (status {0})")]
    Missing(u16),
}

/// Finds repository links (`https://github.com/<owner>/<repo>`) in free text.
#[derive(Clone)]
pub struct GitHubLinkExtractor {
    pattern: Regex,
}

impl Default for GitHubLinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubLinkExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"(?i)\b(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9-]+)/([A-Za-z0-9_.-]+)(/[^\s)\]>,;]*)?",
            )
            .expect("GitHub link pattern is valid"),
        }
    }

    /// Canonical `https://github.com/<owner>/<repo>` links, deduplicated.
    /// Deep links into a repository (`/blob/...`, `/tree/...`) are skipped.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.pattern
            .captures_iter(text)
            .filter(|caps| {
                caps.get(3).map_or(true, |rest| {
                    rest.as_str().trim_end_matches(|c: char| c == '/' || c == '.').is_empty()
                })
            })
            .filter_map(|caps| {
                let owner = caps.get(1)?.as_str();
                let repo = caps
                    .get(2)?
                    .as_str()
                    .trim_end_matches('.')
                    .trim_end_matches(".git");
                if repo.is_empty() || RESERVED_OWNERS.contains(&owner.to_lowercase().as_str()) {
                    return None;
                }
                Some(format!("https://github.com/{owner}/{repo}"))
            })
            .collect()
    }
}

/// Splits a canonical repository link into (owner, repo).
pub fn repo_path(link: &str) -> Option<(&str, &str)> {
    let link = link.trim_end_matches('/');
    let path = link
        .strip_prefix("https://github.com/")
        .or_else(|| link.strip_prefix("http://github.com/"))?;
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// Fetches the README on the repository's default branch. One request, no retries.
pub async fn fetch_readme(client: &Client, link: &str) -> Result<String, ReadmeError> {
    let (owner, repo) = repo_path(link).ok_or_else(|| ReadmeError::InvalidUrl(link.to_string()))?;
    let url = format!("{RAW_CONTENT_BASE}/{owner}/{repo}/HEAD/README.md");
    debug!("Fetching README from {url}");

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ReadmeError::Missing(status.as_u16()));
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = r#"
        Jane Doe — Systems Engineer
        Projects: https://github.com/janedoe/raft-kv (Rust, Raft consensus),
        github.com/janedoe/tiny-db.git and https://www.github.com/janedoe/raft-kv/.
        Snippet: https://github.com/janedoe/raft-kv/blob/main/src/lib.rs
        Profile: https://github.com/janedoe
        Org page: https://github.com/orgs/acme
    "#;

    #[test]
    fn test_extracts_and_canonicalizes_repository_links() {
        let links = GitHubLinkExtractor::new().extract(RESUME);
        let expected: BTreeSet<String> = [
            "https://github.com/janedoe/raft-kv".to_string(),
            "https://github.com/janedoe/tiny-db".to_string(),
        ]
        .into();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_no_links_is_empty_set() {
        assert!(GitHubLinkExtractor::new()
            .extract("No public code, see portfolio at example.com")
            .is_empty());
    }

    #[test]
    fn test_trailing_sentence_period_is_trimmed() {
        let links = GitHubLinkExtractor::new().extract("See https://github.com/a/b.");
        assert!(links.contains("https://github.com/a/b"));
    }

    #[test]
    fn test_repo_path() {
        assert_eq!(repo_path("https://github.com/a/b"), Some(("a", "b")));
        assert_eq!(repo_path("https://github.com/a/b/"), Some(("a", "b")));
        assert_eq!(repo_path("https://github.com/a"), None);
        assert_eq!(repo_path("https://gitlab.com/a/b"), None);
    }
}
