use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout. Unset means upstream calls may block indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_user_agent() -> String {
    "tea-indexer".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexerConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_repos")]
    pub repos: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            repos: default_repos(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_repos() -> Vec<String> {
    [
        "justworkshr/clockwork_web",
        "justworkshr/clockface",
        "justworkshr/ieor-payroll-tuning-dashboard",
        "justworkshr/benefits-ops-dash",
        "justworkshr/benefits-ops-api",
        "justworkshr/cs-dash",
        "justworkshr/crimsonsage-product",
        "justworkshr/cdms",
        "justworkshr/paytax-internal",
        "justworkshr/ai-hive-2",
        "justworkshr/tangerine-hive-streamlit",
        "justworkshr/memco",
        "justworkshr/clockwork_mobile",
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

impl GitHubConfig {
    /// Reads the API token from the configured environment variable.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    if !(1..=100).contains(&config.indexer.page_size) {
        bail!("indexer.page_size must be in [1, 100]");
    }

    for repo in &config.indexer.repos {
        if !is_repo_slug(repo) {
            bail!("indexer.repos entry '{}' must be of the form owner/name", repo);
        }
    }

    if config.github.timeout_secs == Some(0) {
        bail!("github.timeout_secs must be > 0 when set");
    }

    Ok(())
}

/// Returns true for `owner/name` with both halves non-empty.
pub fn is_repo_slug(repo: &str) -> bool {
    match repo.split_once('/') {
        Some((owner, name)) => !owner.is_empty() && !name.is_empty() && !name.contains('/'),
        None => false,
    }
}

/// Returns true for a repository name that is safe to splice into an API path.
///
/// Accepts `owner/name` or a bare `name`, built from ASCII alphanumerics and
/// `.`, `_`, `-`. Segments must be non-empty and never `.` or `..`.
pub fn is_repo_name(repo: &str) -> bool {
    let segments: Vec<&str> = repo.split('/').collect();
    if segments.len() > 2 {
        return false;
    }
    segments.iter().all(|seg| {
        !seg.is_empty()
            && *seg != "."
            && *seg != ".."
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    })
}
