//! Shared fixtures: a scripted in-memory upstream and temp-dir configs.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tea_indexer::config::Config;
use tea_indexer::error::UpstreamError;
use tea_indexer::models::PullSummary;
use tea_indexer::upstream::Upstream;
use tempfile::TempDir;

/// Upstream that serves scripted pages and records every listing call.
#[derive(Default)]
pub struct FakeUpstream {
    pages: HashMap<String, Vec<Vec<PullSummary>>>,
    failing_pages: HashSet<(String, u32)>,
    failing_diffs: HashSet<String>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages for `repo`, in order starting at page 1. Later pages are empty.
    pub fn with_pages(mut self, repo: &str, pages: Vec<Vec<PullSummary>>) -> Self {
        self.pages.insert(repo.to_string(), pages);
        self
    }

    pub fn failing_page(mut self, repo: &str, page: u32) -> Self {
        self.failing_pages.insert((repo.to_string(), page));
        self
    }

    pub fn failing_diff(mut self, diff_url: &str) -> Self {
        self.failing_diffs.insert(diff_url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, repo: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(r, _)| r == repo)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn list_closed_pulls(
        &self,
        repo: &str,
        page: u32,
        _page_size: u32,
    ) -> Result<Vec<PullSummary>, UpstreamError> {
        self.calls.lock().unwrap().push((repo.to_string(), page));

        if self.failing_pages.contains(&(repo.to_string(), page)) {
            return Err(UpstreamError::Http {
                url: format!("fake://{}/pulls?page={}", repo, page),
                status: 502,
                body: "bad gateway".to_string(),
            });
        }

        Ok(self
            .pages
            .get(repo)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_diff(&self, diff_url: &str) -> Result<String, UpstreamError> {
        if self.failing_diffs.contains(diff_url) {
            return Err(UpstreamError::Http {
                url: diff_url.to_string(),
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(format!("diff --git for {}", diff_url))
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn diff_url(repo: &str, number: i64) -> String {
    format!("https://github.com/{}/pull/{}.diff", repo, number)
}

/// A closed PR summary; `closed` is RFC 3339 or `None` for an unclosed entry.
pub fn pull(repo: &str, number: i64, closed: Option<&str>) -> PullSummary {
    PullSummary {
        number,
        title: format!("PR #{} in {}", number, repo),
        author_login: "octocat".to_string(),
        created_at: ts("2023-06-01T00:00:00Z"),
        closed_at: closed.map(ts),
        diff_url: diff_url(repo, number),
    }
}

pub fn test_config(tmp: &TempDir) -> Config {
    test_config_with(tmp, "127.0.0.1:0", &[])
}

pub fn test_config_with(tmp: &TempDir, bind: &str, repos: &[&str]) -> Config {
    let db_path = tmp.path().join("data").join("tea.sqlite");
    let repos = repos
        .iter()
        .map(|r| format!("\"{}\"", r))
        .collect::<Vec<_>>()
        .join(", ");
    let config_content = format!(
        r#"
[db]
path = "{}"

[server]
bind = "{}"

[github]
api_base = "http://127.0.0.1:9"

[indexer]
page_size = 100
repos = [{}]
"#,
        db_path.display(),
        bind,
        repos
    );
    toml::from_str(&config_content).unwrap()
}
